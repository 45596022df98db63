//! [`Announcement`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Rental offer published by a lessor [`User`].
#[derive(Clone, Debug)]
pub struct Announcement {
    /// ID of this [`Announcement`].
    pub id: Id,

    /// [`Title`] of this [`Announcement`].
    pub title: Title,

    /// [`Description`] of this [`Announcement`].
    pub description: Description,

    /// ID of the lessor [`User`] owning this [`Announcement`].
    pub owner_id: user::Id,

    /// Price of this [`Announcement`].
    pub price: Money,

    /// Number of [`Rooms`] in the offered housing.
    pub rooms: Rooms,

    /// [`HousingType`] of the offered housing.
    pub housing_type: HousingType,

    /// Indicator whether this [`Announcement`] accepts bookings.
    pub is_active: bool,

    /// [`DateTime`] when this [`Announcement`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Announcement`] was last modified.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Announcement`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Announcement {
    /// Indicates whether the provided [`User`] owns this [`Announcement`].
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.owner_id == user_id
    }
}

/// ID of an [`Announcement`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of an [`Announcement`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Maximum length of a [`Title`] in characters.
    pub const MAX_LEN: usize = 50;

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title
            && !title.is_empty()
            && title.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Free-form description of an [`Announcement`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is not blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

/// Number of rooms in an [`Announcement`]ed housing.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Rooms(u16);

impl Rooms {
    /// Creates new [`Rooms`] if the given `count` is positive.
    #[must_use]
    pub fn new(count: u16) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Rooms {
    postgres_types::accepts!(INT4);

    fn from_sql(
        ty: &postgres_types::Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let count = i32::from_sql(ty, raw)?;
        u16::try_from(count)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("invalid `Rooms` count: {count}").into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Rooms {
    postgres_types::accepts!(INT4);
    postgres_types::to_sql_checked!();

    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<postgres_types::IsNull, Box<dyn std::error::Error + Sync + Send>>
    {
        i32::from(self.0).to_sql(ty, w)
    }
}

define_kind! {
    #[doc = "Type of housing offered by an [`Announcement`]."]
    enum HousingType {
        #[doc = "Apartment."]
        Apartment = "Apartment",

        #[doc = "Detached house."]
        House = "House",

        #[doc = "Single room."]
        Room = "Room",

        #[doc = "Studio."]
        Studio = "Studio",

        #[doc = "Loft."]
        Loft = "Loft",

        #[doc = "Duplex."]
        Duplex = "Duplex",

        #[doc = "Townhouse."]
        Townhouse = "Townhouse",

        #[doc = "Condominium."]
        Condo = "Condo",

        #[doc = "Cottage."]
        Cottage = "Cottage",

        #[doc = "Villa."]
        Villa = "Villa",

        #[doc = "Penthouse."]
        Penthouse = "Penthouse",

        #[doc = "Hotel room."]
        Hotel = "Hotel",

        #[doc = "Hostel bed."]
        Hostel = "Hostel",
    }
}

/// [`DateTime`] when an [`Announcement`] was created.
pub type CreationDateTime = DateTimeOf<(Announcement, unit::Creation)>;

/// [`DateTime`] when an [`Announcement`] was last modified.
pub type ModificationDateTime =
    DateTimeOf<(Announcement, unit::Modification)>;

/// [`DateTime`] when an [`Announcement`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Announcement, unit::Deletion)>;
