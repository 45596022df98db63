//! [`Booking`] definitions.

pub mod status;
pub mod validation;

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{announcement, user};
#[cfg(doc)]
use crate::domain::{Announcement, User};

pub use self::{
    status::{Status, Transition, TransitionError},
    validation::{Candidate, Validated, ValidationError, Validator},
};

/// Reservation of an [`Announcement`] by a renter [`User`] for a [`Period`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`User`] renting the [`Announcement`].
    pub renter_id: user::Id,

    /// ID of the booked [`Announcement`].
    pub announcement_id: announcement::Id,

    /// First day of this [`Booking`].
    pub start_date: Date,

    /// Last day of this [`Booking`].
    pub end_date: Date,

    /// Current [`Status`] of this [`Booking`].
    pub status: Status,

    /// Indicator whether the lessor approved this [`Booking`].
    pub is_approved: bool,

    /// Indicator whether this [`Booking`] was cancelled by any party.
    pub canceled: bool,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Booking`] was last modified.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Booking`] was (softly) deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Booking {
    /// Creates a new [`Status::Pending`] [`Booking`] out of the provided
    /// [`Validated`] request.
    #[must_use]
    pub fn new(renter_id: user::Id, validated: Validated) -> Self {
        let Validated {
            announcement_id,
            start_date,
            end_date,
        } = validated;
        let now = common::DateTime::now();
        Self {
            id: Id::new(),
            renter_id,
            announcement_id,
            start_date,
            end_date,
            status: Status::Pending,
            is_approved: false,
            canceled: false,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        }
    }

    /// Returns the [`Period`] this [`Booking`] spans.
    #[must_use]
    pub fn period(&self) -> Period {
        Period {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Indicates whether this [`Booking`] holds its [`Period`] of the
    /// [`Announcement`], so no other [`Booking`] may overlap it.
    #[must_use]
    pub fn is_reserving(&self) -> bool {
        self.is_approved && !self.canceled && self.deleted_at.is_none()
    }

    /// Indicates whether this [`Booking`] was (softly) deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the first reserving [`Booking`] out of the provided ones, which
    /// conflicts with the given [`Period`] of the same [`Announcement`].
    ///
    /// The [`Booking`] with the `except` ID is never considered conflicting.
    pub fn find_conflict<'b>(
        reserved: &'b [Booking],
        announcement_id: announcement::Id,
        period: Period,
        except: Option<Id>,
    ) -> Option<&'b Booking> {
        reserved.iter().find(|b| {
            b.announcement_id == announcement_id
                && Some(b.id) != except
                && b.is_reserving()
                && b.period().overlaps(period)
        })
    }
}

/// ID of a [`Booking`].
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

/// Inclusive range of calendar days.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// First day of this [`Period`].
    pub start: Date,

    /// Last day of this [`Period`].
    pub end: Date,
}

impl Period {
    /// Checks whether this [`Period`] shares at least one day with the
    /// `other` one.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// [`DateTime`] when a [`Booking`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Booking, unit::Modification)>;

/// [`DateTime`] when a [`Booking`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Booking, unit::Deletion)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{Date, DateTime};

    use crate::domain::{announcement, user};

    use super::{Booking, Id, Period, Status};

    pub(crate) fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    pub(crate) fn booking(
        announcement_id: announcement::Id,
        start: &str,
        end: &str,
    ) -> Booking {
        Booking {
            id: Id::new(),
            renter_id: user::Id::new(),
            announcement_id,
            start_date: date(start),
            end_date: date(end),
            status: Status::Pending,
            is_approved: false,
            canceled: false,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    pub(crate) fn approved(
        announcement_id: announcement::Id,
        start: &str,
        end: &str,
    ) -> Booking {
        Booking {
            status: Status::Approved,
            is_approved: true,
            ..booking(announcement_id, start, end)
        }
    }

    fn period(start: &str, end: &str) -> Period {
        Period {
            start: date(start),
            end: date(end),
        }
    }

    #[test]
    fn periods_overlap_inclusively() {
        let a = period("2025-06-01", "2025-06-10");

        assert!(a.overlaps(period("2025-06-05", "2025-06-15")));
        assert!(a.overlaps(period("2025-06-10", "2025-06-12")));
        assert!(a.overlaps(period("2025-05-20", "2025-06-01")));
        assert!(a.overlaps(period("2025-06-03", "2025-06-04")));
        assert!(!a.overlaps(period("2025-06-11", "2025-06-20")));
        assert!(!a.overlaps(period("2025-05-01", "2025-05-31")));
    }

    #[test]
    fn only_approved_active_bookings_reserve() {
        let ann = announcement::Id::new();

        assert!(!booking(ann, "2025-06-01", "2025-06-10").is_reserving());
        assert!(approved(ann, "2025-06-01", "2025-06-10").is_reserving());

        let mut deleted = approved(ann, "2025-06-01", "2025-06-10");
        deleted.deleted_at = Some(DateTime::now().coerce());
        assert!(!deleted.is_reserving());
    }

    #[test]
    fn conflicts_ignore_other_announcements_and_excepted_booking() {
        let ann = announcement::Id::new();
        let own = approved(ann, "2025-06-01", "2025-06-10");
        let other = approved(announcement::Id::new(), "2025-06-01", "2025-06-10");
        let reserved = [own.clone(), other];

        let wanted = period("2025-06-05", "2025-06-07");
        assert!(Booking::find_conflict(&reserved, ann, wanted, Some(own.id))
            .is_none());
        assert_eq!(
            Booking::find_conflict(&reserved, ann, wanted, None).map(|b| b.id),
            Some(own.id),
        );
    }
}
