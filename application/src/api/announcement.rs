//! [`Announcement`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{
        announcement::{self, Description, HousingType, Rooms, Title},
        user, Announcement,
    },
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Error, Service, Session};

/// Public view of an [`Announcement`].
#[derive(Clone, Debug, Serialize)]
pub struct AnnouncementView {
    /// ID of the [`Announcement`].
    pub id: announcement::Id,

    /// Title of the [`Announcement`].
    pub title: String,

    /// Description of the [`Announcement`].
    pub description: String,

    /// ID of the lessor owning the [`Announcement`].
    pub owner: user::Id,

    /// Price of the [`Announcement`].
    pub price: Money,

    /// Number of rooms.
    pub rooms: u16,

    /// Type of the offered housing.
    pub housing_type: HousingType,

    /// Indicator whether the [`Announcement`] accepts bookings.
    pub is_active: bool,

    /// [`DateTime`] when the [`Announcement`] was published.
    pub created_at: DateTime,
}

impl From<Announcement> for AnnouncementView {
    fn from(a: Announcement) -> Self {
        Self {
            id: a.id,
            title: a.title.to_string(),
            description: a.description.to_string(),
            owner: a.owner_id,
            price: a.price,
            rooms: a.rooms.into(),
            housing_type: a.housing_type,
            is_active: a.is_active,
            created_at: a.created_at.coerce(),
        }
    }
}

/// Query parameters of an [`Announcement`]s list request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    /// Number of [`Announcement`]s on a page.
    pub first: Option<u32>,

    /// Cursor to list [`Announcement`]s after.
    pub after: Option<announcement::Id>,

    /// Words to search for in titles and descriptions.
    pub search: Option<String>,

    /// Type of the housing to list.
    pub housing_type: Option<HousingType>,

    /// Minimal number of rooms.
    pub min_rooms: Option<u16>,

    /// Maximal number of rooms.
    pub max_rooms: Option<u16>,
}

impl ListParams {
    /// Builds a [`read::announcement::list::Selector`] out of these
    /// [`ListParams`].
    ///
    /// # Errors
    ///
    /// If any parameter is out of its range.
    pub fn into_selector(
        self,
    ) -> Result<read::announcement::list::Selector, Error> {
        let Self {
            first,
            after,
            search,
            housing_type,
            min_rooms,
            max_rooms,
        } = self;

        let rooms = |count: Option<u16>| {
            count
                .map(|c| Rooms::new(c).ok_or(AnnouncementError::InvalidRooms))
                .transpose()
        };
        Ok(read::announcement::list::Selector {
            arguments: api::arguments(first, after)?,
            filter: read::announcement::list::Filter {
                search: search.filter(|s| !s.trim().is_empty()),
                housing_type,
                min_rooms: rooms(min_rooms)?,
                max_rooms: rooms(max_rooms)?,
            },
        })
    }
}

/// Body of an [`Announcement`] publication request.
#[derive(Clone, Debug, Deserialize)]
pub struct NewAnnouncement {
    /// Title, up to 50 characters.
    pub title: String,

    /// Description.
    pub description: String,

    /// Price, like `"80.50EUR"`.
    pub price: Money,

    /// Number of rooms.
    pub rooms: u16,

    /// Type of the offered housing.
    pub housing_type: HousingType,
}

/// Body of an [`Announcement`] activity toggle request.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Activity {
    /// New activity flag.
    pub is_active: bool,
}

/// Lists active [`Announcement`]s, newest first.
#[tracing::instrument(skip_all)]
pub async fn list(
    Extension(service): Extension<Service>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<api::PageView<announcement::Id, AnnouncementView>>, Error> {
    let Query(params) = params.map_err(AsError::into_error)?;

    let page = service
        .execute(query::announcements::List::by(params.into_selector()?))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(page.into()))
}

/// Publishes a new [`Announcement`] of the current lessor.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TITLE`, `INVALID_DESCRIPTION`, `INVALID_ROOMS` - if any field
///   is malformed;
/// - `NON_POSITIVE_PRICE` - if the price is not positive;
/// - `NOT_LESSOR` - if the current user is not a lessor.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    body: Result<Json<NewAnnouncement>, JsonRejection>,
) -> Result<(http::StatusCode, Json<AnnouncementView>), Error> {
    let Json(NewAnnouncement {
        title,
        description,
        price,
        rooms,
        housing_type,
    }) = body.map_err(AsError::into_error)?;

    let announcement = service
        .execute(command::CreateAnnouncement {
            owner_id: session.user_id(),
            title: Title::new(title).ok_or(AnnouncementError::InvalidTitle)?,
            description: Description::new(description)
                .ok_or(AnnouncementError::InvalidDescription)?,
            price,
            rooms: Rooms::new(rooms).ok_or(AnnouncementError::InvalidRooms)?,
            housing_type,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(announcement.into())))
}

/// Returns the [`Announcement`] with the provided ID.
#[tracing::instrument(skip_all)]
pub async fn retrieve(
    Extension(service): Extension<Service>,
    id: Result<Path<announcement::Id>, PathRejection>,
) -> Result<Json<AnnouncementView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::announcement::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|a| Json(a.into()))
        .ok_or_else(|| AnnouncementError::NotExists.into())
}

/// Activates or deactivates the [`Announcement`] of the current lessor.
///
/// # Errors
///
/// Possible error codes:
/// - `ANNOUNCEMENT_NOT_EXISTS` - if there is no such [`Announcement`];
/// - `NOT_OWNER` - if the current user doesn't own the [`Announcement`].
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn update_activity(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<announcement::Id>, PathRejection>,
    body: Result<Json<Activity>, JsonRejection>,
) -> Result<Json<AnnouncementView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(Activity { is_active }) = body.map_err(AsError::into_error)?;

    let announcement = service
        .execute(command::UpdateAnnouncementActivity {
            announcement_id: id,
            initiator_id: session.user_id(),
            is_active,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(announcement.into()))
}

impl AsError for command::create_announcement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NonPositivePrice(_) => {
                Some(AnnouncementError::NonPositivePrice.into())
            }
            Self::UserNotLessor(_) => Some(AnnouncementError::NotLessor.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::update_announcement_activity::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AnnouncementNotExists(_) => {
                Some(AnnouncementError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NotOwner(_) => Some(AnnouncementError::NotOwner.into()),
        }
    }
}

define_error! {
    enum AnnouncementError {
        #[code = "ANNOUNCEMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Announcement does not exist"]
        NotExists,

        #[code = "INVALID_TITLE"]
        #[status = BAD_REQUEST]
        #[message = "Title must be non-empty and up to 50 characters long"]
        InvalidTitle,

        #[code = "INVALID_DESCRIPTION"]
        #[status = BAD_REQUEST]
        #[message = "Description must not be empty"]
        InvalidDescription,

        #[code = "INVALID_ROOMS"]
        #[status = BAD_REQUEST]
        #[message = "Number of rooms must be positive"]
        InvalidRooms,

        #[code = "NON_POSITIVE_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Price must be positive"]
        NonPositivePrice,

        #[code = "NOT_LESSOR"]
        #[status = FORBIDDEN]
        #[message = "Only lessors can publish announcements"]
        NotLessor,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "You do not have permission to perform this action"]
        NotOwner,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::announcement::HousingType;

    use super::{ListParams, NewAnnouncement};

    #[test]
    fn parses_new_announcement() {
        let a: NewAnnouncement = serde_json::from_str(
            r#"{
                "title": "Loft near the river",
                "description": "Bright and quiet.",
                "price": "120.00EUR",
                "rooms": 3,
                "housing_type": "Loft"
            }"#,
        )
        .unwrap();

        assert_eq!(a.housing_type, HousingType::Loft);
        assert_eq!(a.rooms, 3);
        assert!(a.price.is_positive());
    }

    #[test]
    fn builds_selector_with_defaults() {
        let selector = ListParams {
            search: Some("  ".into()),
            ..ListParams::default()
        }
        .into_selector()
        .unwrap();

        assert_eq!(selector.arguments.first, 20);
        assert!(selector.arguments.after.is_none());
        assert!(selector.filter.search.is_none());
    }

    #[test]
    fn rejects_out_of_range_params() {
        let err = ListParams {
            first: Some(101),
            ..ListParams::default()
        }
        .into_selector()
        .unwrap_err();
        assert_eq!(err.code, "INVALID_PAGINATION_ARGUMENTS");

        let err = ListParams {
            min_rooms: Some(0),
            ..ListParams::default()
        }
        .into_selector()
        .unwrap_err();
        assert_eq!(err.code, "INVALID_ROOMS");
    }
}
