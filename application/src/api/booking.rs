//! [`Booking`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use common::{Date, DateTime};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{
        announcement,
        booking::{self, Status, TransitionError, ValidationError},
        user, Booking,
    },
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Error, Service, Session};

/// View of a [`Booking`] visible to its parties.
#[derive(Clone, Debug, Serialize)]
pub struct BookingView {
    /// ID of the [`Booking`].
    pub id: booking::Id,

    /// ID of the renter.
    pub renter: user::Id,

    /// ID of the booked announcement.
    pub announcement: announcement::Id,

    /// First day of the [`Booking`].
    pub start_date: Date,

    /// Last day of the [`Booking`].
    pub end_date: Date,

    /// Current [`Status`] of the [`Booking`].
    pub status: Status,

    /// Indicator whether the lessor approved the [`Booking`].
    pub is_approved: bool,

    /// Indicator whether the [`Booking`] was cancelled.
    pub canceled: bool,

    /// [`DateTime`] when the [`Booking`] was made.
    pub created_at: DateTime,

    /// [`DateTime`] when the [`Booking`] was last modified.
    pub updated_at: DateTime,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            renter: b.renter_id,
            announcement: b.announcement_id,
            start_date: b.start_date,
            end_date: b.end_date,
            status: b.status,
            is_approved: b.is_approved,
            canceled: b.canceled,
            created_at: b.created_at.coerce(),
            updated_at: b.updated_at.coerce(),
        }
    }
}

/// Page of [`Booking`]s.
pub type BookingsPage = api::PageView<booking::Id, BookingView>;

/// Query parameters of a [`Booking`]s list request.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListParams {
    /// Number of [`Booking`]s on a page.
    pub first: Option<u32>,

    /// Cursor to list [`Booking`]s after.
    pub after: Option<booking::Id>,
}

/// Body of a [`Booking`] request.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NewBooking {
    /// ID of the announcement to book.
    pub announcement: announcement::Id,

    /// First day to book.
    pub start_date: Date,

    /// Last day to book.
    pub end_date: Date,
}

/// Body of a [`Booking`] modification request.
///
/// Omitted fields are kept as they are.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct BookingChanges {
    /// ID of another announcement to book.
    #[serde(default)]
    pub announcement: Option<announcement::Id>,

    /// New first day.
    #[serde(default)]
    pub start_date: Option<Date>,

    /// New last day.
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// Body of a [`Booking`] approval request.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Approval {
    /// Indicator whether to approve.
    pub is_approved: bool,
}

/// Body of a [`Booking`] cancellation request.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Cancellation {
    /// Indicator whether to cancel.
    pub canceled: bool,
}

/// Response of a [`history`] request.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum History {
    /// [`Booking`]s made by the current user.
    Bookings(BookingsPage),

    /// Notice of no [`Booking`]s made at all.
    Empty {
        /// Human-readable notice.
        message: &'static str,
    },
}

/// Lists [`Booking`]s visible to the current user, newest first.
///
/// Lessors see [`Booking`]s of their announcements, while renters see their
/// own ones.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn list(
    Extension(service): Extension<Service>,
    session: Session,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<BookingsPage>, Error> {
    let Query(ListParams { first, after }) =
        params.map_err(AsError::into_error)?;

    let filter = if session.user.is_lessor {
        read::booking::list::Filter::Lessor(session.user_id())
    } else {
        read::booking::list::Filter::Renter(session.user_id())
    };
    let page = service
        .execute(query::bookings::List::by(read::booking::list::Selector {
            arguments: api::arguments(first, after)?,
            filter,
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(page.into()))
}

/// Lists [`Booking`]s made by the current user, newest first.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn history(
    Extension(service): Extension<Service>,
    session: Session,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<History>, Error> {
    let Query(ListParams { first, after }) =
        params.map_err(AsError::into_error)?;
    let is_first_page = after.is_none();

    let page = service
        .execute(query::bookings::List::by(read::booking::list::Selector {
            arguments: api::arguments(first, after)?,
            filter: read::booking::list::Filter::Renter(session.user_id()),
        }))
        .await
        .map_err(AsError::into_error)?;

    let page = BookingsPage::from(page);
    Ok(Json(if is_first_page && page.results.is_empty() {
        History::Empty {
            message: "You have no reservations.",
        }
    } else {
        History::Bookings(page)
    }))
}

/// Books an announcement for the current user.
///
/// # Errors
///
/// Possible error codes:
/// - `ANNOUNCEMENT_NOT_EXISTS` - if there is no such announcement;
/// - `PAST_START_DATE`, `PAST_END_DATE`, `INVERTED_RANGE` - if the dates are
///   not acceptable;
/// - `INACTIVE_ANNOUNCEMENT` - if the announcement doesn't accept bookings;
/// - `DATE_CONFLICT` - if the dates are already reserved.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    body: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(http::StatusCode, Json<BookingView>), Error> {
    let Json(NewBooking {
        announcement,
        start_date,
        end_date,
    }) = body.map_err(AsError::into_error)?;

    let booking = service
        .execute(command::CreateBooking {
            renter_id: session.user_id(),
            announcement_id: announcement,
            start_date,
            end_date,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(booking.into())))
}

/// Returns the [`Booking`] of the current user with the provided ID.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn retrieve(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<booking::Id>, PathRejection>,
) -> Result<Json<BookingView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::booking::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .filter(|b| b.renter_id == session.user_id())
        .map(|b| Json(b.into()))
        .ok_or_else(|| BookingError::NotExists.into())
}

/// Modifies the [`Booking`] of the current user.
///
/// # Errors
///
/// Same as [`create`], plus `BOOKING_NOT_EXISTS`.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn update(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<booking::Id>, PathRejection>,
    body: Result<Json<BookingChanges>, JsonRejection>,
) -> Result<Json<BookingView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(BookingChanges {
        announcement,
        start_date,
        end_date,
    }) = body.map_err(AsError::into_error)?;

    let booking = service
        .execute(command::UpdateBooking {
            booking_id: id,
            initiator_id: session.user_id(),
            announcement_id: announcement,
            start_date,
            end_date,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(booking.into()))
}

/// Deletes the [`Booking`] of the current user.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn delete(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<booking::Id>, PathRejection>,
) -> Result<http::StatusCode, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    _ = service
        .execute(command::DeleteBooking {
            booking_id: id,
            initiator_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

/// Approves a [`Booking`] of the current lessor's announcement.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - if there is no such [`Booking`] for the lessor;
/// - `ALREADY_CANCELLED` - if the [`Booking`] was cancelled;
/// - `DATE_CONFLICT` - if the dates are reserved by another [`Booking`].
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn approve(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<booking::Id>, PathRejection>,
    body: Result<Json<Approval>, JsonRejection>,
) -> Result<Json<BookingView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(Approval { is_approved }) = body.map_err(AsError::into_error)?;

    let booking = service
        .execute(command::ApproveBooking {
            booking_id: id,
            initiator_id: session.user_id(),
            is_approved,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(booking.into()))
}

/// Cancels a [`Booking`] on behalf of its renter or lessor.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn cancel(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<booking::Id>, PathRejection>,
    body: Result<Json<Cancellation>, JsonRejection>,
) -> Result<Json<BookingView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(Cancellation { canceled }) = body.map_err(AsError::into_error)?;

    let booking = service
        .execute(command::CancelBooking {
            booking_id: id,
            initiator_id: session.user_id(),
            canceled,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(booking.into()))
}

impl AsError for ValidationError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::PastStartDate => "PAST_START_DATE",
            Self::PastEndDate => "PAST_END_DATE",
            Self::InactiveAnnouncement => "INACTIVE_ANNOUNCEMENT",
            Self::InvertedRange => "INVERTED_RANGE",
            Self::DateConflict => "DATE_CONFLICT",
            Self::Incomplete => "INCOMPLETE_PERIOD",
        };
        Some(Error {
            code,
            ..Error::bad_request(self)
        })
    }
}

impl AsError for TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::DateConflict => "DATE_CONFLICT",
        };
        Some(Error {
            code,
            ..Error::bad_request(self)
        })
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AnnouncementNotExists(_) => {
                Some(BookingError::AnnouncementNotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::update_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AnnouncementNotExists(_) => {
                Some(BookingError::AnnouncementNotExists.into())
            }
            Self::BookingNotExists(_) => Some(BookingError::NotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Invalid(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::approve_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(BookingError::NotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(BookingError::NotExists.into()),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(BookingError::NotExists.into()),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Booking does not exist"]
        NotExists,

        #[code = "ANNOUNCEMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Announcement does not exist"]
        AnnouncementNotExists,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::booking::{TransitionError, ValidationError};

    use crate::AsError as _;

    use super::{BookingChanges, BookingsPage, History, NewBooking};

    #[test]
    fn validation_errors_keep_their_messages() {
        let err = ValidationError::InvertedRange.into_error();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVERTED_RANGE");
        assert_eq!(err.message, "End date cannot be less than start date.");

        let err = TransitionError::AlreadyCancelled.into_error();
        assert_eq!(err.code, "ALREADY_CANCELLED");
        assert_eq!(err.message, "Cancelled booking cannot be approved.");
    }

    #[test]
    fn parses_booking_bodies() {
        let b: NewBooking = serde_json::from_str(
            r#"{
                "announcement": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "start_date": "2030-05-10",
                "end_date": "2030-05-15"
            }"#,
        )
        .unwrap();
        assert!(b.start_date < b.end_date);

        let changes: BookingChanges =
            serde_json::from_str(r#"{"end_date": "2030-05-20"}"#).unwrap();
        assert!(changes.announcement.is_none());
        assert!(changes.start_date.is_none());
        assert!(changes.end_date.is_some());
    }

    #[test]
    fn empty_history_is_a_notice() {
        let json = serde_json::to_value(History::Empty {
            message: "You have no reservations.",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({
            "message": "You have no reservations.",
        }));

        let json = serde_json::to_value(History::Bookings(BookingsPage {
            results: vec![],
            next_cursor: None,
            has_more: false,
        }))
        .unwrap();
        assert_eq!(json["has_more"], false);
    }
}
