//! [`Command`] definition.

pub mod approve_booking;
pub mod authorize_user_session;
pub mod cancel_booking;
pub mod create_announcement;
pub mod create_booking;
pub mod create_user;
pub mod create_user_session;
pub mod delete_booking;
pub mod update_announcement_activity;
pub mod update_booking;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    approve_booking::ApproveBooking,
    authorize_user_session::AuthorizeUserSession,
    cancel_booking::CancelBooking, create_announcement::CreateAnnouncement,
    create_booking::CreateBooking, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_booking::DeleteBooking,
    update_announcement_activity::UpdateAnnouncementActivity,
    update_booking::UpdateBooking,
};

/// Name of the storage constraint forbidding overlapping approved bookings of
/// the same announcement.
pub const RESERVATION_CONSTRAINT: &str = "bookings_reserved_period_excl";
