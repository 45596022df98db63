//! Domain definitions.

pub mod announcement;
pub mod booking;
pub mod user;

pub use self::{announcement::Announcement, booking::Booking, user::User};
