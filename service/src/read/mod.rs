//! Read entities definitions.

pub mod announcement;
pub mod booking;
