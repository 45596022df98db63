//! [`Query`] collection related to the multiple [`Booking`]s.
//!
//! [`Booking`]: crate::domain::Booking

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a page of not deleted [`Booking`]s, newest first.
///
/// [`Booking`]: crate::domain::Booking
pub type List =
    DatabaseQuery<By<read::booking::list::Page, read::booking::list::Selector>>;
