//! [`Query`] collection related to the multiple [`Announcement`]s.
//!
//! [`Announcement`]: crate::domain::Announcement

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a page of active [`Announcement`]s, newest first.
///
/// [`Announcement`]: crate::domain::Announcement
pub type List = DatabaseQuery<
    By<read::announcement::list::Page, read::announcement::list::Selector>,
>;
