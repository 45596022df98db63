//! [`Query`] collection related to a single [`Announcement`].

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{announcement, Announcement};

use super::DatabaseQuery;

/// Queries an [`Announcement`] by its [`announcement::Id`].
pub type ById = DatabaseQuery<By<Option<Announcement>, announcement::Id>>;
