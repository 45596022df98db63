//! [`Query`] collection related to a single [`Booking`].

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{booking, Booking};

use super::DatabaseQuery;

/// Queries a not deleted [`Booking`] by its [`booking::Id`].
pub type ById = DatabaseQuery<By<Option<Booking>, booking::Id>>;
