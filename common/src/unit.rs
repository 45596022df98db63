//! Marker types describing lifecycle events of an entity.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a modification of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing an entity (soft) deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Marker type describing an expiration of something.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
