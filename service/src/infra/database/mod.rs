//! [`Database`]-related implementations.

#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    /// Constraint violation reported by a [`Database`] enforcing constraints
    /// on its own.
    Violation(Violation),
}

impl Error {
    /// Checks whether this [`Error`] is caused by a violated uniqueness of the
    /// specified constraint (or any one, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
            Self::Violation(v) => v.is(ViolationKind::Unique, constraint),
        }
    }

    /// Checks whether this [`Error`] is caused by a violated exclusion
    /// constraint (or any one, if [`None`]).
    #[must_use]
    pub fn is_exclusion_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_exclusion_violation(constraint),
            Self::Violation(v) => v.is(ViolationKind::Exclusion, constraint),
        }
    }
}

/// Violated [`Database`] constraint.
#[derive(Clone, Debug, Display, Eq, PartialEq, StdError)]
#[display("`{name}` {kind} constraint is violated")]
pub struct Violation {
    /// Kind of the violated constraint.
    pub kind: ViolationKind,

    /// Name of the violated constraint.
    pub name: String,
}

impl Violation {
    /// Checks whether this [`Violation`] is of the provided `kind` and is
    /// raised by the specified constraint (or any one, if [`None`]).
    fn is(&self, kind: ViolationKind, constraint: Option<&str>) -> bool {
        self.kind == kind && constraint.map_or(true, |c| c == self.name)
    }
}

/// Kind of a [`Violation`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ViolationKind {
    /// Exclusion constraint.
    #[display("exclusion")]
    Exclusion,

    /// Uniqueness constraint.
    #[display("unique")]
    Unique,
}

#[cfg(test)]
mod spec {
    use super::{Error, Violation, ViolationKind};

    #[test]
    fn matches_violation_by_kind_and_name() {
        let err = Error::from(Violation {
            kind: ViolationKind::Exclusion,
            name: "reserved".to_owned(),
        });

        assert!(err.is_exclusion_violation(None));
        assert!(err.is_exclusion_violation(Some("reserved")));
        assert!(!err.is_exclusion_violation(Some("other")));
        assert!(!err.is_unique_violation(None));
    }
}
