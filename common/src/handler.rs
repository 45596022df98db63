//! [`Handler`] abstractions.
//!
//! Commands, queries and database operations are all expressed as a
//! [`Handler`] implemented for the type executing them, parametrized by the
//! type of the executed operation.

use std::future::Future;

/// Executable handler of `Args` operation.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes the provided `Args` operation with this [`Handler`].
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
