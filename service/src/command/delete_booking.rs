//! [`Command`] for deleting a [`Booking`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, user, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for softly deleting a [`Booking`] by its renter.
///
/// The deleted [`Booking`] is kept in the storage, but is neither visible nor
/// holding its dates anymore.
#[derive(Clone, Copy, Debug)]
pub struct DeleteBooking {
    /// ID of the [`Booking`] to delete.
    pub booking_id: booking::Id,

    /// ID of the user performing the deletion.
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteBooking {
            booking_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|b| b.renter_id == initiator_id)
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        booking.deleted_at = Some(now.coerce());
        booking.updated_at = now.coerce();

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`DeleteBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist or belongs to another
    /// renter.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
