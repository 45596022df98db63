//! [`Command`] for cancelling a [`Booking`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{announcement, booking, user, Announcement, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`Booking`] by its renter or by the lessor
/// owning the booked [`Announcement`].
#[derive(Clone, Copy, Debug)]
pub struct CancelBooking {
    /// ID of the [`Booking`] to cancel.
    pub booking_id: booking::Id,

    /// ID of the user performing the cancellation.
    pub initiator_id: user::Id,

    /// Requested cancellation flag.
    ///
    /// `false` leaves the [`Booking`] untouched.
    pub canceled: bool,
}

impl<Db> Command<CancelBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Announcement>, announcement::Id>>,
            Ok = Option<Announcement>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
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

    async fn execute(&self, cmd: CancelBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelBooking {
            booking_id,
            initiator_id,
            canceled,
        } = cmd;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if booking.renter_id != initiator_id {
            self.database()
                .execute(Select(By::<Option<Announcement>, _>::new(
                    booking.announcement_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|a| a.is_owned_by(initiator_id))
                .ok_or(E::BookingNotExists(booking_id))
                .map_err(tracerr::wrap!())
                .map(drop)?;
        }

        if !canceled {
            return Ok(booking);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Booking, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if !booking.cancel().is_changed() {
            return Ok(booking);
        }
        booking.updated_at = DateTime::now().coerce();

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(%booking_id, %initiator_id, "booking cancelled");

        Ok(booking)
    }
}

/// Error of [`CancelBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist or is not visible to
    /// the initiator.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
