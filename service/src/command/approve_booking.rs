//! [`Command`] for approving a [`Booking`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        announcement,
        booking::{self, TransitionError},
        user, Announcement, Booking,
    },
    infra::{database, Database},
    read, Service,
};

use super::{Command, RESERVATION_CONSTRAINT};

/// [`Command`] for approving a [`Booking`] by the lessor owning the booked
/// [`Announcement`].
#[derive(Clone, Copy, Debug)]
pub struct ApproveBooking {
    /// ID of the [`Booking`] to approve.
    pub booking_id: booking::Id,

    /// ID of the user performing the approval.
    pub initiator_id: user::Id,

    /// Requested approval flag.
    ///
    /// `false` leaves the [`Booking`] untouched.
    pub is_approved: bool,
}

impl<Db> Command<ApproveBooking> for Service<Db>
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
            Lock<By<Announcement, announcement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Booking>, read::booking::Conflicts>>,
            Ok = Vec<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApproveBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApproveBooking {
            booking_id,
            initiator_id,
            is_approved,
        } = cmd;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        // Only the owner of the booked `Announcement` sees the `Booking`.
        let announcement_id = booking.announcement_id;
        self.database()
            .execute(Select(By::<Option<Announcement>, _>::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|a| a.is_owned_by(initiator_id))
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if !is_approved {
            return Ok(booking);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes reservations of the same `Announcement`.
        tx.execute(Lock(By::<Announcement, _>::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Booking, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|b| b.announcement_id == announcement_id)
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        let reserved = tx
            .execute(Select(By::new(read::booking::Conflicts {
                announcement_id,
                period: booking.period(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if !booking
            .approve(&reserved)
            .map_err(tracerr::from_and_wrap!(=> E))?
            .is_changed()
        {
            return Ok(booking);
        }
        booking.updated_at = DateTime::now().coerce();

        tx.execute(Update(booking.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_exclusion_violation(Some(RESERVATION_CONSTRAINT))
                {
                    tracerr::new!(E::Transition(TransitionError::DateConflict))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(%booking_id, %announcement_id, "booking approved");

        Ok(booking)
    }
}

/// Error of [`ApproveBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist or its [`Announcement`]
    /// belongs to another lessor.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Booking`] cannot be approved.
    #[display("Cannot approve `Booking`: {_0}")]
    Transition(TransitionError),
}
