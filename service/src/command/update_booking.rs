//! [`Command`] for changing dates of a [`Booking`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        announcement,
        booking::{self, Candidate, ValidationError, Validator},
        user, Announcement, Booking,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for changing dates (or the booked [`Announcement`]) of a
/// [`Booking`] by its renter.
///
/// Omitted fields keep their current values.
#[derive(Clone, Copy, Debug)]
pub struct UpdateBooking {
    /// ID of the [`Booking`] to update.
    pub booking_id: booking::Id,

    /// ID of the user performing the update.
    pub initiator_id: user::Id,

    /// ID of the [`Announcement`] to move the [`Booking`] to.
    pub announcement_id: Option<announcement::Id>,

    /// New first day of the [`Booking`].
    pub start_date: Option<Date>,

    /// New last day of the [`Booking`].
    pub end_date: Option<Date>,
}

impl<Db> Command<UpdateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Announcement, announcement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Announcement>, announcement::Id>>,
            Ok = Option<Announcement>,
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

    async fn execute(&self, cmd: UpdateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateBooking {
            booking_id,
            initiator_id,
            announcement_id,
            start_date,
            end_date,
        } = cmd;

        let current = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|b| b.renter_id == initiator_id)
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?
            .announcement_id;
        let announcement_id = announcement_id.unwrap_or(current);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Lock order: announcements by ID, then the booking.
        let mut locked = vec![current, announcement_id];
        locked.sort_unstable();
        locked.dedup();
        for id in locked {
            tx.execute(Lock(By::<Announcement, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Lock(By::<Booking, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|b| {
                b.renter_id == initiator_id && b.announcement_id == current
            })
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        let announcement = tx
            .execute(Select(By::<Option<Announcement>, _>::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AnnouncementNotExists(announcement_id))
            .map_err(tracerr::wrap!())?;

        let candidate = Candidate {
            start_date,
            end_date,
        };
        let reserved = if let Some(period) = candidate.period(Some(&booking)) {
            tx.execute(Select(By::new(read::booking::Conflicts {
                announcement_id,
                period,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        } else {
            vec![]
        };

        let validated = Validator {
            today: Date::today(),
            announcement: &announcement,
            existing: Some(&booking),
            reserved: &reserved,
        }
        .validate(candidate)
        .map_err(tracerr::from_and_wrap!(=> E))?;

        if !booking.reschedule(validated).is_changed() {
            return Ok(booking);
        }
        booking.updated_at = DateTime::now().coerce();

        // Rescheduled bookings are `Pending`, so no reservation is written.
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

/// Error of [`UpdateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Announcement`] with the provided ID does not exist.
    #[display("`Announcement(id: {_0})` does not exist")]
    #[from(ignore)]
    AnnouncementNotExists(#[error(not(source))] announcement::Id),

    /// [`Booking`] with the provided ID does not exist or belongs to another
    /// renter.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested [`Booking`] dates are not acceptable.
    #[display("Invalid `Booking`: {_0}")]
    Invalid(ValidationError),
}
