//! [`Command`] for booking an [`Announcement`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        announcement,
        booking::{Candidate, ValidationError, Validator},
        user, Announcement, Booking, User,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for booking an [`Announcement`] for a range of days.
#[derive(Clone, Copy, Debug)]
pub struct CreateBooking {
    /// ID of the renter [`User`] making the [`Booking`].
    pub renter_id: user::Id,

    /// ID of the [`Announcement`] to book.
    pub announcement_id: announcement::Id,

    /// First day of the [`Booking`].
    pub start_date: Date,

    /// Last day of the [`Booking`].
    pub end_date: Date,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Announcement>, announcement::Id>>,
            Ok = Option<Announcement>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Booking>, read::booking::Conflicts>>,
            Ok = Vec<Booking>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            renter_id,
            announcement_id,
            start_date,
            end_date,
        } = cmd;

        drop(
            self.database()
                .execute(Select(By::<Option<User>, _>::new(renter_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(renter_id))
                .map_err(tracerr::wrap!())?,
        );

        let announcement = self
            .database()
            .execute(Select(By::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AnnouncementNotExists(announcement_id))
            .map_err(tracerr::wrap!())?;

        let candidate = Candidate {
            start_date: Some(start_date),
            end_date: Some(end_date),
        };
        let reserved = if let Some(period) = candidate.period(None) {
            self.database()
                .execute(Select(By::new(read::booking::Conflicts {
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
            existing: None,
            reserved: &reserved,
        }
        .validate(candidate)
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let booking = Booking::new(renter_id, validated);

        // A `Pending` booking reserves no dates, so nothing is locked here.
        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            booking_id = %booking.id,
            %announcement_id,
            %renter_id,
            "booking requested",
        );

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Announcement`] with the provided ID does not exist.
    #[display("`Announcement(id: {_0})` does not exist")]
    #[from(ignore)]
    AnnouncementNotExists(#[error(not(source))] announcement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested [`Booking`] is not acceptable.
    #[display("Invalid `Booking`: {_0}")]
    Invalid(ValidationError),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}
