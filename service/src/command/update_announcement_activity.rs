//! [`Command`] for (de)activating an [`Announcement`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Booking;
use crate::{
    domain::{announcement, user, Announcement},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for toggling whether an [`Announcement`] accepts new
/// [`Booking`]s.
#[derive(Clone, Copy, Debug)]
pub struct UpdateAnnouncementActivity {
    /// ID of the [`Announcement`] to update.
    pub announcement_id: announcement::Id,

    /// ID of the user performing the update.
    pub initiator_id: user::Id,

    /// New activity of the [`Announcement`].
    pub is_active: bool,
}

impl<Db> Command<UpdateAnnouncementActivity> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Announcement, announcement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Announcement>, announcement::Id>>,
            Ok = Option<Announcement>,
            Err = Traced<database::Error>,
        > + Database<Update<Announcement>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Announcement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateAnnouncementActivity,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateAnnouncementActivity {
            announcement_id,
            initiator_id,
            is_active,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut announcement = tx
            .execute(Select(By::<Option<Announcement>, _>::new(announcement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AnnouncementNotExists(announcement_id))
            .map_err(tracerr::wrap!())?;
        if !announcement.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        if announcement.is_active == is_active {
            return Ok(announcement);
        }
        announcement.is_active = is_active;
        announcement.updated_at = DateTime::now().coerce();

        tx.execute(Update(announcement.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(announcement)
    }
}

/// Error of [`UpdateAnnouncementActivity`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Announcement`] with the provided ID does not exist.
    #[display("`Announcement(id: {_0})` does not exist")]
    AnnouncementNotExists(#[error(not(source))] announcement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// User doesn't own the [`Announcement`].
    #[display("`User(id: {_0})` doesn't own the `Announcement`")]
    NotOwner(#[error(not(source))] user::Id),
}
