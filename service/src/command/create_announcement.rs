//! [`Command`] for publishing a new [`Announcement`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{announcement, user, Announcement, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for publishing a new [`Announcement`] by a lessor [`User`].
#[derive(Clone, Debug)]
pub struct CreateAnnouncement {
    /// ID of the [`User`] publishing the [`Announcement`].
    pub owner_id: user::Id,

    /// [`announcement::Title`] of a new [`Announcement`].
    pub title: announcement::Title,

    /// [`announcement::Description`] of a new [`Announcement`].
    pub description: announcement::Description,

    /// Price of a new [`Announcement`].
    pub price: Money,

    /// [`announcement::Rooms`] of a new [`Announcement`].
    pub rooms: announcement::Rooms,

    /// [`announcement::HousingType`] of a new [`Announcement`].
    pub housing_type: announcement::HousingType,
}

impl<Db> Command<CreateAnnouncement> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Announcement>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Announcement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateAnnouncement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateAnnouncement {
            owner_id,
            title,
            description,
            price,
            rooms,
            housing_type,
        } = cmd;

        if !price.is_positive() {
            return Err(tracerr::new!(E::NonPositivePrice(price)));
        }

        let owner = self
            .database()
            .execute(Select(By::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(owner_id))
            .map_err(tracerr::wrap!())?;
        if !owner.is_lessor {
            return Err(tracerr::new!(E::UserNotLessor(owner_id)));
        }

        let now = DateTime::now();
        let announcement = Announcement {
            id: announcement::Id::new(),
            title,
            description,
            owner_id,
            price,
            rooms,
            housing_type,
            is_active: true,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(announcement.clone()))
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

/// Error of [`CreateAnnouncement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price is zero or negative.
    #[display("Price must be positive, got `{_0}`")]
    NonPositivePrice(#[error(not(source))] Money),

    /// [`User`] is not a lessor.
    #[display("`User(id: {_0})` is not a lessor")]
    UserNotLessor(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
