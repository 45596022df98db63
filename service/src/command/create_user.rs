//! [`Command`] for registering a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Password;
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Debug)]
pub struct CreateUser {
    /// [`user::Username`] of a new [`User`].
    pub username: user::Username,

    /// First name of a new [`User`].
    pub name: user::Name,

    /// Last name of a new [`User`].
    pub surname: user::Name,

    /// [`user::Email`] of a new [`User`].
    pub email: user::Email,

    /// [`user::Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// Indicator whether a new [`User`] is a lessor.
    pub is_lessor: bool,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// Repeated [`Password`], which must match the `password`.
    pub password_confirmation: SecretBox<user::Password>,
}

impl CreateUser {
    /// Name of the unique constraint over [`User`] emails.
    const EMAIL_CONSTRAINT: &'static str = "users_email_key";

    /// Name of the unique constraint over [`User`] usernames.
    const USERNAME_CONSTRAINT: &'static str = "users_username_key";
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            username,
            name,
            surname,
            email,
            phone,
            is_lessor,
            password,
            password_confirmation,
        } = cmd;

        if password.expose_secret() != password_confirmation.expose_secret() {
            return Err(tracerr::new!(E::PasswordsMismatch));
        }

        let occupied = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let occupied = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            username,
            name,
            surname,
            email,
            phone,
            is_lessor,
            password_hash,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                // Concurrent registration with the same credentials.
                let err = e.as_ref();
                if err.is_unique_violation(Some(CreateUser::EMAIL_CONSTRAINT)) {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else if err
                    .is_unique_violation(Some(CreateUser::USERNAME_CONSTRAINT))
                {
                    tracerr::new!(E::UsernameOccupied(user.username.clone()))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(user_id = %user.id, is_lessor, "registered new user");

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already registered.
    #[display("`{_0}` email is already registered")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`Password`] cannot be hashed.
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHashing(argon2::password_hash::Error),

    /// [`Password`] and its confirmation differ.
    #[display("Passwords must match")]
    PasswordsMismatch,

    /// [`user::Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    UsernameOccupied(#[error(not(source))] user::Username),
}
