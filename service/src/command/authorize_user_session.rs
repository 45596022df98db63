//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`Session`] token.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Decoded [`Session`].
    pub session: Session,

    /// [`User`] the [`Session`] belongs to.
    pub user: User,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = token
            .verify(&self.config.jwt_decoding_key)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok(Output { session, user })
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] is malformed, forged or expired.
    #[display("Invalid `Session` token: {_0}")]
    InvalidToken(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist anymore.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}
