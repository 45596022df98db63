//! [`Session`] extraction definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, Command as _},
    domain::{
        user::{self, session},
        User,
    },
};

use crate::{define_error, AsError, Error, Service};

/// Authenticated session of the [`User`] performing the current HTTP request.
#[derive(Clone, Debug)]
pub struct Session {
    /// [`User`] this [`Session`] belongs to.
    pub user: User,

    /// Authentication token.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl Session {
    /// Returns ID of the [`User`] this [`Session`] belongs to.
    #[must_use]
    pub fn user_id(&self) -> user::Id {
        self.user.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        let token = session::Token::from(bearer.token().to_owned());
        let command::authorize_user_session::Output { session, user } = service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map_err(AsError::into_error)?;

        Ok(Self {
            user,
            token,
            expires_at: session.expires_at,
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidToken(_) | Self::UserNotExists(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization token is invalid or expired"]
        InvalidToken,
    }
}
