//! [`User`]-related endpoints.

use axum::{extract::rejection::JsonRejection, Extension, Json};
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{user, User},
};

use crate::{define_error, AsError, Error, Service, Session};

/// Public view of a [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    /// ID of the [`User`].
    pub id: user::Id,

    /// Unique username of the [`User`].
    pub username: user::Username,

    /// First name of the [`User`].
    pub name: user::Name,

    /// Last name of the [`User`].
    pub surname: user::Name,

    /// Email of the [`User`].
    pub email: user::Email,

    /// Phone number of the [`User`].
    pub phone: Option<user::Phone>,

    /// Indicator whether the [`User`] is a lessor.
    pub is_lessor: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            surname: user.surname,
            email: user.email,
            phone: user.phone,
            is_lessor: user.is_lessor,
        }
    }
}

/// Issued session of a [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    /// Access token to be sent as `Authorization: Bearer <token>`.
    pub token: String,

    /// [`DateTime`] when the `token` expires.
    pub expires_at: DateTime,

    /// [`User`] the session belongs to.
    pub user: UserView,
}

impl From<command::create_user_session::Output> for SessionView {
    fn from(output: command::create_user_session::Output) -> Self {
        Self {
            token: output.token.to_string(),
            expires_at: output.expires_at.coerce(),
            user: output.user.into(),
        }
    }
}

/// Body of a registration request.
#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
    /// Desired username.
    pub username: String,

    /// First name.
    pub name: String,

    /// Last name.
    pub surname: String,

    /// Email, used as a login.
    pub email: String,

    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,

    /// Indicator whether a lessor account is registered.
    #[serde(default)]
    pub is_lessor: bool,

    /// Password.
    pub password: String,

    /// Password confirmation.
    pub re_password: String,
}

impl Registration {
    /// Validates this [`Registration`] into a [`command::CreateUser`].
    ///
    /// # Errors
    ///
    /// With a [`UserError`] if any field is malformed.
    pub fn into_command(self) -> Result<command::CreateUser, UserError> {
        let Self {
            username,
            name,
            surname,
            email,
            phone,
            is_lessor,
            password,
            re_password,
        } = self;

        Ok(command::CreateUser {
            username: user::Username::new(username)
                .ok_or(UserError::InvalidUsername)?,
            name: user::Name::new(name).ok_or(UserError::InvalidName)?,
            surname: user::Name::new(surname)
                .ok_or(UserError::InvalidSurname)?,
            email: user::Email::new(email).ok_or(UserError::InvalidEmail)?,
            phone: phone
                .map(|p| user::Phone::new(p).ok_or(UserError::InvalidPhone))
                .transpose()?,
            is_lessor,
            password: secret_password(password)?,
            password_confirmation: secret_password(re_password)?,
        })
    }
}

/// Body of a login request.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    /// Email of the [`User`].
    pub email: String,

    /// Password of the [`User`].
    pub password: String,
}

/// Registers a new [`User`] and opens a session for them.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_*` - if any field is malformed;
/// - `PASSWORDS_MISMATCH` - if the password confirmation differs;
/// - `EMAIL_OCCUPIED`, `USERNAME_OCCUPIED` - if already registered.
#[tracing::instrument(skip_all)]
pub async fn register(
    Extension(service): Extension<Service>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(http::StatusCode, Json<SessionView>), Error> {
    let Json(registration) = body.map_err(AsError::into_error)?;
    let cmd = registration.into_command().map_err(Error::from)?;

    let user = service
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    let output = service
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(output.into())))
}

/// Opens a new session by the provided [`Credentials`].
///
/// # Errors
///
/// Possible error codes:
/// - `WRONG_CREDENTIALS` - if the credentials don't match any [`User`].
#[tracing::instrument(skip_all)]
pub async fn login(
    Extension(service): Extension<Service>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionView>, Error> {
    let Json(Credentials { email, password }) =
        body.map_err(AsError::into_error)?;

    // Malformed credentials never match anything.
    let email = user::Email::new(email).ok_or(UserError::WrongCredentials)?;
    let password =
        secret_password(password).map_err(|_| UserError::WrongCredentials)?;

    let output = service
        .execute(command::CreateUserSession::ByCredentials { email, password })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(output.into()))
}

/// Returns the [`User`] of the current [`Session`].
#[tracing::instrument(skip_all, fields(user.id = %session.user_id()))]
pub async fn detail(session: Session) -> Json<UserView> {
    Json(session.user.into())
}

/// Wraps the provided raw `password` into a secret [`user::Password`].
fn secret_password(
    password: String,
) -> Result<secrecy::SecretBox<user::Password>, UserError> {
    let password =
        user::Password::new(password).ok_or(UserError::InvalidPassword)?;
    Ok(secrecy::SecretBox::init_with(move || password))
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
            Self::PasswordHashing(_) => None,
            Self::PasswordsMismatch => {
                Some(UserError::PasswordsMismatch.into())
            }
            Self::UsernameOccupied(_) => {
                Some(UserError::UsernameOccupied.into())
            }
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WrongCredentials => Some(UserError::WrongCredentials.into()),
            Self::Signing(_) | Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum UserError {
        #[code = "INVALID_USERNAME"]
        #[status = BAD_REQUEST]
        #[message = "Username must be 2 to 30 characters long"]
        InvalidUsername,

        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Name must contain only letters"]
        InvalidName,

        #[code = "INVALID_SURNAME"]
        #[status = BAD_REQUEST]
        #[message = "Surname must contain only letters"]
        InvalidSurname,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Enter a valid email address"]
        InvalidEmail,

        #[code = "INVALID_PHONE"]
        #[status = BAD_REQUEST]
        #[message = "Phone must be like \"+4919117293711\""]
        InvalidPhone,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be 6 to 128 characters long"]
        InvalidPassword,

        #[code = "PASSWORDS_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Passwords must match"]
        PasswordsMismatch,

        #[code = "EMAIL_OCCUPIED"]
        #[status = BAD_REQUEST]
        #[message = "This email is already registered"]
        EmailOccupied,

        #[code = "USERNAME_OCCUPIED"]
        #[status = BAD_REQUEST]
        #[message = "This username is already taken"]
        UsernameOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid credentials"]
        WrongCredentials,
    }
}
