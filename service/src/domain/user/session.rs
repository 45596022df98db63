//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From};
use jsonwebtoken::{errors::Error as JwtError, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Authenticated session of a [`User`], carried as [JWT] claims.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Signs this [`Session`] into a [`Token`] with the provided `key`.
    ///
    /// # Errors
    ///
    /// If the claims cannot be signed.
    pub fn sign(&self, key: &EncodingKey) -> Result<Token, JwtError> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), self, key)
            .map(Token)
    }
}

/// Access token of a [`Session`].
///
/// Any string can be a [`Token`]: it's [`Token::verify()`] deciding whether
/// it represents a [`Session`].
#[derive(AsRef, Clone, Debug, Display, From)]
pub struct Token(String);

impl Token {
    /// Verifies the signature and the expiration of this [`Token`], returning
    /// the [`Session`] it carries.
    ///
    /// # Errors
    ///
    /// If this [`Token`] is malformed, forged or expired.
    pub fn verify(&self, key: &DecodingKey) -> Result<Session, JwtError> {
        let mut validation = jsonwebtoken::Validation::default();
        validation.leeway = 0;
        jsonwebtoken::decode(&self.0, key, &validation).map(|d| d.claims)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{DecodingKey, EncodingKey};

    use super::{Session, Token};
    use crate::domain::user;

    fn session(ttl_secs: i64) -> Session {
        let now = DateTime::now().unix_timestamp();
        Session {
            user_id: user::Id::new(),
            expires_at: DateTime::from_unix_timestamp(now + ttl_secs)
                .unwrap()
                .coerce(),
        }
    }

    #[test]
    fn verifies_signed_token() {
        let session = session(60);
        let token = session.sign(&EncodingKey::from_secret(b"key")).unwrap();

        let verified =
            token.verify(&DecodingKey::from_secret(b"key")).unwrap();

        assert_eq!(verified.user_id, session.user_id);
        assert_eq!(verified.expires_at, session.expires_at);
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = session(60).sign(&EncodingKey::from_secret(b"key")).unwrap();

        assert!(token.verify(&DecodingKey::from_secret(b"other")).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = session(-1).sign(&EncodingKey::from_secret(b"key")).unwrap();

        assert!(token.verify(&DecodingKey::from_secret(b"key")).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let token = Token::from("definitely.not.jwt".to_owned());

        assert!(token.verify(&DecodingKey::from_secret(b"key")).is_err());
    }
}
