//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash as Phc, PasswordHasher as _,
        PasswordVerifier as _, SaltString,
    },
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Marketplace user, either a lessor or a renter.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// First [`Name`] of this [`User`].
    pub name: Name,

    /// Last name of this [`User`].
    pub surname: Name,

    /// [`Email`] of this [`User`], used as a login.
    pub email: Email,

    /// [`Phone`] of this [`User`].
    pub phone: Option<Phone>,

    /// Indicator whether this [`User`] publishes announcements.
    pub is_lessor: bool,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was last modified.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`User`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl User {
    /// Returns the [`Role`] of this [`User`].
    #[must_use]
    pub fn role(&self) -> Role {
        if self.is_lessor {
            Role::Lessor
        } else {
            Role::Renter
        }
    }
}

/// Role of a [`User`] on the marketplace.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Role {
    /// [`User`] publishing announcements and approving their bookings.
    Lessor,

    /// [`User`] booking announcements.
    Renter,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Unique public nickname of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        let username = username.as_ref();
        let len = username.chars().count();
        username.trim() == username
            && (2..=30).contains(&len)
            && !username.chars().any(char::is_control)
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// First or last name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Name`] invariants:
        /// - Must contain only ASCII letters;
        /// - Must be between 2 and 25 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z]{2,25}$").expect("valid regex")
        });

        REGEX.is_match(name.as_ref())
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        (6..=128).contains(&password.as_ref().chars().count())
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2] hash of a [`Password`] in the [PHC string format].
///
/// [Argon2]: https://en.wikipedia.org/wiki/Argon2
/// [PHC string format]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with a random salt.
    ///
    /// # Errors
    ///
    /// If [`Argon2`] fails to hash the [`Password`].
    pub fn new(
        password: &Password,
    ) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
    }

    /// Checks whether the given [`Password`] matches this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        Phc::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    ///
    /// The address is normalized to lowercase.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
            )
            .expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// German phone number of a [`User`] (`+49` followed by 11 digits).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+49\d{11}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was last modified.
pub type ModificationDateTime = DateTimeOf<(User, unit::Modification)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, Password, PasswordHash, Phone, Username};

    #[test]
    fn name_accepts_only_ascii_letters() {
        assert!(Name::new("Anna").is_some());
        assert!(Name::new("Jo").is_some());
        assert!(Name::new("A").is_none());
        assert!(Name::new("Anna-Maria").is_none());
        assert!(Name::new("Jürgen").is_none());
        assert!(Name::new("a".repeat(26)).is_none());
    }

    #[test]
    fn username_length_is_bounded() {
        assert!(Username::new("ab").is_some());
        assert!(Username::new("x".repeat(30)).is_some());
        assert!(Username::new("x").is_none());
        assert!(Username::new("x".repeat(31)).is_none());
        assert!(Username::new(" padded ").is_none());
    }

    #[test]
    fn phone_must_be_german() {
        assert!(Phone::new("+4919117293711").is_some());
        assert!(Phone::new("+491911729371").is_none());
        assert!(Phone::new("+4319117293711").is_none());
        assert!(Phone::new("4919117293711").is_none());
    }

    #[test]
    fn email_is_normalized() {
        let email = Email::new("Renter@Example.COM").unwrap();

        assert_eq!(AsRef::<str>::as_ref(&email), "renter@example.com");
        assert!(Email::new("not-an-email").is_none());
        assert!(Email::new("a@b").is_none());
    }

    #[test]
    fn password_length_is_bounded() {
        assert!(Password::new("123456").is_some());
        assert!(Password::new("12345").is_none());
        assert!(Password::new("x".repeat(129)).is_none());
    }

    #[test]
    fn password_hash_verifies_only_original_password() {
        let password = Password::new("secret-pass").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("secret-pasS").unwrap()));
        assert_ne!(hash, PasswordHash::new(&password).unwrap());
    }
}
