//! [`DateTime`] definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{
    cmp::Ordering, fmt, marker::PhantomData, ops, str::FromStr, time::Duration,
};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::well_known::Rfc3339, UtcOffset};

/// Untyped [`DateTimeOf`].
pub type DateTime = DateTimeOf;

/// Point in time in UTC, with a microsecond precision.
///
/// The `Of` parameter tells apart moments of different meaning (creation,
/// expiration, etc.) at the type level.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of this [`DateTimeOf`].
    inner: time::OffsetDateTime,

    /// Kind of this [`DateTimeOf`].
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Returns the current [`DateTime`].
    #[must_use]
    pub fn now() -> Self {
        Self::from(time::OffsetDateTime::now_utc())
    }

    /// Creates a new [`DateTime`] out of the provided number of seconds since
    /// the Unix epoch.
    ///
    /// [`None`] is returned if the `timestamp` is out of range.
    #[must_use]
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        time::OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(Self::from)
    }

    /// Returns the number of whole seconds since the Unix epoch.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.inner.unix_timestamp()
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid RFC 3339 date and time: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> FromStr for DateTimeOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::OffsetDateTime::parse(s, &Rfc3339)
            .map(Self::from)
            .map_err(ParseError)
    }
}

impl<Of: ?Sized> fmt::Display for DateTimeOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.inner.format(&Rfc3339).map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Normalizes to UTC and truncates to microseconds, as PostgreSQL stores it.
impl<Of: ?Sized> From<time::OffsetDateTime> for DateTimeOf<Of> {
    fn from(dt: time::OffsetDateTime) -> Self {
        let dt = dt.to_offset(UtcOffset::UTC);
        let sub_micros = i64::from(dt.nanosecond() % 1_000);
        Self {
            inner: dt.saturating_sub(time::Duration::nanoseconds(sub_micros)),
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::from(self.inner.saturating_add(
            time::Duration::try_from(rhs).unwrap_or(time::Duration::MAX),
        ))
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! [`serde`] integration, as RFC 3339 strings by default.

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::DateTimeOf;

    impl<Of: ?Sized> Serialize for DateTimeOf<Of> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateTimeOf<Of> {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(d)?;
            raw.parse().map_err(de::Error::custom)
        }
    }

    pub mod unix_timestamp {
        //! [`DateTimeOf`] (de)serialization as seconds since the Unix epoch,
        //! to be used via `#[serde(with = "...")]`.

        use serde::{de, Deserialize as _, Deserializer, Serializer};

        use super::DateTimeOf;

        /// Serializes the provided [`DateTimeOf`] as a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the `serializer` fails.
        pub fn serialize<Of, S>(
            dt: &DateTimeOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            Of: ?Sized,
            S: Serializer,
        {
            serializer.serialize_i64(dt.unix_timestamp())
        }

        /// Deserializes a [`DateTimeOf`] from a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the timestamp is malformed or out of range.
        pub fn deserialize<'de, Of, D>(
            deserializer: D,
        ) -> Result<DateTimeOf<Of>, D::Error>
        where
            Of: ?Sized,
            D: Deserializer<'de>,
        {
            let timestamp = i64::deserialize(deserializer)?;
            DateTimeOf::from_unix_timestamp(timestamp).ok_or_else(|| {
                de::Error::custom(format!("out of range timestamp: {timestamp}"))
            })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::DateTime;

    #[test]
    fn parses_and_displays_rfc3339() {
        let dt: DateTime = "2025-06-01T12:30:00+02:00".parse().unwrap();

        assert_eq!(dt.to_string(), "2025-06-01T10:30:00Z");
        assert!("2025-06-01".parse::<DateTime>().is_err());
    }

    #[test]
    fn truncates_to_microseconds() {
        let dt: DateTime = "2025-06-01T10:30:00.123456789Z".parse().unwrap();

        assert_eq!(dt.to_string(), "2025-06-01T10:30:00.123456Z");
    }

    #[test]
    fn adds_durations() {
        let dt = DateTime::from_unix_timestamp(1_000).unwrap();
        let later = dt + Duration::from_secs(60);

        assert_eq!(later.unix_timestamp(), 1_060);
        assert!(later > dt);
    }
}
