//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::format_description::well_known::Iso8601;

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time component.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Returns the current UTC [`Date`].
    #[must_use]
    pub fn today() -> Self {
        Self::from(time::OffsetDateTime::now_utc().date())
    }

    /// Creates a new [`Date`] out of the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from)
    }

    /// Returns this [`Date`] shifted by the provided number of days.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.inner
            .checked_add(time::Duration::days(days))
            .map(Self::from)
    }

    /// Returns the next day after this [`Date`].
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn next_day(self) -> Option<Self> {
        self.inner.next_day().map(Self::from)
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid date, expected `YYYY-MM-DD`: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, &Iso8601::DATE).map(Self::from).map_err(ParseError)
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.inner.format(&Iso8601::DATE).map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
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
mod serde {
    //! Module providing integration with [`serde`] crate.

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::DateOf;

    impl<Of: ?Sized> Serialize for DateOf<Of> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateOf<Of> {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(d)?;
            raw.parse().map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    #[test]
    fn parses_iso_dates() {
        let date: Date = "2025-06-10".parse().unwrap();

        assert_eq!(date, Date::from_calendar(2025, 6, 10).unwrap());
        assert_eq!(date.to_string(), "2025-06-10");
    }

    #[test]
    fn rejects_malformed_dates() {
        for input in ["2025-13-01", "2025-02-30", "10.06.2025", ""] {
            assert!(input.parse::<Date>().is_err(), "input: {input}");
        }
    }

    #[test]
    fn shifts_by_days() {
        let date = Date::from_calendar(2025, 5, 31).unwrap();

        assert_eq!(
            date.next_day().unwrap(),
            Date::from_calendar(2025, 6, 1).unwrap(),
        );
        assert_eq!(
            date.checked_add_days(-31).unwrap(),
            Date::from_calendar(2025, 4, 30).unwrap(),
        );
    }
}
