//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::Decimal;

use crate::define_kind;

/// Amount of money in some [`Currency`].
///
/// Textually represented as `{amount}{currency}`, like `80.5EUR`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Indicates whether this [`Money`] amount is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.currency)
    }
}

/// Error of parsing [`Money`] from a string.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ParseError {
    /// Amount is not a decimal number.
    #[display("invalid `Money` amount")]
    Amount,

    /// Currency code is missing or unknown.
    #[display("invalid `Money` currency")]
    Currency,
}

impl FromStr for Money {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or(ParseError::Currency)?;
        let (amount, currency) = s.split_at(split);

        Ok(Self {
            amount: amount.parse().map_err(|_| ParseError::Amount)?,
            currency: currency.parse().map_err(|_| ParseError::Currency)?,
        })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Euro."]
        Eur = "EUR",

        #[doc = "US Dollar."]
        Usd = "USD",
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! [`Money`] (de)serialization as a string.

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            String::deserialize(d)?.parse().map_err(de::Error::custom)
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_spec {
    use super::{Currency, Money};

    #[test]
    fn round_trips_through_json_string() {
        let money = Money {
            amount: "80.50".parse().unwrap(),
            currency: Currency::Usd,
        };

        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, r#""80.5USD""#);
        assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), money);
    }
}
