//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern matching any of the words of a search input.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Characters having a special meaning in `SIMILAR TO` patterns.
    const SPECIAL: &'static [char] = &[
        '\\', '%', '_', '|', '*', '+', '?', '{', '}', '(', ')', '[', ']',
    ];

    /// Creates a new [`FuzzPattern`] matching any whitespace-separated word
    /// of the given `input` at any position.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let words = input.split_whitespace().format_with("|", |word, f| {
            f(&format_args!(
                "%{}%",
                word.chars().format_with("", |c, f| {
                    if Self::SPECIAL.contains(&c) {
                        f(&format_args!("\\{c}"))
                    } else {
                        f(&c)
                    }
                }),
            ))
        });
        Self(format!("({words})"))
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        assert_eq!(
            FuzzPattern::new("  cozy   loft ").to_string(),
            "(%cozy%|%loft%)",
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            FuzzPattern::new("50% (new)").to_string(),
            r"(%50\%%|%\(new\)%)",
        );
    }
}
