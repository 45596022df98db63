//! Macros for defining kind enums.

/// Macro for defining a kind enum backed by string literals.
///
/// The literal of each variant is used for its textual representation, its
/// [`serde`] form and its PostgreSQL `TEXT`/`VARCHAR` value. The [`serde`]
/// and PostgreSQL integrations are emitted only when the corresponding
/// features of this crate are enabled.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = "cube",
///
///         #[doc = "A sphere"]
///         Sphere = "sphere",
///     }
/// }
///
/// assert_eq!(Kind::Cube.as_str(), "cube");
/// assert_eq!("sphere".parse::<Kind>().unwrap(), Kind::Sphere);
/// ```
///
/// [`serde`]: https://docs.rs/serde
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:literal
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[doc = $doc]
        pub enum $name {
            $(
                #[doc = $variant_doc]
                #[strum(serialize = $value)]
                $variant,
            )*
        }

        impl $name {
            /// Returns the textual representation of this kind.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $value, )*
                }
            }
        }

        $crate::__kind_postgres!($name { $($variant = $value),* });
        $crate::__kind_serde!($name);
    };
}

#[cfg(feature = "postgres")]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_postgres {
    ($name:ident { $($variant:ident = $value:literal),* }) => {
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(TEXT, VARCHAR);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                match <&str as $crate::private::postgres_types::FromSql<'a>>::from_sql(
                    ty, raw,
                )? {
                    $(
                        $value => Ok(Self::$variant),
                    )*
                    v => Err(::std::format!(
                        "invalid `{}` value: {v}",
                        ::core::stringify!($name),
                    ).into()),
                }
            }
        }

        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(TEXT, VARCHAR);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                $crate::private::postgres_types::ToSql::to_sql(
                    &self.as_str(), ty, w,
                )
            }
        }
    };
}

#[cfg(not(feature = "postgres"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_postgres {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "serde")]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($name:ident) => {
        impl $crate::private::serde::Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::private::serde::Serializer,
            {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> $crate::private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: $crate::private::serde::Deserializer<'de>,
            {
                let raw = <::std::string::String as
                    $crate::private::serde::Deserialize<'de>>::deserialize(d)?;
                raw.parse().map_err(|_| {
                    <D::Error as $crate::private::serde::de::Error>::custom(
                        ::std::format!(
                            "invalid `{}` value: {raw}",
                            ::core::stringify!($name),
                        ),
                    )
                })
            }
        }
    };
}

#[cfg(not(feature = "serde"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($($tt:tt)*) => {};
}
