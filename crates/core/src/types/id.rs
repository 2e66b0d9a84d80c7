//! Newtype IDs for type-safe entity references.
//!
//! The backend services assign identifiers themselves and are not consistent
//! about their JSON type: some return numbers, some return strings. Every id
//! is normalised to a non-empty string on the way in and always serialized as
//! a string on the way out.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Error returned when an id cannot be built from its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    /// The input is empty or whitespace only.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Name of the id type being parsed.
        kind: &'static str,
    },
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or an integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`
/// - `FromStr` rejecting empty input
///
/// # Example
///
/// ```rust
/// # use resto_core::define_id;
/// define_id!(TableId);
/// define_id!(WaiterId);
///
/// let table = TableId::parse("12").unwrap();
/// let waiter = WaiterId::parse("12").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: TableId = waiter;
/// # let _ = (table, waiter);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build an id from its textual form.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty or whitespace only.
            pub fn parse(id: &str) -> Result<Self, $crate::types::id::ParseIdError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::ParseIdError::Empty {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = $crate::types::id::deserialize_raw_id(deserializer)?;
                Self::parse(&raw).map_err(::serde::de::Error::custom)
            }
        }
    };
}

/// Raw id as it appears on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

/// Deserialize an id that may be encoded as a JSON number or string.
///
/// Used by [`define_id!`]; not meant to be called directly.
///
/// # Errors
///
/// Returns the deserializer's error if the value is neither a number nor a string.
#[doc(hidden)]
pub fn deserialize_raw_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

define_id!(ClientId);
define_id!(AgentId);
define_id!(DeliveryId);
define_id!(OrderId);
