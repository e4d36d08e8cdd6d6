//! Newtype IDs for type-safe entity references.
//!
//! Identity providers and the mock directory hand out opaque string
//! identifiers (`sub` claims, `"user-1"`, `"uc-12"`). The `define_id!` macro
//! wraps them so a user id cannot be passed where a catalog entry id is
//! expected.

/// Error returned when an empty string is used as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier cannot be empty")]
pub struct EmptyId;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string (empty strings are rejected)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()`, `as_str()` and `Display`
///
/// # Example
///
/// ```rust
/// # use ai_portal_core::define_id;
/// define_id!(TicketId);
///
/// let id = TicketId::parse("ticket-7").unwrap();
/// assert_eq!(id.as_str(), "ticket-7");
/// assert!(TicketId::parse("").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an ID from a non-empty string.
            ///
            /// # Errors
            ///
            /// Returns [`EmptyId`]($crate::types::id::EmptyId) if the input is
            /// empty or whitespace only.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::types::id::EmptyId> {
                let id = id.trim();
                if id.is_empty() {
                    return Err($crate::types::id::EmptyId);
                }
                Ok(Self(id.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::types::id::EmptyId;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(CatalogEntryId);
define_id!(UsageRecordId);
