//! Strongly-typed ID wrappers for ledger entities
//!
//! Each entity gets its own UUID newtype so an `AccountId` can never be
//! passed where a `CategoryId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EnvelopeError;

macro_rules! define_id {
    ($name:ident, $prefix:literal, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse a full UUID, optionally carrying the display prefix
            ///
            /// Anything that is not a UUID is rejected as invalid input.
            pub fn parse(s: &str) -> Result<Self, EnvelopeError> {
                let trimmed = s.trim();
                let raw = trimmed.strip_prefix($prefix).unwrap_or(trimmed);
                Uuid::parse_str(raw).map(Self).map_err(|_| {
                    EnvelopeError::Validation(format!("Invalid {} id: '{}'", $entity, s))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, &self.0.simple().to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = EnvelopeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_id!(AccountId, "acc-", "account");
define_id!(CategoryId, "cat-", "category");
define_id!(CategoryGroupId, "grp-", "category group");
define_id!(AllocationId, "alc-", "allocation");
define_id!(TransactionId, "txn-", "transaction");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_short_and_prefixed() {
        let id = CategoryId::new();
        let display = id.to_string();
        assert!(display.starts_with("cat-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_parse_accepts_prefixed_uuid() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain = AccountId::parse(uuid_str).unwrap();
        let prefixed = AccountId::parse(&format!("acc-{}", uuid_str)).unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_parse_rejects_non_uuid() {
        let err = TransactionId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let id = AllocationId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
