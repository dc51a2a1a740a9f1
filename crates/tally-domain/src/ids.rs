//! Record identifiers based on UUIDv7
//!
//! UUIDv7 keeps identifiers sortable by creation time, so listing records by
//! id also lists them chronologically.

use crate::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new time-ordered identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from its raw value (storage layer use)
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian bytes, the on-disk representation
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Rebuild an identifier from its on-disk bytes
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    DomainError::InvalidId(format!(
                        "expected 16 bytes for {}, got {}",
                        stringify!($name),
                        bytes.len()
                    ))
                })?;
                Ok(Self(u128::from_be_bytes(arr)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| DomainError::InvalidId(format!("'{}': {}", s, e)))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Identifier of a persisted transaction
    TransactionId
);

define_id!(
    /// Identifier of a persisted asset
    AssetId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering_is_chronological() {
        let id1 = AssetId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = AssetId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_id_display_and_parse() {
        let id = TransactionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<TransactionId>().unwrap(), id);
    }

    #[test]
    fn test_id_bytes() {
        let id = AssetId::from_value(42);
        assert_eq!(AssetId::from_bytes(&id.to_bytes()).unwrap(), id);
        assert!(AssetId::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_invalid_id_string() {
        assert!("not-a-uuid".parse::<AssetId>().is_err());
        assert!("".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = AssetId::from_value(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000001\"");
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
