//! Strongly-typed identifiers for domain entities
//!
//! Detections and estimations are both keyed by UUIDs; wrapping them keeps
//! a detection id from being passed where an estimation id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Detection collaborator identifiers
define_id!(DetectionId, "DET");
define_id!(DamageId, "DMG");

// Estimation identifiers
define_id!(EstimationId, "EST");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_id_display() {
        let id = DetectionId::new();
        assert!(id.to_string().starts_with("DET-"));
    }

    #[test]
    fn test_id_parsing_with_and_without_prefix() {
        let original = EstimationId::new_v7();
        let parsed: EstimationId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let bare: EstimationId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, bare);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let detection_id = DetectionId::from(uuid);
        let back: Uuid = detection_id.into();
        assert_eq!(uuid, back);
    }
}
