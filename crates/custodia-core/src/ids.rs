//! Strongly Typed Identifiers
//!
//! This module provides type-safe identifier types for custodia.
//! Using the newtype pattern, these types prevent accidental misuse of
//! different ID types at compile time.
//!
//! # Example
//!
//! ```
//! use custodia_core::{ActorId, LoanId};
//!
//! let loan = LoanId::new();
//! let actor = ActorId::new();
//!
//! // Type safety: cannot pass ActorId where LoanId is expected
//! fn requires_loan(id: LoanId) -> String {
//!     id.to_string()
//! }
//!
//! let result = requires_loan(loan);
//! // requires_loan(actor); // This would not compile!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Consumes the ID and returns the underlying UUID.
            #[must_use]
            pub fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for loans.
    ///
    /// Identifies one device assignment from open to returned. Distinct from
    /// the business keys (document number, device code, SAP username) that
    /// drive lookups and exclusivity checks.
    ///
    /// # Example
    ///
    /// ```
    /// use custodia_core::LoanId;
    /// use uuid::Uuid;
    ///
    /// // Create a new random LoanId
    /// let loan_id = LoanId::new();
    /// println!("Loan: {}", loan_id);
    ///
    /// // Create from existing UUID
    /// let uuid = Uuid::new_v4();
    /// let loan_id = LoanId::from_uuid(uuid);
    /// assert_eq!(loan_id.as_uuid(), &uuid);
    ///
    /// // Parse from string
    /// let loan_id: LoanId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
    /// ```
    LoanId
);

define_id!(
    /// Strongly typed identifier for audit events.
    ///
    /// Identifies one immutable record in the administrative change log.
    ///
    /// # Example
    ///
    /// ```
    /// use custodia_core::AuditEventId;
    ///
    /// let event_id = AuditEventId::new();
    /// println!("Event: {}", event_id);
    /// ```
    AuditEventId
);

define_id!(
    /// Strongly typed identifier for the system account performing an
    /// operation.
    ///
    /// Stamped on every loan registration and every audit event for actor
    /// attribution. Account management itself lives with an external
    /// collaborator; the core only carries the id.
    ///
    /// # Example
    ///
    /// ```
    /// use custodia_core::ActorId;
    ///
    /// let actor_id = ActorId::new();
    /// println!("Actor: {}", actor_id);
    /// ```
    ActorId
);

#[cfg(test)]
mod tests {
    use super::*;

    mod loan_id_tests {
        use super::*;

        #[test]
        fn test_new_creates_valid_id() {
            let id = LoanId::new();
            let id_str = id.to_string();
            // UUID format: 8-4-4-4-12 hex digits
            assert_eq!(id_str.len(), 36);
            assert!(id_str.contains('-'));
        }

        #[test]
        fn test_from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = LoanId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }

        #[test]
        fn test_display_returns_uuid_string() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            let id = LoanId::from_uuid(uuid);
            assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        }

        #[test]
        fn test_default_creates_new_id() {
            let id1 = LoanId::default();
            let id2 = LoanId::default();
            // Default should create new random IDs
            assert_ne!(id1, id2);
        }

        #[test]
        fn test_into_inner_returns_uuid() {
            let uuid = Uuid::new_v4();
            let id = LoanId::from_uuid(uuid);
            assert_eq!(id.into_inner(), uuid);
        }
    }

    mod actor_id_tests {
        use super::*;

        #[test]
        fn test_new_creates_valid_id() {
            let id = ActorId::new();
            let id_str = id.to_string();
            assert_eq!(id_str.len(), 36);
        }

        #[test]
        fn test_from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = ActorId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }

        #[test]
        fn test_uuid_round_trip_via_from() {
            let uuid = Uuid::new_v4();
            let id: ActorId = uuid.into();
            let back: Uuid = id.into();
            assert_eq!(back, uuid);
        }
    }

    mod audit_event_id_tests {
        use super::*;

        #[test]
        fn test_new_creates_valid_id() {
            let id = AuditEventId::new();
            let id_str = id.to_string();
            assert_eq!(id_str.len(), 36);
        }

        #[test]
        fn test_from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = AuditEventId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_loan_id_serde_roundtrip() {
            let original = LoanId::new();
            let json = serde_json::to_string(&original).unwrap();
            let deserialized: LoanId = serde_json::from_str(&json).unwrap();
            assert_eq!(original, deserialized);
        }

        #[test]
        fn test_actor_id_serde_roundtrip() {
            let original = ActorId::new();
            let json = serde_json::to_string(&original).unwrap();
            let deserialized: ActorId = serde_json::from_str(&json).unwrap();
            assert_eq!(original, deserialized);
        }

        #[test]
        fn test_audit_event_id_serde_roundtrip() {
            let original = AuditEventId::new();
            let json = serde_json::to_string(&original).unwrap();
            let deserialized: AuditEventId = serde_json::from_str(&json).unwrap();
            assert_eq!(original, deserialized);
        }

        #[test]
        fn test_serializes_as_plain_string() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            let id = LoanId::from_uuid(uuid);
            let json = serde_json::to_string(&id).unwrap();
            // Should serialize as plain quoted string, not as object
            assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        }
    }

    mod from_str_tests {
        use super::*;

        #[test]
        fn test_parse_valid_uuid() {
            let id: LoanId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
            assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        }

        #[test]
        fn test_parse_invalid_uuid_returns_error() {
            let result: std::result::Result<LoanId, _> = "not-a-uuid".parse();
            assert!(result.is_err());
            let err = result.unwrap_err();
            assert_eq!(err.id_type, "LoanId");
            assert!(!err.message.is_empty());
        }

        #[test]
        fn test_parse_empty_string_returns_error() {
            let result: std::result::Result<ActorId, _> = "".parse();
            assert!(result.is_err());
            let err = result.unwrap_err();
            assert_eq!(err.id_type, "ActorId");
        }

        #[test]
        fn test_error_display() {
            let result: std::result::Result<AuditEventId, _> = "invalid".parse();
            let err = result.unwrap_err();
            let display = err.to_string();
            assert!(display.contains("AuditEventId"));
            assert!(display.contains("Failed to parse"));
        }
    }

    mod hash_eq_tests {
        use super::*;
        use std::collections::HashMap;

        #[test]
        fn test_same_uuid_is_equal() {
            let uuid = Uuid::new_v4();
            let id1 = LoanId::from_uuid(uuid);
            let id2 = LoanId::from_uuid(uuid);
            assert_eq!(id1, id2);
        }

        #[test]
        fn test_different_uuids_are_not_equal() {
            let id1 = LoanId::new();
            let id2 = LoanId::new();
            assert_ne!(id1, id2);
        }

        #[test]
        fn test_can_use_as_hashmap_key() {
            let mut map: HashMap<LoanId, String> = HashMap::new();
            let id1 = LoanId::new();
            let id2 = LoanId::new();

            map.insert(id1, "loan1".to_string());
            map.insert(id2, "loan2".to_string());

            assert_eq!(map.get(&id1), Some(&"loan1".to_string()));
            assert_eq!(map.get(&id2), Some(&"loan2".to_string()));
        }

        #[test]
        fn test_copy_semantics() {
            let id1 = ActorId::new();
            let id2 = id1; // Copy
            assert_eq!(id1, id2); // Both are still valid
        }
    }
}
