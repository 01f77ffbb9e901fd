//! Identifier value objects.
//!
//! Deal, session and user identifiers are issued by external systems (the
//! relational store, the post-call pipeline, the auth layer), so they are
//! opaque strings here. They are validated at the boundary with
//! [`DealId::parse`] and friends before any side effect happens.
//!
//! [`AnalysisId`] is issued by this core and is always a UUID v4.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length for an external identifier.
pub const MAX_ID_LEN: usize = 64;

fn is_valid_external_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a trusted identifier without validation.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Validates an identifier received from a caller.
            pub fn parse(value: &str) -> Result<Self, DomainError> {
                let trimmed = value.trim();
                if is_valid_external_id(trimmed) {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(DomainError::InvalidIdentifier {
                        kind: $kind,
                        value: value.to_string(),
                    })
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

external_id!(
    /// Identifier of a deal (startup under evaluation).
    DealId,
    "deal"
);

external_id!(
    /// Identifier of a call session and of its session summary.
    SessionId,
    "session"
);

external_id!(
    /// Identifier of a caller as yielded by the auth layer.
    UserId,
    "user"
);

/// Identifier of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses the hyphenated UUID form.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidIdentifier {
                kind: "analysis",
                value: value.to_string(),
            })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_slug_identifiers() {
        assert_eq!(DealId::parse("deal_42-acme").unwrap().as_str(), "deal_42-acme");
        assert_eq!(SessionId::parse("  sess-1 ").unwrap().as_str(), "sess-1");
    }

    #[test]
    fn test_parse_rejects_malformed_identifiers() {
        assert!(DealId::parse("").is_err());
        assert!(DealId::parse("deal/42").is_err());
        assert!(UserId::parse("a b").is_err());
        assert!(SessionId::parse(&"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_parse_error_names_kind() {
        let err = SessionId::parse("bad id").unwrap_err();
        assert!(err.to_string().contains("session"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_analysis_id_roundtrip_through_display() {
        let id = AnalysisId::generate();
        assert_eq!(AnalysisId::parse(&id.to_string()).unwrap(), id);
        assert!(AnalysisId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&DealId::new("d1")).unwrap();
        assert_eq!(json, "\"d1\"");
    }
}
