//! Domain models for TenantGate.
//!
//! Enums that are persisted as text expose `as_str` and `FromStr` so the
//! storage adapter does not depend on serde representations.

pub mod audit;
pub mod identity;
pub mod member;
pub mod operator;
pub mod permission;
pub mod role;
pub mod tenant;

/// Error returned when a persisted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
