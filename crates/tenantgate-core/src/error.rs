//! Error types for the TenantGate system.
//!
//! Every failure surfaced to a caller maps onto exactly one
//! [`OutcomeCode`]. Storage failures additionally carry a
//! [`Transience`] classification supplied by the storage adapter.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-agnostic outcome taxonomy reported to callers and audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCode {
    Ok,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    Cancelled,
    Internal,
}

impl OutcomeCode {
    /// Numeric status recorded in audit entries.
    pub fn status(self) -> u16 {
        match self {
            OutcomeCode::Ok => 200,
            OutcomeCode::InvalidArgument => 400,
            OutcomeCode::Unauthenticated => 401,
            OutcomeCode::PermissionDenied => 403,
            OutcomeCode::NotFound => 404,
            OutcomeCode::AlreadyExists => 409,
            OutcomeCode::Cancelled => 499,
            OutcomeCode::Internal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeCode::Ok => "OK",
            OutcomeCode::InvalidArgument => "INVALID_ARGUMENT",
            OutcomeCode::Unauthenticated => "UNAUTHENTICATED",
            OutcomeCode::PermissionDenied => "PERMISSION_DENIED",
            OutcomeCode::NotFound => "NOT_FOUND",
            OutcomeCode::AlreadyExists => "ALREADY_EXISTS",
            OutcomeCode::Cancelled => "CANCELLED",
            OutcomeCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a storage failure may succeed if the unit of work is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transience {
    Transient,
    Permanent,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: String, key: String },

    #[error("database error: {message}")]
    Database {
        message: String,
        transience: Transience,
    },

    /// A unit of work failed after an account was created at the external
    /// identity provider. The account is left behind and must be
    /// reconciled manually.
    #[error("external account {external_id} orphaned: {source}")]
    ExternalAccountOrphaned {
        external_id: String,
        #[source]
        source: Box<GateError>,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        GateError::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GateError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        GateError::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        GateError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: impl Into<String>, key: impl Into<String>) -> Self {
        GateError::AlreadyExists {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// The outcome code this error is reported under.
    ///
    /// An orphaned external account reports the code of the failure that
    /// caused it.
    pub fn code(&self) -> OutcomeCode {
        match self {
            GateError::Unauthenticated { .. } => OutcomeCode::Unauthenticated,
            GateError::InvalidArgument { .. } => OutcomeCode::InvalidArgument,
            GateError::PermissionDenied { .. } => OutcomeCode::PermissionDenied,
            GateError::NotFound { .. } => OutcomeCode::NotFound,
            GateError::AlreadyExists { .. } => OutcomeCode::AlreadyExists,
            GateError::ExternalAccountOrphaned { source, .. } => source.code(),
            GateError::Cancelled => OutcomeCode::Cancelled,
            GateError::Database { .. } | GateError::Internal(_) => OutcomeCode::Internal,
        }
    }

    /// True only for storage failures the adapter classified as transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GateError::Database {
                transience: Transience::Transient,
                ..
            }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GateError::NotFound { .. })
    }
}

pub type GateResult<T> = Result<T, GateError>;
