//! Authentication and authorization error types.

use tenantgate_core::error::GateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingCredential,

    #[error("authorization header must be 'Bearer <token>'")]
    MalformedCredential,

    #[error("signing secret is not configured")]
    SecretNotConfigured,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("invalid user id format: {0}")]
    InvalidSubject(String),

    #[error("{0}")]
    AccessDenied(String),
}

impl From<AuthError> for GateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential
            | AuthError::MalformedCredential
            | AuthError::SecretNotConfigured
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => GateError::Unauthenticated {
                reason: err.to_string(),
            },
            AuthError::InvalidSubject(_) => GateError::InvalidArgument {
                message: err.to_string(),
            },
            AuthError::AccessDenied(reason) => GateError::PermissionDenied { reason },
        }
    }
}
