//! Bearer credential verification.
//!
//! Credentials are issued elsewhere; this module only checks shape,
//! HMAC signature and standard time claims, then extracts the subject.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims read from the credential body. Absent claims decode as empty
/// strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialClaims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
}

/// Claims of a credential whose signature and expiry were verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub email: String,
    pub role: String,
}

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly two space-separated parts, the first
/// literally `Bearer`.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthError::MissingCredential),
    };
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Verify an `Authorization` header value and return its claims.
///
/// Pure function of the header and the configured secret.
pub fn verify_credential(
    header: Option<&str>,
    config: &AuthConfig,
) -> Result<VerifiedClaims, AuthError> {
    let token = bearer_token(header)?;

    if config.jwt_secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }
    if !matches!(
        config.algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    ) {
        return Err(AuthError::TokenInvalid(format!(
            "{:?} is not a shared-secret algorithm",
            config.algorithm
        )));
    }

    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    // Validation pins the algorithm list, so a token whose header names
    // any other algorithm fails before its signature is checked.
    let mut validation = Validation::new(config.algorithm);
    validation.leeway = config.leeway_secs;
    validation.set_required_spec_claims(&["exp"]);
    match &config.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    jsonwebtoken::decode::<CredentialClaims>(token, &key, &validation)
        .map(|data| VerifiedClaims {
            subject: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}
