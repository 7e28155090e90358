//! Credential verification configuration.

use jsonwebtoken::Algorithm;

/// Configuration for bearer credential verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret used to validate signatures. Empty rejects
    /// every credential.
    pub jwt_secret: String,
    /// Accepted HMAC algorithm (default: HS256).
    pub algorithm: Algorithm,
    /// Clock skew tolerance for `exp`/`nbf` in seconds (default: 0).
    pub leeway_secs: u64,
    /// Expected `aud` claim. `None` skips audience validation.
    pub audience: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
            audience: None,
        }
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Self::default()
        }
    }
}
