//! TenantGate Auth — bearer credential verification, identity resolution
//! and tenant/permission access control.

pub mod access;
pub mod config;
pub mod error;
pub mod identity;
pub mod token;

pub use access::AccessController;
pub use config::AuthConfig;
pub use error::AuthError;
pub use identity::IdentityResolver;
pub use token::{VerifiedClaims, verify_credential};
