//! Gateway configuration: deployment environment, tenant resolution and
//! pipeline settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Deployment environment. Development-only resolution paths are gated on
/// this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

/// Inputs to tenant resolution.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Domain whose immediate sub-label is a tenant slug.
    pub base_domain: String,
    /// Hosts outside these domains never resolve by subdomain. Empty means
    /// `[base_domain]`.
    pub allowed_domains: Vec<String>,
    /// Whether the allow-list is enforced at all.
    pub validate_subdomain: bool,
    /// Fallback tenant id, used when no other signal applies.
    pub default_tenant_id: String,
    pub environment: Environment,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            base_domain: "contractprosuite.com".into(),
            allowed_domains: vec!["contractprosuite.com".into(), "localhost".into()],
            validate_subdomain: true,
            default_tenant_id: "00000000-0000-0000-0000-000000000000".into(),
            environment: Environment::Development,
        }
    }
}

impl TenancyConfig {
    /// The effective allow-list, lower-cased.
    pub fn allowed_domains(&self) -> Vec<String> {
        let domains = if self.allowed_domains.is_empty() {
            std::slice::from_ref(&self.base_domain)
        } else {
            self.allowed_domains.as_slice()
        };
        domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// Request pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Operations that run without credential, identity or tenant checks.
    pub public_operations: Vec<String>,
    /// Upper bound on everything after the audit record is opened.
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            public_operations: vec![crate::operations::SIGNUP_CLIENT.name.to_string()],
            request_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn is_public(&self, operation: &str) -> bool {
        self.public_operations.iter().any(|op| op == operation)
    }
}
