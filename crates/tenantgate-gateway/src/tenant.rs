//! Tenant resolution from untrusted request signals.
//!
//! Strategies are tried in order. Each one either resolves a tenant id,
//! declares itself not applicable (the next strategy runs), or rejects the
//! request outright. Whatever id wins is then checked against storage: the
//! tenant must exist and be active.

use std::fmt;

use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::tenant::Tenant;
use tenantgate_core::repository::TenantRepository;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::request::InboundRequest;

/// One source of a tenant id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Slug taken from the host's label below the base domain.
    Subdomain,
    /// `x-client-id` header.
    Header,
    /// `client_id` path or query parameter. Never consulted in production.
    PathParam,
    /// Configured fallback tenant.
    Default,
}

impl ResolutionStrategy {
    pub const ORDERED: [ResolutionStrategy; 4] = [
        ResolutionStrategy::Subdomain,
        ResolutionStrategy::Header,
        ResolutionStrategy::PathParam,
        ResolutionStrategy::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionStrategy::Subdomain => "subdomain",
            ResolutionStrategy::Header => "header",
            ResolutionStrategy::PathParam => "path_param",
            ResolutionStrategy::Default => "default",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single strategy. A rejection is the `Err` side of the
/// surrounding `GateResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Uuid),
    NotApplicable(String),
}

/// Why a host yields no tenant slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("domain not allowed")]
    NotAllowed,

    #[error("host is not under the base domain")]
    OutsideBaseDomain,

    #[error("no subdomain found")]
    NoSubdomain,

    #[error("empty subdomain")]
    EmptyLabel,
}

/// Lower-case `raw` and drop any port. Bracketed IPv6 literals keep their
/// address only.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        rest.split_once(']').map_or(rest, |(addr, _)| addr)
    } else if raw.matches(':').count() == 1 {
        raw.split_once(':').map_or(raw, |(host, _)| host)
    } else {
        raw
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Whether `host` equals, or is a subdomain of, one of `allowed`.
pub fn is_allowed_host(host: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|domain| {
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// The single label immediately preceding `base_domain` in `host`.
///
/// `a.acme.example.com` with base `example.com` yields `acme`.
pub fn extract_slug_from_host<'a>(host: &'a str, base_domain: &str) -> Result<&'a str, HostError> {
    let base = base_domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if host == base {
        return Err(HostError::NoSubdomain);
    }
    let prefix = host
        .strip_suffix(base.as_str())
        .and_then(|p| p.strip_suffix('.'))
        .ok_or(HostError::OutsideBaseDomain)?;
    let label = prefix.rsplit('.').next().unwrap_or(prefix);
    if label.is_empty() {
        return Err(HostError::EmptyLabel);
    }
    Ok(label)
}

/// Check `host` against the allow-list (when enforced) and extract its
/// slug.
pub fn slug_for_host<'a>(host: &'a str, config: &TenancyConfig) -> Result<&'a str, HostError> {
    if config.validate_subdomain && !is_allowed_host(host, &config.allowed_domains()) {
        return Err(HostError::NotAllowed);
    }
    extract_slug_from_host(host, &config.base_domain)
}

/// Determines and validates the tenant a request concerns.
#[derive(Clone)]
pub struct TenantResolver<T: TenantRepository> {
    tenants: T,
    config: TenancyConfig,
    strategies: Vec<ResolutionStrategy>,
}

impl<T: TenantRepository> TenantResolver<T> {
    pub fn new(tenants: T, config: TenancyConfig) -> Self {
        Self {
            tenants,
            config,
            strategies: ResolutionStrategy::ORDERED.to_vec(),
        }
    }

    /// Replace the strategy order.
    pub fn with_strategies(mut self, strategies: Vec<ResolutionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    /// Resolve the request's tenant and require it to be active.
    pub async fn resolve(&self, request: &InboundRequest) -> GateResult<Tenant> {
        let id = self.resolve_id(request).await?;

        let tenant = match self.tenants.get_by_id(id).await {
            Ok(tenant) => tenant,
            Err(e) if e.is_not_found() => {
                return Err(GateError::permission_denied("invalid client"));
            }
            Err(e) => return Err(e),
        };
        if !tenant.is_active() {
            debug!(tenant_id = %id, status = tenant.status.as_str(), "Tenant is not active");
            return Err(GateError::permission_denied("client is not active"));
        }
        Ok(tenant)
    }

    /// Run the strategies in order and return the first resolved id.
    pub async fn resolve_id(&self, request: &InboundRequest) -> GateResult<Uuid> {
        for &strategy in &self.strategies {
            match self.apply(strategy, request).await? {
                Resolution::Resolved(id) => {
                    debug!(strategy = strategy.as_str(), tenant_id = %id, "Tenant resolved");
                    return Ok(id);
                }
                Resolution::NotApplicable(reason) => {
                    debug!(strategy = strategy.as_str(), reason = %reason, "Strategy not applicable");
                }
            }
        }
        Err(GateError::invalid_argument("client_id not found"))
    }

    async fn apply(
        &self,
        strategy: ResolutionStrategy,
        request: &InboundRequest,
    ) -> GateResult<Resolution> {
        match strategy {
            ResolutionStrategy::Subdomain => self.from_subdomain(request.host.as_deref()).await,
            ResolutionStrategy::Header => {
                explicit_id(request.client_id_header.as_deref(), "no x-client-id header")
            }
            ResolutionStrategy::PathParam => {
                if self.config.environment.is_production() {
                    return Ok(not_applicable("path parameter ignored in production"));
                }
                explicit_id(request.client_id_param.as_deref(), "no client_id parameter")
            }
            ResolutionStrategy::Default => Ok(self.from_default()),
        }
    }

    async fn from_subdomain(&self, host: Option<&str>) -> GateResult<Resolution> {
        let Some(raw) = host.filter(|h| !h.trim().is_empty()) else {
            return Ok(not_applicable("no host"));
        };
        let host = normalize_host(raw);
        let slug = match slug_for_host(&host, &self.config) {
            Ok(slug) => slug,
            Err(e) => return Ok(Resolution::NotApplicable(format!("{host}: {e}"))),
        };

        match self.tenants.get_by_slug(slug).await {
            Ok(tenant) => Ok(Resolution::Resolved(tenant.id)),
            Err(e) if e.is_not_found() => {
                Ok(Resolution::NotApplicable(format!("unknown slug {slug}")))
            }
            Err(e) => Err(e),
        }
    }

    fn from_default(&self) -> Resolution {
        match Uuid::parse_str(self.config.default_tenant_id.trim()) {
            Ok(id) if !id.is_nil() => Resolution::Resolved(id),
            _ => not_applicable("no default client configured"),
        }
    }
}

/// A present value must be a UUID; an absent or blank one does not apply.
fn explicit_id(value: Option<&str>, absent: &str) -> GateResult<Resolution> {
    match value.map(str::trim) {
        None | Some("") => Ok(not_applicable(absent)),
        Some(v) => Uuid::parse_str(v)
            .map(Resolution::Resolved)
            .map_err(|_| GateError::invalid_argument("invalid client_id format")),
    }
}

fn not_applicable(reason: &str) -> Resolution {
    Resolution::NotApplicable(reason.to_string())
}
