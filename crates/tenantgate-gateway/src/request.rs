//! Transport-agnostic request and per-request context.

use tenantgate_auth::VerifiedClaims;
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::identity::{Identity, IdentityKind};
use tenantgate_core::models::permission::{Action, Feature};
use uuid::Uuid;

/// The permission an operation demands within the request tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Tenant access alone is enough.
    None,
    One(Feature, Action),
    /// Granted when at least one pair is granted.
    AnyOf(&'static [(Feature, Action)]),
    /// Granted only when every pair is granted.
    AllOf(&'static [(Feature, Action)]),
}

/// A named operation, who may call it and what it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub requirement: Requirement,
    /// Identity kinds allowed to call the operation. Empty allows every
    /// kind.
    pub allowed_kinds: &'static [IdentityKind],
}

impl Operation {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            requirement: Requirement::None,
            allowed_kinds: &[],
        }
    }

    pub const fn requires(name: &'static str, feature: Feature, action: Action) -> Self {
        Self {
            requirement: Requirement::One(feature, action),
            ..Self::new(name)
        }
    }

    pub const fn requires_any(name: &'static str, pairs: &'static [(Feature, Action)]) -> Self {
        Self {
            requirement: Requirement::AnyOf(pairs),
            ..Self::new(name)
        }
    }

    pub const fn requires_all(name: &'static str, pairs: &'static [(Feature, Action)]) -> Self {
        Self {
            requirement: Requirement::AllOf(pairs),
            ..Self::new(name)
        }
    }

    /// Restrict the operation to the given identity kinds.
    pub const fn only(mut self, kinds: &'static [IdentityKind]) -> Self {
        self.allowed_kinds = kinds;
        self
    }

    /// An operation for a REST-style route, e.g. `GET /api/v1/contracts`.
    /// `None` when the first path segment is not a known feature.
    pub fn from_route(name: &'static str, method: &str, path: &str) -> Option<Self> {
        let (feature, action) = permission_for_route(method, path)?;
        Some(Self::requires(name, feature, action))
    }

    pub fn allows(&self, kind: IdentityKind) -> bool {
        self.allowed_kinds.is_empty() || self.allowed_kinds.contains(&kind)
    }
}

/// GET reads, POST/PUT/PATCH write, DELETE deletes. Anything else reads.
pub fn action_for_method(method: &str) -> Action {
    match method.to_ascii_uppercase().as_str() {
        "POST" | "PUT" | "PATCH" => Action::Write,
        "DELETE" => Action::Delete,
        _ => Action::Read,
    }
}

/// The feature named by the first segment after `/api/v1/`, paired with
/// the action implied by `method`.
pub fn permission_for_route(method: &str, path: &str) -> Option<(Feature, Action)> {
    let rest = path.strip_prefix("/api/v1/").unwrap_or(path.trim_start_matches('/'));
    let segment = rest.split('/').next()?;
    let feature = segment.parse::<Feature>().ok()?;
    Some((feature, action_for_method(method)))
}

/// The signals a transport extracts from an inbound call.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Host or authority the call was addressed to.
    pub host: Option<String>,
    /// `x-client-id` header value.
    pub client_id_header: Option<String>,
    /// `client_id` path or query parameter.
    pub client_id_param: Option<String>,
    pub request_id: Option<String>,
}

impl InboundRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_authorization(format!("Bearer {token}"))
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_client_id_header(mut self, value: impl Into<String>) -> Self {
        self.client_id_header = Some(value.into());
        self
    }

    pub fn with_client_id_param(mut self, value: impl Into<String>) -> Self {
        self.client_id_param = Some(value.into());
        self
    }

    pub fn with_request_id(mut self, value: impl Into<String>) -> Self {
        self.request_id = Some(value.into());
        self
    }
}

/// What the pipeline established about a request, handed to the handler
/// by value.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub claims: Option<VerifiedClaims>,
    pub identity: Option<Identity>,
    pub tenant_id: Option<Uuid>,
}

impl RequestContext {
    /// The caller's identity. Absent only on public operations.
    pub fn identity(&self) -> GateResult<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| GateError::unauthenticated("no identity on request"))
    }

    /// The tenant the request was resolved to.
    pub fn tenant_id(&self) -> GateResult<Uuid> {
        self.tenant_id
            .ok_or_else(|| GateError::Internal("tenant was not resolved for this request".into()))
    }
}
