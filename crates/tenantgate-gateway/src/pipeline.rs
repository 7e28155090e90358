//! The request pipeline.
//!
//! Every call runs, in order: audit begin, credential verification,
//! identity resolution, tenant resolution with access validation, the
//! operation's identity-kind and permission requirements, the handler, and
//! audit end. The first failing stage ends the chain and its error is
//! returned unchanged.
//! Public operations skip straight from audit begin to the handler.

use std::sync::Arc;

use tenantgate_auth::{AccessController, AuthConfig, IdentityResolver, verify_credential};
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::identity::Identity;
use tenantgate_core::repository::Repositories;
use tracing::{debug, warn};

use crate::audit::{AuditGuard, AuditSink};
use crate::config::{PipelineConfig, TenancyConfig};
use crate::request::{InboundRequest, Operation, RequestContext, Requirement};
use crate::tenant::TenantResolver;

struct PipelineInner<R: Repositories, S: AuditSink> {
    auth: AuthConfig,
    identities: IdentityResolver<R::Operators, R::Assignments, R::Members>,
    access: AccessController<R::Assignments, R::Roles>,
    tenants: TenantResolver<R::Tenants>,
    config: PipelineConfig,
    sink: S,
}

/// Cheap to clone; clones share configuration and repositories.
pub struct Pipeline<R: Repositories, S: AuditSink> {
    inner: Arc<PipelineInner<R, S>>,
}

impl<R: Repositories, S: AuditSink> Clone for Pipeline<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Repositories, S: AuditSink> Pipeline<R, S> {
    pub fn new(
        repos: &R,
        auth: AuthConfig,
        tenancy: TenancyConfig,
        config: PipelineConfig,
        sink: S,
    ) -> Self {
        let inner = PipelineInner {
            auth,
            identities: IdentityResolver::new(
                repos.operators().clone(),
                repos.assignments().clone(),
                repos.members().clone(),
            ),
            access: AccessController::new(repos.assignments().clone(), repos.roles().clone()),
            tenants: TenantResolver::new(repos.tenants().clone(), tenancy),
            config,
            sink,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    /// Run `handler` for `operation` behind every pipeline stage.
    ///
    /// Exactly one audit record is written per call, including when the
    /// returned future is dropped before completion.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: Operation,
        request: InboundRequest,
        handler: F,
    ) -> GateResult<T>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = GateResult<T>>,
    {
        let inner = &*self.inner;
        let mut audit = AuditGuard::begin(&inner.sink, operation.name, request.request_id.clone());

        let stages = inner.run(operation, &request, &mut audit, handler);
        let result = match inner.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, stages).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        operation = operation.name,
                        timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        "Request timed out"
                    );
                    Err(GateError::Cancelled)
                }
            },
            None => stages.await,
        };

        audit.finish(result.as_ref().err());
        result
    }
}

impl<R: Repositories, S: AuditSink> PipelineInner<R, S> {
    async fn run<F, Fut, T>(
        &self,
        operation: Operation,
        request: &InboundRequest,
        audit: &mut AuditGuard<'_, S>,
        handler: F,
    ) -> GateResult<T>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = GateResult<T>>,
    {
        if self.config.is_public(operation.name) {
            debug!(operation = operation.name, "Public operation, skipping authorization");
            return handler(RequestContext {
                request_id: request.request_id.clone(),
                ..RequestContext::default()
            })
            .await;
        }

        let claims = verify_credential(request.authorization.as_deref(), &self.auth)?;

        let identity = self.identities.resolve(&claims.subject).await?;
        audit.observe_identity(&identity);

        let tenant = self.tenants.resolve(request).await?;
        audit.observe_tenant(tenant.id);

        self.access
            .validate_client_access(&identity, tenant.id)
            .await?;
        // Permissions are evaluated in the tenant the request acts on, never
        // in another tenant the operator is also assigned to.
        let identity = identity.scoped_to(tenant.id);
        self.authorize(&operation, &identity).await?;

        debug!(
            operation = operation.name,
            identity_id = %identity.id,
            kind = identity.kind.as_str(),
            tenant_id = %tenant.id,
            "Request authorized"
        );

        handler(RequestContext {
            request_id: request.request_id.clone(),
            claims: Some(claims),
            identity: Some(identity),
            tenant_id: Some(tenant.id),
        })
        .await
    }

    async fn authorize(&self, operation: &Operation, identity: &Identity) -> GateResult<()> {
        if !operation.allows(identity.kind) {
            return Err(GateError::permission_denied("user type not allowed"));
        }

        match operation.requirement {
            Requirement::None => Ok(()),
            Requirement::One(feature, action) => {
                self.access.check_permission(identity, feature, action).await
            }
            Requirement::AnyOf(pairs) => {
                for &(feature, action) in pairs {
                    match self.access.check_permission(identity, feature, action).await {
                        Ok(()) => return Ok(()),
                        Err(GateError::PermissionDenied { .. }) => continue,
                        Err(e) => return Err(e),
                    }
                }
                Err(GateError::permission_denied("insufficient permissions"))
            }
            Requirement::AllOf(pairs) => {
                for &(feature, action) in pairs {
                    self.access
                        .check_permission(identity, feature, action)
                        .await?;
                }
                Ok(())
            }
        }
    }
}
