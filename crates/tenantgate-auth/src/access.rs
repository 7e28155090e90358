//! Tenant isolation and feature/action authorization.
//!
//! Both checks are read-only. Every denial surfaces as
//! `PermissionDenied`. Storage failures other than not-found propagate
//! unchanged, so an unreachable store never grants access.

use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::identity::{Identity, IdentityKind};
use tenantgate_core::models::operator::{OperatorAssignment, OperatorRole};
use tenantgate_core::models::permission::{Action, Feature};
use tenantgate_core::repository::{OperatorAssignmentRepository, RoleRepository};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Clone)]
pub struct AccessController<A, R>
where
    A: OperatorAssignmentRepository,
    R: RoleRepository,
{
    assignments: A,
    roles: R,
}

impl<A, R> AccessController<A, R>
where
    A: OperatorAssignmentRepository,
    R: RoleRepository,
{
    pub fn new(assignments: A, roles: R) -> Self {
        Self { assignments, roles }
    }

    /// Check that `identity` may act on `tenant_id` at all.
    ///
    /// Operators need an active assignment to that tenant. Members must be
    /// bound to exactly that tenant.
    pub async fn validate_client_access(
        &self,
        identity: &Identity,
        tenant_id: Uuid,
    ) -> GateResult<()> {
        match identity.kind {
            IdentityKind::Operator => {
                let assignment = self
                    .active_assignment(tenant_id, identity.id, "client access denied")
                    .await?;
                debug!(
                    operator_id = %identity.id,
                    tenant_id = %tenant_id,
                    role = assignment.role.as_str(),
                    "Operator tenant access granted"
                );
                Ok(())
            }
            IdentityKind::Member => {
                if identity.effective_tenant_id == Some(tenant_id) {
                    Ok(())
                } else {
                    Err(deny("client access denied"))
                }
            }
        }
    }

    /// Check that `identity` may perform `action` on `feature` within its
    /// effective tenant.
    pub async fn check_permission(
        &self,
        identity: &Identity,
        feature: Feature,
        action: Action,
    ) -> GateResult<()> {
        match identity.kind {
            IdentityKind::Operator => self.check_operator(identity, action).await,
            IdentityKind::Member => self.check_member(identity, feature, action).await,
        }
    }

    async fn check_operator(&self, identity: &Identity, action: Action) -> GateResult<()> {
        let tenant_id = identity
            .effective_tenant_id
            .ok_or_else(|| deny("operator not assigned to any client"))?;

        let assignment = self
            .active_assignment(tenant_id, identity.id, "operator not assigned to client")
            .await?;

        match assignment.role {
            OperatorRole::Admin | OperatorRole::Operator => Ok(()),
            OperatorRole::Viewer if action == Action::Read => Ok(()),
            OperatorRole::Viewer => Err(deny("viewer can only read")),
        }
    }

    async fn check_member(
        &self,
        identity: &Identity,
        feature: Feature,
        action: Action,
    ) -> GateResult<()> {
        let tenant_id = identity
            .effective_tenant_id
            .ok_or_else(|| deny("user is not bound to a client"))?;

        let bindings = self
            .roles
            .list_member_bindings(tenant_id, identity.id)
            .await?;
        if bindings.is_empty() {
            return Err(deny("user has no roles assigned"));
        }

        for binding in &bindings {
            let permissions = match self.roles.list_permissions(binding.role_id).await {
                Ok(permissions) => permissions,
                Err(e) => {
                    warn!(
                        member_id = %identity.id,
                        role_id = %binding.role_id,
                        error = %e,
                        "Skipping role whose permissions could not be loaded"
                    );
                    continue;
                }
            };
            if permissions.iter().any(|p| p.grants(feature, action)) {
                debug!(
                    member_id = %identity.id,
                    role_id = %binding.role_id,
                    feature = feature.as_str(),
                    action = action.as_str(),
                    "Permission granted"
                );
                return Ok(());
            }
        }

        Err(deny("permission denied"))
    }

    async fn active_assignment(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
        missing_reason: &str,
    ) -> GateResult<OperatorAssignment> {
        let assignment = match self.assignments.get(tenant_id, operator_id).await {
            Ok(assignment) => assignment,
            Err(GateError::NotFound { .. }) => return Err(deny(missing_reason)),
            Err(e) => return Err(e),
        };
        if !assignment.is_active() {
            return Err(deny("operator assignment is not active"));
        }
        Ok(assignment)
    }
}

fn deny(reason: &str) -> GateError {
    AuthError::AccessDenied(reason.to_string()).into()
}
