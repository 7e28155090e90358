//! Maps a verified credential subject onto an operator or member
//! identity.

use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::identity::{Identity, IdentityKind};
use tenantgate_core::models::operator::OperatorAssignment;
use tenantgate_core::repository::{
    MemberRepository, OperatorAssignmentRepository, OperatorRepository,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

/// Resolves credential subjects to identities.
///
/// Generic over repository implementations so that the auth layer has no
/// dependency on the database crate.
#[derive(Clone)]
pub struct IdentityResolver<O, A, M>
where
    O: OperatorRepository,
    A: OperatorAssignmentRepository,
    M: MemberRepository,
{
    operators: O,
    assignments: A,
    members: M,
}

impl<O, A, M> IdentityResolver<O, A, M>
where
    O: OperatorRepository,
    A: OperatorAssignmentRepository,
    M: MemberRepository,
{
    pub fn new(operators: O, assignments: A, members: M) -> Self {
        Self {
            operators,
            assignments,
            members,
        }
    }

    /// Resolve `subject` to an identity.
    ///
    /// Operators take precedence over members. Lookup failures other than
    /// not-found are returned as-is.
    pub async fn resolve(&self, subject: &str) -> GateResult<Identity> {
        let id = Uuid::parse_str(subject)
            .map_err(|_| AuthError::InvalidSubject(subject.to_string()))?;

        match self.operators.get_by_id(id).await {
            Ok(operator) => {
                let assignments = self.assignments.list_by_operator(id).await?;
                let effective_tenant_id = select_assignment(&assignments).map(|a| a.tenant_id);
                debug!(
                    operator_id = %id,
                    assignments = assignments.len(),
                    effective_tenant_id = ?effective_tenant_id,
                    "Resolved operator identity"
                );
                return Ok(Identity {
                    id,
                    kind: IdentityKind::Operator,
                    email: operator.email,
                    effective_tenant_id,
                });
            }
            Err(GateError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        match self.members.get_by_id(id).await {
            Ok(member) => {
                debug!(member_id = %id, tenant_id = %member.tenant_id, "Resolved member identity");
                Ok(Identity {
                    id,
                    kind: IdentityKind::Member,
                    email: member.email,
                    effective_tenant_id: Some(member.tenant_id),
                })
            }
            Err(GateError::NotFound { .. }) => Err(GateError::not_found("user", id)),
            Err(e) => Err(e),
        }
    }
}

/// The active assignment that decides an operator's effective tenant:
/// earliest `assigned_at`, then lowest tenant id.
pub fn select_assignment(assignments: &[OperatorAssignment]) -> Option<&OperatorAssignment> {
    assignments
        .iter()
        .filter(|a| a.is_active())
        .min_by_key(|a| (a.assigned_at, a.tenant_id))
}
