//! Resolved caller identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Operator,
    Member,
}

impl IdentityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityKind::Operator => "operator",
            IdentityKind::Member => "member",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller as seen by access control. Built from storage on every
/// request and never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub kind: IdentityKind,
    pub email: String,
    /// For members, the bound tenant. For operators, the tenant of the
    /// selected active assignment, or `None` when there is none.
    pub effective_tenant_id: Option<Uuid>,
}

impl Identity {
    /// This identity acting on `tenant_id` for one request.
    ///
    /// Only valid once access to `tenant_id` has been validated: for an
    /// operator that means an ACTIVE assignment to it, for a member it is
    /// already the bound tenant.
    pub fn scoped_to(mut self, tenant_id: Uuid) -> Self {
        self.effective_tenant_id = Some(tenant_id);
        self
    }
}
