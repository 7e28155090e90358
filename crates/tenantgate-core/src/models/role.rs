//! Tenant-scoped roles and member bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Stable identifier, unique within the tenant (e.g. `system_admin`).
    pub code: String,
    pub name: String,
    pub description: String,
    /// System roles are seeded at tenant creation and cannot be deleted.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberRoleBinding {
    pub tenant_id: Uuid,
    pub member_id: Uuid,
    pub role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}
