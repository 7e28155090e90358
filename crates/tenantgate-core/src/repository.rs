//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups that miss return
//! [`GateError::NotFound`](crate::error::GateError::NotFound); every other
//! storage failure is a `Database` error carrying its transience.
//! Soft-deleted records are invisible to every lookup.

use uuid::Uuid;

use crate::error::GateResult;
use crate::models::{
    member::{CreateMember, Member, UpdateMember},
    operator::{
        AssignmentStatus, CreateOperator, CreateOperatorAssignment, Operator, OperatorAssignment,
    },
    permission::RolePermission,
    role::{MemberRoleBinding, Role},
    tenant::{CreateTenant, ProvisionTenant, ProvisionedTenant, Tenant, TenantStatus},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Global scope
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Insert a bare tenant row. Provisioning goes through
    /// [`ProvisioningRepository::provision_tenant`] instead.
    fn create(&self, input: CreateTenant) -> impl Future<Output = GateResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GateResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = GateResult<Tenant>> + Send;
    fn get_by_company_code(&self, code: &str)
    -> impl Future<Output = GateResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GateResult<PaginatedResult<Tenant>>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> impl Future<Output = GateResult<Tenant>> + Send;
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = GateResult<()>> + Send;
}

pub trait OperatorRepository: Send + Sync {
    fn create(&self, input: CreateOperator) -> impl Future<Output = GateResult<Operator>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GateResult<Operator>> + Send;
}

pub trait OperatorAssignmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOperatorAssignment,
    ) -> impl Future<Output = GateResult<OperatorAssignment>> + Send;
    fn get(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
    ) -> impl Future<Output = GateResult<OperatorAssignment>> + Send;
    /// All assignments of an operator across tenants, in any status.
    fn list_by_operator(
        &self,
        operator_id: Uuid,
    ) -> impl Future<Output = GateResult<Vec<OperatorAssignment>>> + Send;
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GateResult<Vec<OperatorAssignment>>> + Send;
    fn update_status(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
        status: AssignmentStatus,
    ) -> impl Future<Output = GateResult<OperatorAssignment>> + Send;
    fn soft_delete(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
    ) -> impl Future<Output = GateResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait MemberRepository: Send + Sync {
    /// Global lookup by primary key, without a tenant filter.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GateResult<Member>> + Send;
    fn get_in_tenant(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GateResult<Member>> + Send;
    fn get_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> impl Future<Output = GateResult<Member>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GateResult<PaginatedResult<Member>>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateMember,
    ) -> impl Future<Output = GateResult<Member>> + Send;
    fn soft_delete(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        deleted_by: Uuid,
    ) -> impl Future<Output = GateResult<()>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn get_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> impl Future<Output = GateResult<Role>> + Send;
    fn list(&self, tenant_id: Uuid) -> impl Future<Output = GateResult<Vec<Role>>> + Send;
    fn list_member_bindings(
        &self,
        tenant_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = GateResult<Vec<MemberRoleBinding>>> + Send;
    fn list_permissions(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = GateResult<Vec<RolePermission>>> + Send;
    fn bind_member(
        &self,
        tenant_id: Uuid,
        member_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = GateResult<MemberRoleBinding>> + Send;
}

/// Multi-row writes that must commit or roll back as one unit.
pub trait ProvisioningRepository: Send + Sync {
    /// Tenant row, the canonical system roles with their permissions, the
    /// admin member and its `system_admin` binding.
    fn provision_tenant(
        &self,
        input: ProvisionTenant,
    ) -> impl Future<Output = GateResult<ProvisionedTenant>> + Send;

    /// Member row plus a binding to the tenant role identified by
    /// `role_code`.
    fn create_member(
        &self,
        input: CreateMember,
        role_code: &str,
    ) -> impl Future<Output = GateResult<Member>> + Send;
}

/// One handle per repository, all backed by the same store.
pub trait Repositories: Send + Sync {
    type Tenants: TenantRepository + Clone + 'static;
    type Operators: OperatorRepository + Clone + 'static;
    type Assignments: OperatorAssignmentRepository + Clone + 'static;
    type Members: MemberRepository + Clone + 'static;
    type Roles: RoleRepository + Clone + 'static;
    type Provisioning: ProvisioningRepository + Clone + 'static;

    fn tenants(&self) -> &Self::Tenants;
    fn operators(&self) -> &Self::Operators;
    fn assignments(&self) -> &Self::Assignments;
    fn members(&self) -> &Self::Members;
    fn roles(&self) -> &Self::Roles;
    fn provisioning(&self) -> &Self::Provisioning;
}
