//! SQLite implementation of [`ProvisioningRepository`].
//!
//! Each operation runs inside one transaction. The transaction is rolled
//! back when dropped without commit, so any `?` exit leaves no rows.

use sqlx::SqlitePool;
use tenantgate_core::error::GateResult;
use tenantgate_core::models::member::{CreateMember, Member};
use tenantgate_core::models::tenant::{ProvisionTenant, ProvisionedTenant};
use tenantgate_core::repository::ProvisioningRepository;
use tenantgate_core::seed::{self, SYSTEM_ADMIN};
use tracing::{debug, info};

use super::member::insert_member;
use super::role::{insert_binding, insert_seed_role, role_id_by_code};
use super::tenant::insert_tenant;
use crate::error::DbError;

#[derive(Clone)]
pub struct SqliteProvisioningRepository {
    pool: SqlitePool,
}

impl SqliteProvisioningRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn provision(&self, input: ProvisionTenant) -> Result<ProvisionedTenant, DbError> {
        let mut tx = self.pool.begin().await?;

        let tenant = insert_tenant(&mut *tx, input.tenant).await?;

        let mut admin_role = None;
        for seed_role in seed::system_roles() {
            let role = insert_seed_role(&mut *tx, tenant.id, &seed_role).await?;
            debug!(
                tenant_id = %tenant.id,
                role = %role.code,
                permissions = seed_role.grants.len(),
                "Seeded system role"
            );
            if role.code == SYSTEM_ADMIN {
                admin_role = Some(role.id);
            }
        }
        let admin_role =
            admin_role.ok_or_else(|| DbError::not_found("role", format!("code={SYSTEM_ADMIN}")))?;

        let admin = insert_member(
            &mut *tx,
            CreateMember {
                id: input.admin.id,
                tenant_id: tenant.id,
                email: input.admin.email,
                first_name: input.admin.first_name,
                last_name: input.admin.last_name,
                department: None,
                position: None,
            },
        )
        .await?;
        insert_binding(&mut *tx, tenant.id, admin.id, admin_role).await?;

        tx.commit().await?;

        info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            admin_id = %admin.id,
            "Tenant provisioned"
        );

        Ok(ProvisionedTenant { tenant, admin })
    }

    async fn member_with_role(&self, input: CreateMember, role_code: &str) -> Result<Member, DbError> {
        let mut tx = self.pool.begin().await?;

        let role_id = role_id_by_code(&mut *tx, input.tenant_id, role_code).await?;
        let member = insert_member(&mut *tx, input).await?;
        insert_binding(&mut *tx, member.tenant_id, member.id, role_id).await?;

        tx.commit().await?;
        Ok(member)
    }
}

impl ProvisioningRepository for SqliteProvisioningRepository {
    async fn provision_tenant(&self, input: ProvisionTenant) -> GateResult<ProvisionedTenant> {
        Ok(self.provision(input).await?)
    }

    async fn create_member(&self, input: CreateMember, role_code: &str) -> GateResult<Member> {
        Ok(self.member_with_role(input, role_code).await?)
    }
}
