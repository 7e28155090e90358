//! SQLite implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tenantgate_core::error::GateResult;
use tenantgate_core::models::permission::{Action, Feature, RolePermission};
use tenantgate_core::models::role::{MemberRoleBinding, Role};
use tenantgate_core::repository::RoleRepository;
use tenantgate_core::seed::SeedRole;
use uuid::Uuid;

use super::{parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, FromRow)]
struct RoleRow {
    id: String,
    tenant_id: String,
    code: String,
    name: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self) -> Result<Role, DbError> {
        Ok(Role {
            id: parse_uuid(&self.id)?,
            tenant_id: parse_uuid(&self.tenant_id)?,
            code: self.code,
            name: self.name,
            description: self.description,
            is_system: self.is_system,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BindingRow {
    tenant_id: String,
    member_id: String,
    role_id: String,
    assigned_at: DateTime<Utc>,
}

impl BindingRow {
    fn try_into_binding(self) -> Result<MemberRoleBinding, DbError> {
        Ok(MemberRoleBinding {
            tenant_id: parse_uuid(&self.tenant_id)?,
            member_id: parse_uuid(&self.member_id)?,
            role_id: parse_uuid(&self.role_id)?,
            assigned_at: self.assigned_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    role_id: String,
    feature: String,
    action: String,
    granted: bool,
}

impl PermissionRow {
    fn try_into_permission(self) -> Result<RolePermission, DbError> {
        Ok(RolePermission {
            role_id: parse_uuid(&self.role_id)?,
            feature: parse_enum::<Feature>(&self.feature)?,
            action: parse_enum::<Action>(&self.action)?,
            granted: self.granted,
        })
    }
}

/// Write one seeded system role and all of its permission rows.
pub(crate) async fn insert_seed_role(
    conn: &mut sqlx::SqliteConnection,
    tenant_id: Uuid,
    seed: &SeedRole,
) -> Result<Role, DbError> {
    let role = Role {
        id: Uuid::new_v4(),
        tenant_id,
        code: seed.code.to_string(),
        name: seed.name.to_string(),
        description: seed.description.to_string(),
        is_system: true,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO roles (id, tenant_id, code, name, description, is_system, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(role.id.to_string())
    .bind(tenant_id.to_string())
    .bind(&role.code)
    .bind(&role.name)
    .bind(&role.description)
    .bind(role.is_system)
    .bind(role.created_at)
    .execute(&mut *conn)
    .await?;

    for (feature, action) in &seed.grants {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, feature, action, granted) \
             VALUES (?, ?, ?, 1)",
        )
        .bind(role.id.to_string())
        .bind(feature.as_str())
        .bind(action.as_str())
        .execute(&mut *conn)
        .await?;
    }

    Ok(role)
}

pub(crate) async fn insert_binding<'e, E>(
    executor: E,
    tenant_id: Uuid,
    member_id: Uuid,
    role_id: Uuid,
) -> Result<MemberRoleBinding, DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let binding = MemberRoleBinding {
        tenant_id,
        member_id,
        role_id,
        assigned_at: Utc::now(),
    };

    // Role and member must both belong to the binding's tenant.
    let result = sqlx::query(
        "INSERT INTO member_role_bindings (tenant_id, member_id, role_id, assigned_at) \
         SELECT r.tenant_id, m.id, r.id, ? FROM roles r \
         JOIN members m ON m.tenant_id = r.tenant_id \
         WHERE r.id = ? AND r.tenant_id = ? AND m.id = ? AND m.deleted_at IS NULL",
    )
    .bind(binding.assigned_at)
    .bind(role_id.to_string())
    .bind(tenant_id.to_string())
    .bind(member_id.to_string())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(
            "role_binding",
            format!("tenant={tenant_id},member={member_id},role={role_id}"),
        ));
    }
    Ok(binding)
}

pub(crate) async fn role_id_by_code<'e, E>(
    executor: E,
    tenant_id: Uuid,
    code: &str,
) -> Result<Uuid, DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let id: Option<String> =
        sqlx::query_scalar("SELECT id FROM roles WHERE tenant_id = ? AND code = ?")
            .bind(tenant_id.to_string())
            .bind(code)
            .fetch_optional(executor)
            .await?;
    let id = id.ok_or_else(|| DbError::not_found("role", format!("code={code}")))?;
    parse_uuid(&id)
}

/// SQLite implementation of the Role repository.
#[derive(Clone)]
pub struct SqliteRoleRepository {
    pool: SqlitePool,
}

impl SqliteRoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoleRepository for SqliteRoleRepository {
    async fn get_by_code(&self, tenant_id: Uuid, code: &str) -> GateResult<Role> {
        let row: Option<RoleRow> = sqlx::query_as(
            "SELECT id, tenant_id, code, name, description, is_system, created_at \
             FROM roles WHERE tenant_id = ? AND code = ?",
        )
        .bind(tenant_id.to_string())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DbError::not_found("role", format!("code={code}")))?;
        Ok(row.try_into_role()?)
    }

    async fn list(&self, tenant_id: Uuid) -> GateResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            "SELECT id, tenant_id, code, name, description, is_system, created_at \
             FROM roles WHERE tenant_id = ? ORDER BY created_at ASC, code ASC",
        )
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(RoleRow::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_member_bindings(
        &self,
        tenant_id: Uuid,
        member_id: Uuid,
    ) -> GateResult<Vec<MemberRoleBinding>> {
        let rows: Vec<BindingRow> = sqlx::query_as(
            "SELECT tenant_id, member_id, role_id, assigned_at \
             FROM member_role_bindings \
             WHERE tenant_id = ? AND member_id = ? \
             ORDER BY assigned_at ASC",
        )
        .bind(tenant_id.to_string())
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(BindingRow::try_into_binding)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_permissions(&self, role_id: Uuid) -> GateResult<Vec<RolePermission>> {
        let rows: Vec<PermissionRow> = sqlx::query_as(
            "SELECT role_id, feature, action, granted \
             FROM role_permissions WHERE role_id = ? \
             ORDER BY feature ASC, action ASC",
        )
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(PermissionRow::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn bind_member(
        &self,
        tenant_id: Uuid,
        member_id: Uuid,
        role_id: Uuid,
    ) -> GateResult<MemberRoleBinding> {
        Ok(insert_binding(&self.pool, tenant_id, member_id, role_id).await?)
    }
}
