//! SQLite implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tenantgate_core::error::GateResult;
use tenantgate_core::models::tenant::{
    CreateTenant, DEFAULT_E_SIGN_MODE, DEFAULT_RETENTION_MONTHS, Tenant, TenantStatus,
};
use tenantgate_core::repository::{PaginatedResult, Pagination, TenantRepository};
use uuid::Uuid;

use super::{parse_enum, parse_json, parse_uuid};
use crate::error::DbError;

pub(crate) const TENANT_COLUMNS: &str = "id, slug, name, company_code, e_sign_mode, \
     retention_default_months, settings, status, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct TenantRow {
    id: String,
    slug: String,
    name: String,
    company_code: Option<String>,
    e_sign_mode: String,
    retention_default_months: i32,
    settings: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    pub(crate) fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid(&self.id)?,
            slug: self.slug,
            name: self.name,
            company_code: self.company_code,
            e_sign_mode: self.e_sign_mode,
            retention_default_months: self.retention_default_months,
            settings: parse_json(&self.settings)?,
            status: parse_enum::<TenantStatus>(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert a tenant row on any executor, so provisioning can reuse it
/// inside its transaction.
pub(crate) async fn insert_tenant<'e, E>(executor: E, input: CreateTenant) -> Result<Tenant, DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = Utc::now();
    let tenant = Tenant {
        id: Uuid::new_v4(),
        slug: input.slug,
        name: input.name,
        company_code: input.company_code.filter(|c| !c.is_empty()),
        e_sign_mode: input
            .e_sign_mode
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_E_SIGN_MODE.to_string()),
        retention_default_months: input
            .retention_default_months
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_RETENTION_MONTHS),
        settings: input
            .settings
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        status: TenantStatus::Active,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO tenants (id, slug, name, company_code, e_sign_mode, \
         retention_default_months, settings, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tenant.id.to_string())
    .bind(&tenant.slug)
    .bind(&tenant.name)
    .bind(&tenant.company_code)
    .bind(&tenant.e_sign_mode)
    .bind(tenant.retention_default_months)
    .bind(tenant.settings.to_string())
    .bind(tenant.status.as_str())
    .bind(tenant.created_at)
    .bind(tenant.updated_at)
    .execute(executor)
    .await?;

    Ok(tenant)
}

/// SQLite implementation of the Tenant repository.
#[derive(Clone)]
pub struct SqliteTenantRepository {
    pool: SqlitePool,
}

impl SqliteTenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str, id: &str) -> GateResult<Tenant> {
        let query = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE {clause} = ? AND deleted_at IS NULL"
        );
        let row: Option<TenantRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        let row = row.ok_or_else(|| DbError::not_found("tenant", id))?;
        Ok(row.try_into_tenant()?)
    }
}

impl TenantRepository for SqliteTenantRepository {
    async fn create(&self, input: CreateTenant) -> GateResult<Tenant> {
        Ok(insert_tenant(&self.pool, input).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> GateResult<Tenant> {
        let id = id.to_string();
        self.fetch_one_where("id", &id, &id).await
    }

    async fn get_by_slug(&self, slug: &str) -> GateResult<Tenant> {
        self.fetch_one_where("slug", slug, &format!("slug={slug}"))
            .await
    }

    async fn get_by_company_code(&self, code: &str) -> GateResult<Tenant> {
        self.fetch_one_where("company_code", code, &format!("company_code={code}"))
            .await
    }

    async fn list(&self, pagination: Pagination) -> GateResult<PaginatedResult<Tenant>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::from)?;

        let query = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
        );
        let rows: Vec<TenantRow> = sqlx::query_as(&query)
            .bind(pagination.limit as i64)
            .bind(pagination.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(TenantRow::try_into_tenant)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total as u64,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_status(&self, id: Uuid, status: TenantStatus) -> GateResult<Tenant> {
        let result = sqlx::query(
            "UPDATE tenants SET status = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("tenant", id).into());
        }
        self.get_by_id(id).await
    }

    async fn soft_delete(&self, id: Uuid) -> GateResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE tenants SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("tenant", id).into());
        }
        Ok(())
    }
}
