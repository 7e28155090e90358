//! SQLite implementation of [`MemberRepository`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::member::{CreateMember, Member, MemberStatus, UpdateMember};
use tenantgate_core::repository::{MemberRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{parse_enum, parse_json, parse_uuid};
use crate::error::DbError;

const MEMBER_COLUMNS: &str = "id, tenant_id, email, first_name, last_name, department, \
     position, settings, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct MemberRow {
    id: String,
    tenant_id: String,
    email: String,
    first_name: String,
    last_name: String,
    department: Option<String>,
    position: Option<String>,
    settings: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_member(self) -> Result<Member, DbError> {
        Ok(Member {
            id: parse_uuid(&self.id)?,
            tenant_id: parse_uuid(&self.tenant_id)?,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            position: self.position,
            settings: parse_json(&self.settings)?,
            status: parse_enum::<MemberStatus>(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert an active member on any executor.
pub(crate) async fn insert_member<'e, E>(executor: E, input: CreateMember) -> Result<Member, DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = Utc::now();
    let member = Member {
        id: input.id,
        tenant_id: input.tenant_id,
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        department: input.department.filter(|d| !d.is_empty()),
        position: input.position.filter(|p| !p.is_empty()),
        settings: serde_json::Value::Object(Default::default()),
        status: MemberStatus::Active,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO members (id, tenant_id, email, first_name, last_name, department, \
         position, settings, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(member.id.to_string())
    .bind(member.tenant_id.to_string())
    .bind(&member.email)
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(&member.department)
    .bind(&member.position)
    .bind(member.settings.to_string())
    .bind(member.status.as_str())
    .bind(member.created_at)
    .bind(member.updated_at)
    .execute(executor)
    .await?;

    Ok(member)
}

/// SQLite implementation of the Member repository.
#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MemberRepository for SqliteMemberRepository {
    async fn get_by_id(&self, id: Uuid) -> GateResult<Member> {
        let query =
            format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ? AND deleted_at IS NULL");
        let row: Option<MemberRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DbError::not_found("user", id))?;
        Ok(row.try_into_member()?)
    }

    async fn get_in_tenant(&self, tenant_id: Uuid, id: Uuid) -> GateResult<Member> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE tenant_id = ? AND id = ? AND deleted_at IS NULL"
        );
        let row: Option<MemberRow> = sqlx::query_as(&query)
            .bind(tenant_id.to_string())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DbError::not_found("user", id))?;
        Ok(row.try_into_member()?)
    }

    async fn get_by_email(&self, tenant_id: Uuid, email: &str) -> GateResult<Member> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE tenant_id = ? AND email = ? AND deleted_at IS NULL"
        );
        let row: Option<MemberRow> = sqlx::query_as(&query)
            .bind(tenant_id.to_string())
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DbError::not_found("user", format!("email={email}")))?;
        Ok(row.try_into_member()?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> GateResult<PaginatedResult<Member>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM members WHERE tenant_id = ? AND deleted_at IS NULL",
        )
        .bind(tenant_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE tenant_id = ? AND deleted_at IS NULL \
             ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
        );
        let rows: Vec<MemberRow> = sqlx::query_as(&query)
            .bind(tenant_id.to_string())
            .bind(pagination.limit as i64)
            .bind(pagination.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(MemberRow::try_into_member)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total as u64,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateMember) -> GateResult<Member> {
        let mut member = self.get_in_tenant(tenant_id, id).await?;

        if let Some(email) = input.email {
            member.email = email;
        }
        if let Some(first_name) = input.first_name {
            member.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            member.last_name = last_name;
        }
        if let Some(department) = input.department {
            member.department = department.filter(|d| !d.is_empty());
        }
        if let Some(position) = input.position {
            member.position = position.filter(|p| !p.is_empty());
        }
        if let Some(status) = input.status {
            member.status = status;
        }
        member.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE members SET email = ?, first_name = ?, last_name = ?, \
             department = ?, position = ?, status = ?, updated_at = ? \
             WHERE tenant_id = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(&member.email)
        .bind(&member.first_name)
        .bind(&member.last_name)
        .bind(&member.department)
        .bind(&member.position)
        .bind(member.status.as_str())
        .bind(member.updated_at)
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(GateError::not_found("user", id));
        }
        Ok(member)
    }

    async fn soft_delete(&self, tenant_id: Uuid, id: Uuid, deleted_by: Uuid) -> GateResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE members SET deleted_at = ?, deleted_by = ?, updated_at = ? \
             WHERE tenant_id = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(deleted_by.to_string())
        .bind(now)
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(GateError::not_found("user", id));
        }
        Ok(())
    }
}
