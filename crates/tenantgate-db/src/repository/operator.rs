//! SQLite implementations of [`OperatorRepository`] and
//! [`OperatorAssignmentRepository`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::operator::{
    AssignmentStatus, CreateOperator, CreateOperatorAssignment, Operator, OperatorAssignment,
    OperatorRole, OperatorStatus,
};
use tenantgate_core::repository::{OperatorAssignmentRepository, OperatorRepository};
use uuid::Uuid;

use super::{parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, FromRow)]
struct OperatorRow {
    id: String,
    email: String,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl OperatorRow {
    fn try_into_operator(self) -> Result<Operator, DbError> {
        Ok(Operator {
            id: parse_uuid(&self.id)?,
            email: self.email,
            name: self.name,
            status: parse_enum::<OperatorStatus>(&self.status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    tenant_id: String,
    operator_id: String,
    role: String,
    status: String,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn try_into_assignment(self) -> Result<OperatorAssignment, DbError> {
        Ok(OperatorAssignment {
            tenant_id: parse_uuid(&self.tenant_id)?,
            operator_id: parse_uuid(&self.operator_id)?,
            role: parse_enum::<OperatorRole>(&self.role)?,
            status: parse_enum::<AssignmentStatus>(&self.status)?,
            assigned_at: self.assigned_at,
        })
    }
}

/// SQLite implementation of the Operator repository.
#[derive(Clone)]
pub struct SqliteOperatorRepository {
    pool: SqlitePool,
}

impl SqliteOperatorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl OperatorRepository for SqliteOperatorRepository {
    async fn create(&self, input: CreateOperator) -> GateResult<Operator> {
        let operator = Operator {
            id: input.id,
            email: input.email,
            name: input.name,
            status: OperatorStatus::Active,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO operators (id, email, name, status, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(operator.id.to_string())
        .bind(&operator.email)
        .bind(&operator.name)
        .bind(operator.status.as_str())
        .bind(operator.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(operator)
    }

    async fn get_by_id(&self, id: Uuid) -> GateResult<Operator> {
        let row: Option<OperatorRow> = sqlx::query_as(
            "SELECT id, email, name, status, created_at FROM operators WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DbError::not_found("operator", id))?;
        Ok(row.try_into_operator()?)
    }
}

/// SQLite implementation of the OperatorAssignment repository.
#[derive(Clone)]
pub struct SqliteOperatorAssignmentRepository {
    pool: SqlitePool,
}

impl SqliteOperatorAssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &str, value: Uuid) -> GateResult<Vec<OperatorAssignment>> {
        let query = format!(
            "SELECT tenant_id, operator_id, role, status, assigned_at \
             FROM operator_assignments \
             WHERE {column} = ? AND deleted_at IS NULL \
             ORDER BY assigned_at ASC, tenant_id ASC"
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&query)
            .bind(value.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(AssignmentRow::try_into_assignment)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}

impl OperatorAssignmentRepository for SqliteOperatorAssignmentRepository {
    async fn create(&self, input: CreateOperatorAssignment) -> GateResult<OperatorAssignment> {
        let assignment = OperatorAssignment {
            tenant_id: input.tenant_id,
            operator_id: input.operator_id,
            role: input.role,
            status: input.status,
            assigned_at: input.assigned_at.unwrap_or_else(Utc::now),
        };

        // A soft-deleted assignment for the same pair is revived in place.
        let result = sqlx::query(
            "INSERT INTO operator_assignments \
             (tenant_id, operator_id, role, status, assigned_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (tenant_id, operator_id) DO UPDATE SET \
             role = excluded.role, status = excluded.status, \
             assigned_at = excluded.assigned_at, deleted_at = NULL \
             WHERE operator_assignments.deleted_at IS NOT NULL",
        )
        .bind(assignment.tenant_id.to_string())
        .bind(assignment.operator_id.to_string())
        .bind(assignment.role.as_str())
        .bind(assignment.status.as_str())
        .bind(assignment.assigned_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(GateError::already_exists(
                "operator_assignment",
                format!(
                    "tenant={},operator={}",
                    assignment.tenant_id, assignment.operator_id
                ),
            ));
        }
        Ok(assignment)
    }

    async fn get(&self, tenant_id: Uuid, operator_id: Uuid) -> GateResult<OperatorAssignment> {
        let row: Option<AssignmentRow> = sqlx::query_as(
            "SELECT tenant_id, operator_id, role, status, assigned_at \
             FROM operator_assignments \
             WHERE tenant_id = ? AND operator_id = ? AND deleted_at IS NULL",
        )
        .bind(tenant_id.to_string())
        .bind(operator_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = row.ok_or_else(|| {
            DbError::not_found(
                "operator_assignment",
                format!("tenant={tenant_id},operator={operator_id}"),
            )
        })?;
        Ok(row.try_into_assignment()?)
    }

    async fn list_by_operator(&self, operator_id: Uuid) -> GateResult<Vec<OperatorAssignment>> {
        self.list_where("operator_id", operator_id).await
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> GateResult<Vec<OperatorAssignment>> {
        self.list_where("tenant_id", tenant_id).await
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        operator_id: Uuid,
        status: AssignmentStatus,
    ) -> GateResult<OperatorAssignment> {
        let result = sqlx::query(
            "UPDATE operator_assignments SET status = ? \
             WHERE tenant_id = ? AND operator_id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(tenant_id.to_string())
        .bind(operator_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "operator_assignment",
                format!("tenant={tenant_id},operator={operator_id}"),
            )
            .into());
        }
        self.get(tenant_id, operator_id).await
    }

    async fn soft_delete(&self, tenant_id: Uuid, operator_id: Uuid) -> GateResult<()> {
        let result = sqlx::query(
            "UPDATE operator_assignments SET deleted_at = ? \
             WHERE tenant_id = ? AND operator_id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(tenant_id.to_string())
        .bind(operator_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "operator_assignment",
                format!("tenant={tenant_id},operator={operator_id}"),
            )
            .into());
        }
        Ok(())
    }
}
