//! SQLite repository implementations.

mod member;
mod operator;
mod provisioning;
mod role;
mod tenant;

use std::str::FromStr;

use sqlx::SqlitePool;
use tenantgate_core::models::ParseEnumError;
use tenantgate_core::repository::Repositories;
use uuid::Uuid;

pub use member::SqliteMemberRepository;
pub use operator::{SqliteOperatorAssignmentRepository, SqliteOperatorRepository};
pub use provisioning::SqliteProvisioningRepository;
pub use role::SqliteRoleRepository;
pub use tenant::SqliteTenantRepository;

use crate::error::DbError;

fn parse_uuid(value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid UUID {value:?}: {e}")))
}

fn parse_enum<T>(value: &str) -> Result<T, DbError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.parse().map_err(|e: ParseEnumError| DbError::Decode(e.to_string()))
}

fn parse_json(value: &str) -> Result<serde_json::Value, DbError> {
    serde_json::from_str(value).map_err(|e| DbError::Decode(format!("invalid JSON: {e}")))
}

/// Every repository over one shared pool.
#[derive(Clone)]
pub struct SqliteRepositories {
    tenants: SqliteTenantRepository,
    operators: SqliteOperatorRepository,
    assignments: SqliteOperatorAssignmentRepository,
    members: SqliteMemberRepository,
    roles: SqliteRoleRepository,
    provisioning: SqliteProvisioningRepository,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tenants: SqliteTenantRepository::new(pool.clone()),
            operators: SqliteOperatorRepository::new(pool.clone()),
            assignments: SqliteOperatorAssignmentRepository::new(pool.clone()),
            members: SqliteMemberRepository::new(pool.clone()),
            roles: SqliteRoleRepository::new(pool.clone()),
            provisioning: SqliteProvisioningRepository::new(pool),
        }
    }
}

impl Repositories for SqliteRepositories {
    type Tenants = SqliteTenantRepository;
    type Operators = SqliteOperatorRepository;
    type Assignments = SqliteOperatorAssignmentRepository;
    type Members = SqliteMemberRepository;
    type Roles = SqliteRoleRepository;
    type Provisioning = SqliteProvisioningRepository;

    fn tenants(&self) -> &Self::Tenants {
        &self.tenants
    }

    fn operators(&self) -> &Self::Operators {
        &self.operators
    }

    fn assignments(&self) -> &Self::Assignments {
        &self.assignments
    }

    fn members(&self) -> &Self::Members {
        &self.members
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }

    fn provisioning(&self) -> &Self::Provisioning {
        &self.provisioning
    }
}
