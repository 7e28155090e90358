//! Operator domain model.
//!
//! Operators are platform-side principals. They act on behalf of tenants
//! through explicit, role-carrying assignments.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorStatus {
    Active,
    Inactive,
}

impl OperatorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorStatus::Active => "ACTIVE",
            OperatorStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for OperatorStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(OperatorStatus::Active),
            "INACTIVE" => Ok(OperatorStatus::Inactive),
            other => Err(ParseEnumError::new("operator status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operator {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: OperatorStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperator {
    /// Account id issued by the identity provider.
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Role an operator holds within one tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorRole {
    Admin,
    Operator,
    Viewer,
}

impl OperatorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorRole::Admin => "ADMIN",
            OperatorRole::Operator => "OPERATOR",
            OperatorRole::Viewer => "VIEWER",
        }
    }
}

impl FromStr for OperatorRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(OperatorRole::Admin),
            "OPERATOR" => Ok(OperatorRole::Operator),
            "VIEWER" => Ok(OperatorRole::Viewer),
            other => Err(ParseEnumError::new("operator role", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "ACTIVE",
            AssignmentStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AssignmentStatus::Active),
            "INACTIVE" => Ok(AssignmentStatus::Inactive),
            other => Err(ParseEnumError::new("assignment status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatorAssignment {
    pub tenant_id: Uuid,
    pub operator_id: Uuid,
    pub role: OperatorRole,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
}

impl OperatorAssignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperatorAssignment {
    pub tenant_id: Uuid,
    pub operator_id: Uuid,
    pub role: OperatorRole,
    pub status: AssignmentStatus,
    /// Defaults to now. Backfilled assignments keep their original time.
    pub assigned_at: Option<DateTime<Utc>>,
}
