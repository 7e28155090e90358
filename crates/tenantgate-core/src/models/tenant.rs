//! Tenant domain model.
//!
//! A tenant is an isolated customer organization. Roles, members and all
//! business data are scoped to exactly one tenant.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;
use super::member::Member;

pub const DEFAULT_E_SIGN_MODE: &str = "WITNESS_OTP";
pub const DEFAULT_RETENTION_MONTHS: i32 = 84;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Inactive,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Inactive => "INACTIVE",
            TenantStatus::Suspended => "SUSPENDED",
        }
    }
}

impl FromStr for TenantStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(TenantStatus::Active),
            "INACTIVE" => Ok(TenantStatus::Inactive),
            "SUSPENDED" => Ok(TenantStatus::Suspended),
            other => Err(ParseEnumError::new("tenant status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: Uuid,
    /// Subdomain label, unique across all tenants.
    pub slug: String,
    pub name: String,
    pub company_code: Option<String>,
    pub e_sign_mode: String,
    pub retention_default_months: i32,
    pub settings: serde_json::Value,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Fields required to create a new tenant. Unset optionals take the
/// signup defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub company_code: Option<String>,
    pub e_sign_mode: Option<String>,
    pub retention_default_months: Option<i32>,
    pub settings: Option<serde_json::Value>,
}

/// The initial administrator written alongside a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionAdmin {
    /// Account id issued by the identity provider.
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Everything written by a single tenant provisioning unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionTenant {
    pub tenant: CreateTenant,
    pub admin: ProvisionAdmin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: Member,
}
