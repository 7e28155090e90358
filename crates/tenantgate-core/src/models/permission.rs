//! Feature/action permission model.
//!
//! The feature set is closed. Role permissions are plain
//! `(feature, action, granted)` rows with no conditional payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SystemSettings,
    Contracts,
    Quotes,
    Invoices,
    Partners,
    Users,
    Workflows,
    Approvals,
    Documents,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::SystemSettings,
        Feature::Contracts,
        Feature::Quotes,
        Feature::Invoices,
        Feature::Partners,
        Feature::Users,
        Feature::Workflows,
        Feature::Approvals,
        Feature::Documents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::SystemSettings => "system_settings",
            Feature::Contracts => "contracts",
            Feature::Quotes => "quotes",
            Feature::Invoices => "invoices",
            Feature::Partners => "partners",
            Feature::Users => "users",
            Feature::Workflows => "workflows",
            Feature::Approvals => "approvals",
            Feature::Documents => "documents",
        }
    }
}

impl FromStr for Feature {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("feature", s))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Read,
    Write,
    Delete,
    Approve,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Write, Action::Delete, Action::Approve];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "READ",
            Action::Write => "WRITE",
            Action::Delete => "DELETE",
            Action::Approve => "APPROVE",
        }
    }
}

impl FromStr for Action {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("action", s))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolePermission {
    pub role_id: Uuid,
    pub feature: Feature,
    pub action: Action,
    pub granted: bool,
}

impl RolePermission {
    /// True when this row grants exactly `(feature, action)`.
    pub fn grants(&self, feature: Feature, action: Action) -> bool {
        self.granted && self.feature == feature && self.action == action
    }
}
