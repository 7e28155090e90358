//! Audit record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::IdentityKind;
use crate::error::OutcomeCode;

/// One record per request that entered the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub request_id: Option<String>,
    pub identity_id: Option<Uuid>,
    pub identity_kind: Option<IdentityKind>,
    pub tenant_id: Option<Uuid>,
    pub outcome: OutcomeCode,
    pub status_code: u16,
    pub error: Option<String>,
    pub duration_ms: u64,
}
