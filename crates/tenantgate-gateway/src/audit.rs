//! Audit records for every request that enters the pipeline.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tenantgate_core::error::{GateError, OutcomeCode};
use tenantgate_core::models::audit::AuditRecord;
use tenantgate_core::models::identity::Identity;
use tracing::{error, info};
use uuid::Uuid;

/// Destination for finished audit records.
pub trait AuditSink: Send + Sync + 'static {
    fn record(&self, record: &AuditRecord);
}

impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn record(&self, record: &AuditRecord) {
        (**self).record(record);
    }
}

/// Emits one structured event per record on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, r: &AuditRecord) {
        let identity_kind = r.identity_kind.map(|k| k.as_str());
        if r.outcome == OutcomeCode::Internal {
            error!(
                target: "audit",
                timestamp = %r.timestamp,
                operation = %r.operation,
                request_id = ?r.request_id,
                identity_id = ?r.identity_id,
                identity_kind = ?identity_kind,
                tenant_id = ?r.tenant_id,
                outcome = r.outcome.as_str(),
                status_code = r.status_code,
                error = ?r.error,
                duration_ms = r.duration_ms,
                "request failed"
            );
        } else {
            info!(
                target: "audit",
                timestamp = %r.timestamp,
                operation = %r.operation,
                request_id = ?r.request_id,
                identity_id = ?r.identity_id,
                identity_kind = ?identity_kind,
                tenant_id = ?r.tenant_id,
                outcome = r.outcome.as_str(),
                status_code = r.status_code,
                error = ?r.error,
                duration_ms = r.duration_ms,
                "request completed"
            );
        }
    }
}

/// Keeps records in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

/// An open audit record.
///
/// Exactly one record reaches the sink per guard: through
/// [`finish`](Self::finish), or with outcome `Cancelled` when the guard is
/// dropped unfinished.
pub struct AuditGuard<'a, S: AuditSink> {
    sink: &'a S,
    started: Instant,
    record: AuditRecord,
    finished: bool,
}

impl<'a, S: AuditSink> AuditGuard<'a, S> {
    pub fn begin(sink: &'a S, operation: &str, request_id: Option<String>) -> Self {
        Self {
            sink,
            started: Instant::now(),
            record: AuditRecord {
                timestamp: Utc::now(),
                operation: operation.to_string(),
                request_id,
                identity_id: None,
                identity_kind: None,
                tenant_id: None,
                outcome: OutcomeCode::Cancelled,
                status_code: OutcomeCode::Cancelled.status(),
                error: None,
                duration_ms: 0,
            },
            finished: false,
        }
    }

    pub fn observe_identity(&mut self, identity: &Identity) {
        self.record.identity_id = Some(identity.id);
        self.record.identity_kind = Some(identity.kind);
        if self.record.tenant_id.is_none() {
            self.record.tenant_id = identity.effective_tenant_id;
        }
    }

    /// The request's resolved tenant replaces any identity-derived one.
    pub fn observe_tenant(&mut self, tenant_id: Uuid) {
        self.record.tenant_id = Some(tenant_id);
    }

    pub fn finish(mut self, error: Option<&GateError>) {
        let outcome = error.map_or(OutcomeCode::Ok, GateError::code);
        self.record.error = error.map(ToString::to_string);
        self.emit(outcome);
    }

    fn emit(&mut self, outcome: OutcomeCode) {
        self.finished = true;
        self.record.outcome = outcome;
        self.record.status_code = outcome.status();
        self.record.duration_ms =
            u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.sink.record(&self.record);
    }
}

impl<S: AuditSink> Drop for AuditGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.record.error = Some(GateError::Cancelled.to_string());
            self.emit(OutcomeCode::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use tenantgate_core::models::identity::IdentityKind;

    use super::*;

    #[test]
    fn finish_records_outcome_once() {
        let sink = MemoryAuditSink::new();
        let guard = AuditGuard::begin(&sink, "members.list", Some("req-1".into()));
        guard.finish(Some(&GateError::permission_denied("viewer can only read")));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, OutcomeCode::PermissionDenied);
        assert_eq!(records[0].status_code, 403);
        assert_eq!(records[0].request_id.as_deref(), Some("req-1"));
        assert!(records[0].error.as_deref().unwrap().contains("viewer can only read"));
    }

    #[test]
    fn dropped_guard_records_cancelled() {
        let sink = MemoryAuditSink::new();
        {
            let _guard = AuditGuard::begin(&sink, "members.get", None);
        }
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, OutcomeCode::Cancelled);
        assert_eq!(records[0].status_code, 499);
    }

    #[test]
    fn resolved_tenant_overrides_identity_tenant() {
        let sink = MemoryAuditSink::new();
        let own = Uuid::new_v4();
        let requested = Uuid::new_v4();
        let mut guard = AuditGuard::begin(&sink, "members.get", None);
        guard.observe_identity(&Identity {
            id: Uuid::new_v4(),
            kind: IdentityKind::Operator,
            email: "op@platform.test".into(),
            effective_tenant_id: Some(own),
        });
        guard.observe_tenant(requested);
        guard.finish(None);

        let record = &sink.records()[0];
        assert_eq!(record.outcome, OutcomeCode::Ok);
        assert_eq!(record.identity_kind, Some(IdentityKind::Operator));
        assert_eq!(record.tenant_id, Some(requested));
        assert!(record.error.is_none());
    }
}
