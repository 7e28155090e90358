//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header};
use tenantgate_auth::AuthConfig;
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::member::{CreateMember, Member};
use tenantgate_core::models::operator::{
    AssignmentStatus, CreateOperator, CreateOperatorAssignment, OperatorRole,
};
use tenantgate_core::models::tenant::{
    CreateTenant, ProvisionAdmin, ProvisionTenant, ProvisionedTenant,
};
use tenantgate_core::repository::{
    OperatorAssignmentRepository, OperatorRepository, ProvisioningRepository, Repositories,
};
use tenantgate_db::{DbManager, SqliteRepositories};
use tenantgate_gateway::{
    Gateway, IdentityProvider, MemoryAuditSink, NewAccount, PipelineConfig, TenancyConfig,
};
use uuid::Uuid;

pub const SECRET: &str = "gateway-test-secret";

pub type TestGateway = Gateway<SqliteRepositories, FakeIdp, Arc<MemoryAuditSink>>;

/// Identity provider double that records requests and hands out fresh ids.
#[derive(Clone, Default)]
pub struct FakeIdp {
    accounts: Arc<Mutex<Vec<NewAccount>>>,
    next_id: Arc<Mutex<Option<Uuid>>>,
    reject: Arc<AtomicBool>,
}

impl FakeIdp {
    pub fn accounts(&self) -> Vec<NewAccount> {
        self.accounts.lock().unwrap().clone()
    }

    /// Return `id` from the next account creation.
    pub fn issue_next(&self, id: Uuid) {
        *self.next_id.lock().unwrap() = Some(id);
    }

    /// Make every account creation fail as already registered.
    pub fn reject_all(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

impl IdentityProvider for FakeIdp {
    async fn create_account(&self, account: &NewAccount) -> GateResult<Uuid> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(GateError::already_exists("user", account.email.clone()));
        }
        self.accounts.lock().unwrap().push(account.clone());
        Ok(self
            .next_id
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(Uuid::new_v4))
    }
}

pub struct Harness {
    pub repos: SqliteRepositories,
    pub sink: Arc<MemoryAuditSink>,
    pub idp: FakeIdp,
    pub gateway: TestGateway,
}

pub fn tenancy() -> TenancyConfig {
    TenancyConfig {
        base_domain: "example.com".into(),
        allowed_domains: vec!["example.com".into(), "localhost".into()],
        validate_subdomain: true,
        default_tenant_id: Uuid::nil().to_string(),
        ..Default::default()
    }
}

pub async fn repositories() -> SqliteRepositories {
    let db = DbManager::in_memory().await.unwrap();
    tenantgate_db::run_migrations(db.pool()).await.unwrap();
    db.repositories()
}

pub async fn setup() -> Harness {
    setup_with(PipelineConfig::default()).await
}

pub async fn setup_with(config: PipelineConfig) -> Harness {
    let repos = repositories().await;
    let sink = Arc::new(MemoryAuditSink::new());
    let idp = FakeIdp::default();
    let gateway = Gateway::new(
        &repos,
        idp.clone(),
        AuthConfig::with_secret(SECRET),
        tenancy(),
        config,
        Arc::clone(&sink),
    );
    Harness {
        repos,
        sink,
        idp,
        gateway,
    }
}

/// A signed credential for `subject`, valid for five minutes.
pub fn token(subject: Uuid) -> String {
    let claims = serde_json::json!({
        "sub": subject.to_string(),
        "email": format!("{subject}@tokens.test"),
        "role": "authenticated",
        "exp": Utc::now().timestamp() + 300,
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn provision(repos: &SqliteRepositories, slug: &str) -> ProvisionedTenant {
    repos
        .provisioning()
        .provision_tenant(ProvisionTenant {
            tenant: CreateTenant {
                name: format!("{slug} Inc."),
                slug: slug.into(),
                ..Default::default()
            },
            admin: ProvisionAdmin {
                id: Uuid::new_v4(),
                email: format!("admin@{slug}.test"),
                first_name: "Ada".into(),
                last_name: "Admin".into(),
            },
        })
        .await
        .unwrap()
}

pub async fn member(repos: &SqliteRepositories, tenant_id: Uuid, role: &str) -> Member {
    repos
        .provisioning()
        .create_member(
            CreateMember {
                id: Uuid::new_v4(),
                tenant_id,
                email: format!("{}@members.test", Uuid::new_v4()),
                first_name: "Mo".into(),
                last_name: "Member".into(),
                department: None,
                position: None,
            },
            role,
        )
        .await
        .unwrap()
}

pub async fn operator(
    repos: &SqliteRepositories,
    tenant_id: Uuid,
    role: OperatorRole,
    status: AssignmentStatus,
) -> Uuid {
    let operator_id = operator_account(repos).await;
    assign(repos, tenant_id, operator_id, role, status, None).await;
    operator_id
}

/// An operator with no assignments yet.
pub async fn operator_account(repos: &SqliteRepositories) -> Uuid {
    repos
        .operators()
        .create(CreateOperator {
            id: Uuid::new_v4(),
            email: format!("{}@platform.test", Uuid::new_v4()),
            name: "Olive Operator".into(),
        })
        .await
        .unwrap()
        .id
}

pub async fn assign(
    repos: &SqliteRepositories,
    tenant_id: Uuid,
    operator_id: Uuid,
    role: OperatorRole,
    status: AssignmentStatus,
    assigned_at: Option<DateTime<Utc>>,
) {
    repos
        .assignments()
        .create(CreateOperatorAssignment {
            tenant_id,
            operator_id,
            role,
            status,
            assigned_at,
        })
        .await
        .unwrap();
}
