//! Tenant signup: validation, uniqueness, the identity-provider call, the
//! provisioning unit of work and its single transient retry.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{FakeIdp, provision, repositories, setup};
use tenantgate_core::error::{GateError, GateResult, OutcomeCode, Transience};
use tenantgate_core::models::member::{CreateMember, Member};
use tenantgate_core::models::tenant::{ProvisionTenant, ProvisionedTenant};
use tenantgate_core::repository::{
    MemberRepository, Pagination, ProvisioningRepository, Repositories, RoleRepository,
    TenantRepository,
};
use tenantgate_core::seed;
use tenantgate_db::SqliteRepositories;
use tenantgate_db::repository::{SqliteProvisioningRepository, SqliteTenantRepository};
use tenantgate_gateway::{InboundRequest, ProvisioningService, SignupRequest};

fn signup(slug: &str) -> SignupRequest {
    SignupRequest {
        name: "Acme Corporation".into(),
        slug: slug.into(),
        company_code: Some(format!("{slug}-001")),
        admin_email: format!("founder@{slug}.test"),
        admin_password: "correct horse battery".into(),
        admin_first_name: "Fran".into(),
        admin_last_name: "Founder".into(),
        ..Default::default()
    }
}

async fn tenant_count(repos: &SqliteRepositories) -> u64 {
    repos
        .tenants()
        .list(Pagination::default())
        .await
        .unwrap()
        .total
}

/// Fails the first `failures` provisioning attempts with a database error
/// of the given transience, then delegates.
#[derive(Clone)]
struct FlakyProvisioning {
    inner: SqliteProvisioningRepository,
    failures: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    transience: Transience,
}

impl FlakyProvisioning {
    fn new(repos: &SqliteRepositories, failures: usize, transience: Transience) -> Self {
        Self {
            inner: repos.provisioning().clone(),
            failures: Arc::new(AtomicUsize::new(failures)),
            calls: Arc::new(AtomicUsize::new(0)),
            transience,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProvisioningRepository for FlakyProvisioning {
    async fn provision_tenant(&self, input: ProvisionTenant) -> GateResult<ProvisionedTenant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(GateError::Database {
                message: "database is locked".into(),
                transience: self.transience,
            });
        }
        self.inner.provision_tenant(input).await
    }

    async fn create_member(&self, input: CreateMember, role_code: &str) -> GateResult<Member> {
        self.inner.create_member(input, role_code).await
    }
}

/// Sleeps before every provisioning call.
#[derive(Clone)]
struct SlowProvisioning {
    inner: SqliteProvisioningRepository,
    delay: Duration,
}

impl ProvisioningRepository for SlowProvisioning {
    async fn provision_tenant(&self, input: ProvisionTenant) -> GateResult<ProvisionedTenant> {
        tokio::time::sleep(self.delay).await;
        self.inner.provision_tenant(input).await
    }

    async fn create_member(&self, input: CreateMember, role_code: &str) -> GateResult<Member> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_member(input, role_code).await
    }
}

fn service<W: ProvisioningRepository + Clone + 'static>(
    repos: &SqliteRepositories,
    provisioning: W,
    idp: FakeIdp,
) -> ProvisioningService<SqliteTenantRepository, W, FakeIdp> {
    ProvisioningService::new(repos.tenants().clone(), provisioning, idp)
        .with_retry_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn signup_provisions_tenant_roles_and_admin() {
    let h = setup().await;

    let result = h
        .gateway
        .signup_client(InboundRequest::new(), signup("acme"))
        .await
        .unwrap();

    assert_eq!(result.tenant_name, "Acme Corporation");
    assert_eq!(result.admin_email, "founder@acme.test");

    let accounts = h.idp.accounts();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].email, "founder@acme.test");
    assert_eq!(accounts[0].password, "correct horse battery");

    let tenant = h.repos.tenants().get_by_slug("acme").await.unwrap();
    assert_eq!(tenant.id, result.tenant_id);
    assert_eq!(tenant.company_code.as_deref(), Some("acme-001"));
    assert!(tenant.is_active());

    let roles = h.repos.roles().list(tenant.id).await.unwrap();
    assert_eq!(roles.len(), 4);
    let mut permission_rows = 0;
    for role in &roles {
        permission_rows += h.repos.roles().list_permissions(role.id).await.unwrap().len();
    }
    assert_eq!(permission_rows, 101);

    let admin = h
        .repos
        .members()
        .get_in_tenant(tenant.id, result.admin_user_id)
        .await
        .unwrap();
    assert_eq!(admin.email, "founder@acme.test");
    let bindings = h
        .repos
        .roles()
        .list_member_bindings(tenant.id, admin.id)
        .await
        .unwrap();
    let system_admin = h
        .repos
        .roles()
        .get_by_code(tenant.id, seed::SYSTEM_ADMIN)
        .await
        .unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].role_id, system_admin.id);

    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, OutcomeCode::Ok);
    assert!(records[0].identity_id.is_none());
}

#[tokio::test]
async fn duplicate_slug_is_rejected_before_account_creation() {
    let h = setup().await;
    provision(&h.repos, "acme").await;

    let err = h
        .gateway
        .signup_client(InboundRequest::new(), signup("acme"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), OutcomeCode::AlreadyExists);
    assert_eq!(err.to_string(), "slug already exists: acme");
    assert!(h.idp.accounts().is_empty());
    assert_eq!(h.sink.records()[0].status_code, 409);
}

#[tokio::test]
async fn duplicate_company_code_is_rejected() {
    let h = setup().await;
    h.gateway
        .signup_client(InboundRequest::new(), signup("first"))
        .await
        .unwrap();

    let mut second = signup("second");
    second.company_code = Some("first-001".into());
    let err = h
        .gateway
        .signup_client(InboundRequest::new(), second)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "company_code already exists: first-001");
    assert_eq!(h.idp.accounts().len(), 1);
}

#[tokio::test]
async fn blank_company_code_is_not_checked_or_stored() {
    let h = setup().await;
    let mut request = signup("blank");
    request.company_code = Some("  ".into());

    let result = h
        .gateway
        .signup_client(InboundRequest::new(), request)
        .await
        .unwrap();

    let tenant = h.repos.tenants().get_by_id(result.tenant_id).await.unwrap();
    assert_eq!(tenant.company_code, None);
}

#[tokio::test]
async fn invalid_requests_fail_before_any_write() {
    let h = setup().await;

    let mut missing = signup("acme");
    missing.admin_email.clear();
    let err = h
        .gateway
        .signup_client(InboundRequest::new(), missing)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid argument: admin_email is required");

    let err = h
        .gateway
        .signup_client(InboundRequest::new(), signup("Not A Slug"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), OutcomeCode::InvalidArgument);

    assert!(h.idp.accounts().is_empty());
    assert_eq!(tenant_count(&h.repos).await, 0);
}

#[tokio::test]
async fn identity_provider_rejection_writes_nothing() {
    let h = setup().await;
    h.idp.reject_all();

    let err = h
        .gateway
        .signup_client(InboundRequest::new(), signup("acme"))
        .await
        .unwrap_err();

    assert!(matches!(err, GateError::AlreadyExists { .. }));
    assert_eq!(tenant_count(&h.repos).await, 0);
}

#[tokio::test]
async fn failed_unit_of_work_reports_orphaned_account() {
    let h = setup().await;
    let existing = provision(&h.repos, "existing").await;
    // The provider hands back an id already used by a member, so the
    // admin insert fails inside the unit of work.
    h.idp.issue_next(existing.admin.id);

    let err = h
        .gateway
        .signup_client(InboundRequest::new(), signup("acme"))
        .await
        .unwrap_err();

    match &err {
        GateError::ExternalAccountOrphaned {
            external_id,
            source,
        } => {
            assert_eq!(external_id, &existing.admin.id.to_string());
            assert!(matches!(**source, GateError::AlreadyExists { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), OutcomeCode::AlreadyExists);

    // Nothing from the failed signup was kept.
    assert!(h.repos.tenants().get_by_slug("acme").await.unwrap_err().is_not_found());
    assert_eq!(tenant_count(&h.repos).await, 1);
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let repos = repositories().await;
    let flaky = FlakyProvisioning::new(&repos, 1, Transience::Transient);
    let signup_service = service(&repos, flaky.clone(), FakeIdp::default());

    let result = signup_service.signup(signup("acme")).await.unwrap();

    assert_eq!(flaky.calls(), 2);
    assert_eq!(
        repos.tenants().get_by_slug("acme").await.unwrap().id,
        result.tenant_id
    );
}

#[tokio::test]
async fn retry_happens_at_most_once() {
    let repos = repositories().await;
    let flaky = FlakyProvisioning::new(&repos, 2, Transience::Transient);
    let idp = FakeIdp::default();
    let signup_service = service(&repos, flaky.clone(), idp.clone());

    let err = signup_service.signup(signup("acme")).await.unwrap_err();

    assert_eq!(flaky.calls(), 2);
    assert!(matches!(err, GateError::ExternalAccountOrphaned { .. }));
    assert_eq!(err.code(), OutcomeCode::Internal);
    assert_eq!(idp.accounts().len(), 1);
    assert_eq!(tenant_count(&repos).await, 0);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let repos = repositories().await;
    let flaky = FlakyProvisioning::new(&repos, 1, Transience::Permanent);
    let signup_service = service(&repos, flaky.clone(), FakeIdp::default());

    let err = signup_service.signup(signup("acme")).await.unwrap_err();

    assert_eq!(flaky.calls(), 1);
    assert!(matches!(err, GateError::ExternalAccountOrphaned { .. }));
}

#[tokio::test]
async fn provisioning_outlives_a_cancelled_signup() {
    let repos = repositories().await;
    let slow = SlowProvisioning {
        inner: repos.provisioning().clone(),
        delay: Duration::from_millis(100),
    };
    let idp = FakeIdp::default();
    let signup_service = service(&repos, slow, idp.clone());

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), signup_service.signup(signup("acme"))).await;
    assert!(timed_out.is_err());
    assert_eq!(idp.accounts().len(), 1);

    // The account exists, so the unit of work still runs to completion.
    let mut tenant = None;
    for _ in 0..50 {
        if let Ok(found) = repos.tenants().get_by_slug("acme").await {
            tenant = Some(found);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let tenant = tenant.expect("tenant provisioned after the caller went away");
    let admin = repos
        .members()
        .get_by_email(tenant.id, "founder@acme.test")
        .await
        .unwrap();
    assert_eq!(admin.tenant_id, tenant.id);
}

#[tokio::test]
async fn signed_up_admin_can_use_the_gateway() {
    let h = setup().await;
    let result = h
        .gateway
        .signup_client(InboundRequest::new(), signup("acme"))
        .await
        .unwrap();

    let me = h
        .gateway
        .whoami(
            InboundRequest::new()
                .with_bearer(&common::token(result.admin_user_id))
                .with_host("acme.example.com"),
        )
        .await
        .unwrap();

    assert_eq!(me.user_id, result.admin_user_id);
    assert_eq!(me.tenant_id, Some(result.tenant_id));
}
