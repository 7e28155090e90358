//! Tenant resolution against stored tenants.

mod common;

use common::{provision, repositories, tenancy};
use tenantgate_core::error::GateError;
use tenantgate_core::models::tenant::TenantStatus;
use tenantgate_core::repository::{Repositories, TenantRepository};
use tenantgate_db::SqliteRepositories;
use tenantgate_db::repository::SqliteTenantRepository;
use tenantgate_gateway::tenant::ResolutionStrategy;
use tenantgate_gateway::{Environment, InboundRequest, TenancyConfig, TenantResolver};
use uuid::Uuid;

async fn setup(config: TenancyConfig) -> (SqliteRepositories, TenantResolver<SqliteTenantRepository>) {
    let repos = repositories().await;
    let resolver = TenantResolver::new(repos.tenants().clone(), config);
    (repos, resolver)
}

fn reason(err: GateError) -> String {
    match err {
        GateError::InvalidArgument { message } => message,
        GateError::PermissionDenied { reason } => reason,
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn subdomain_slug_resolves_tenant() {
    let (repos, resolver) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;

    let tenant = resolver
        .resolve(&InboundRequest::new().with_host("ACME.example.com:8080"))
        .await
        .unwrap();

    assert_eq!(tenant.id, acme.id);
}

#[tokio::test]
async fn subdomain_wins_over_header() {
    let (repos, resolver) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;
    let other = provision(&repos, "other").await.tenant;

    let tenant = resolver
        .resolve(
            &InboundRequest::new()
                .with_host("acme.example.com")
                .with_client_id_header(other.id.to_string()),
        )
        .await
        .unwrap();

    assert_eq!(tenant.id, acme.id);
}

#[tokio::test]
async fn unknown_slug_falls_through_to_header() {
    let (repos, resolver) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;

    let tenant = resolver
        .resolve(
            &InboundRequest::new()
                .with_host("nobody.example.com")
                .with_client_id_header(acme.id.to_string()),
        )
        .await
        .unwrap();

    assert_eq!(tenant.id, acme.id);
}

#[tokio::test]
async fn disallowed_or_bare_domain_falls_through() {
    let (repos, resolver) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;

    for host in ["acme.evil.com", "example.com", "evilexample.com"] {
        let tenant = resolver
            .resolve(
                &InboundRequest::new()
                    .with_host(host)
                    .with_client_id_header(acme.id.to_string()),
            )
            .await
            .unwrap();
        assert_eq!(tenant.id, acme.id, "{host}");
    }
}

#[tokio::test]
async fn malformed_header_is_rejected() {
    let (_repos, resolver) = setup(tenancy()).await;

    let err = resolver
        .resolve(&InboundRequest::new().with_client_id_header("acme"))
        .await
        .unwrap_err();

    assert_eq!(reason(err), "invalid client_id format");
}

#[tokio::test]
async fn path_param_is_development_only() {
    let (repos, dev) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;
    let request = InboundRequest::new().with_client_id_param(acme.id.to_string());

    assert_eq!(dev.resolve(&request).await.unwrap().id, acme.id);

    let prod = TenantResolver::new(
        repos.tenants().clone(),
        TenancyConfig {
            environment: Environment::Production,
            ..tenancy()
        },
    );
    let err = prod.resolve(&request).await.unwrap_err();
    assert_eq!(reason(err), "client_id not found");

    // Malformed values are ignored in production too.
    let err = prod
        .resolve(&InboundRequest::new().with_client_id_param("junk"))
        .await
        .unwrap_err();
    assert_eq!(reason(err), "client_id not found");
}

#[tokio::test]
async fn default_tenant_is_last_resort() {
    let repos = repositories().await;
    let fallback = provision(&repos, "fallback").await.tenant;
    let resolver = TenantResolver::new(
        repos.tenants().clone(),
        TenancyConfig {
            default_tenant_id: fallback.id.to_string(),
            ..tenancy()
        },
    );

    let tenant = resolver.resolve(&InboundRequest::new()).await.unwrap();

    assert_eq!(tenant.id, fallback.id);
}

#[tokio::test]
async fn no_signal_is_invalid_argument() {
    let (_repos, resolver) = setup(tenancy()).await;

    let err = resolver.resolve(&InboundRequest::new()).await.unwrap_err();

    assert!(matches!(err, GateError::InvalidArgument { .. }));
    assert_eq!(reason(err), "client_id not found");
}

#[tokio::test]
async fn unknown_tenant_id_is_invalid_client() {
    let (_repos, resolver) = setup(tenancy()).await;

    let err = resolver
        .resolve(&InboundRequest::new().with_client_id_header(Uuid::new_v4().to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, GateError::PermissionDenied { .. }));
    assert_eq!(reason(err), "invalid client");
}

#[tokio::test]
async fn inactive_and_deleted_tenants_are_denied() {
    let (repos, resolver) = setup(tenancy()).await;
    let inactive = provision(&repos, "inactive").await.tenant;
    let deleted = provision(&repos, "deleted").await.tenant;
    repos
        .tenants()
        .update_status(inactive.id, TenantStatus::Inactive)
        .await
        .unwrap();
    repos.tenants().soft_delete(deleted.id).await.unwrap();

    let err = resolver
        .resolve(&InboundRequest::new().with_client_id_header(inactive.id.to_string()))
        .await
        .unwrap_err();
    assert_eq!(reason(err), "client is not active");

    let err = resolver
        .resolve(&InboundRequest::new().with_client_id_header(deleted.id.to_string()))
        .await
        .unwrap_err();
    assert_eq!(reason(err), "invalid client");
}

#[tokio::test]
async fn strategy_order_is_configurable() {
    let (repos, resolver) = setup(tenancy()).await;
    let acme = provision(&repos, "acme").await.tenant;
    let other = provision(&repos, "other").await.tenant;
    let header_first = resolver
        .clone()
        .with_strategies(vec![ResolutionStrategy::Header, ResolutionStrategy::Subdomain]);
    let request = InboundRequest::new()
        .with_host("acme.example.com")
        .with_client_id_header(other.id.to_string());

    assert_eq!(resolver.resolve(&request).await.unwrap().id, acme.id);
    assert_eq!(header_first.resolve(&request).await.unwrap().id, other.id);
}

#[tokio::test]
async fn validation_disabled_accepts_any_domain_under_base() {
    let repos = repositories().await;
    let acme = provision(&repos, "acme").await.tenant;
    let resolver = TenantResolver::new(
        repos.tenants().clone(),
        TenancyConfig {
            allowed_domains: vec!["localhost".into()],
            validate_subdomain: false,
            ..tenancy()
        },
    );

    let tenant = resolver
        .resolve(&InboundRequest::new().with_host("acme.example.com"))
        .await
        .unwrap();

    assert_eq!(tenant.id, acme.id);
}
