//! Integration tests for role seeding, bindings and the provisioning
//! transaction using in-memory SQLite.

use std::collections::HashMap;

use tenantgate_core::error::GateError;
use tenantgate_core::models::member::CreateMember;
use tenantgate_core::models::permission::{Action, Feature};
use tenantgate_core::models::tenant::{CreateTenant, ProvisionAdmin, ProvisionTenant};
use tenantgate_core::repository::{
    MemberRepository, ProvisioningRepository, Repositories, RoleRepository, TenantRepository,
};
use tenantgate_core::seed;
use tenantgate_db::{DbManager, SqliteRepositories};
use uuid::Uuid;

async fn setup() -> (DbManager, SqliteRepositories) {
    let db = DbManager::in_memory().await.unwrap();
    tenantgate_db::run_migrations(db.pool()).await.unwrap();
    let repos = db.repositories();
    (db, repos)
}

fn provision_input(slug: &str, admin_id: Uuid) -> ProvisionTenant {
    ProvisionTenant {
        tenant: CreateTenant {
            name: "Acme".into(),
            slug: slug.into(),
            company_code: Some(format!("{slug}-code")),
            ..Default::default()
        },
        admin: ProvisionAdmin {
            id: admin_id,
            email: format!("admin@{slug}.test"),
            first_name: "Ada".into(),
            last_name: "Admin".into(),
        },
    }
}

async fn count(db: &DbManager, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn provisioning_writes_the_full_bundle() {
    let (db, repos) = setup().await;
    let admin_id = Uuid::new_v4();

    let result = repos
        .provisioning()
        .provision_tenant(provision_input("acme", admin_id))
        .await
        .unwrap();

    assert_eq!(result.admin.id, admin_id);
    assert_eq!(result.admin.tenant_id, result.tenant.id);
    assert!(result.tenant.is_active());

    let roles = repos.roles().list(result.tenant.id).await.unwrap();
    let mut by_code = HashMap::new();
    for role in &roles {
        assert!(role.is_system);
        let permissions = repos.roles().list_permissions(role.id).await.unwrap();
        by_code.insert(role.code.clone(), permissions);
    }
    assert_eq!(by_code.len(), 4);
    assert_eq!(by_code[seed::SYSTEM_ADMIN].len(), 36);
    assert_eq!(by_code[seed::BUSINESS_ADMIN].len(), 33);
    assert_eq!(by_code[seed::MEMBER].len(), 23);
    assert_eq!(by_code[seed::READONLY].len(), 9);
    assert!(by_code.values().flatten().all(|p| p.granted));
    assert_eq!(count(&db, "role_permissions").await, 101);

    let bindings = repos
        .roles()
        .list_member_bindings(result.tenant.id, admin_id)
        .await
        .unwrap();
    assert_eq!(bindings.len(), 1);
    let admin_role = repos
        .roles()
        .get_by_code(result.tenant.id, seed::SYSTEM_ADMIN)
        .await
        .unwrap();
    assert_eq!(bindings[0].role_id, admin_role.id);
}

#[tokio::test]
async fn member_seed_has_no_approve_outside_approvals() {
    let (_db, repos) = setup().await;
    let result = repos
        .provisioning()
        .provision_tenant(provision_input("seedcheck", Uuid::new_v4()))
        .await
        .unwrap();

    let role = repos
        .roles()
        .get_by_code(result.tenant.id, seed::MEMBER)
        .await
        .unwrap();
    let permissions = repos.roles().list_permissions(role.id).await.unwrap();

    assert!(permissions.iter().all(|p| p.action != Action::Approve));
    let approvals: Vec<_> = permissions
        .iter()
        .filter(|p| p.feature == Feature::Approvals)
        .map(|p| p.action)
        .collect();
    assert_eq!(approvals, vec![Action::Read]);
}

#[tokio::test]
async fn failed_provisioning_rolls_back_everything() {
    let (db, repos) = setup().await;
    let first = repos
        .provisioning()
        .provision_tenant(provision_input("first", Uuid::new_v4()))
        .await
        .unwrap();

    // Reusing the first admin's id makes the member insert fail after the
    // tenant and its roles were written.
    let err = repos
        .provisioning()
        .provision_tenant(provision_input("second", first.admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::AlreadyExists { .. }), "{err:?}");

    assert!(repos.tenants().get_by_slug("second").await.is_err());
    assert_eq!(count(&db, "tenants").await, 1);
    assert_eq!(count(&db, "roles").await, 4);
    assert_eq!(count(&db, "role_permissions").await, 101);
    assert_eq!(count(&db, "members").await, 1);
    assert_eq!(count(&db, "member_role_bindings").await, 1);
}

#[tokio::test]
async fn create_member_binds_requested_role() {
    let (_db, repos) = setup().await;
    let tenant = repos
        .provisioning()
        .provision_tenant(provision_input("bind", Uuid::new_v4()))
        .await
        .unwrap()
        .tenant;

    let member = repos
        .provisioning()
        .create_member(
            CreateMember {
                id: Uuid::new_v4(),
                tenant_id: tenant.id,
                email: "m@bind.test".into(),
                first_name: "M".into(),
                last_name: "B".into(),
                department: None,
                position: None,
            },
            seed::READONLY,
        )
        .await
        .unwrap();

    let bindings = repos
        .roles()
        .list_member_bindings(tenant.id, member.id)
        .await
        .unwrap();
    let readonly = repos
        .roles()
        .get_by_code(tenant.id, seed::READONLY)
        .await
        .unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].role_id, readonly.id);
}

#[tokio::test]
async fn create_member_with_unknown_role_writes_nothing() {
    let (_db, repos) = setup().await;
    let tenant = repos
        .provisioning()
        .provision_tenant(provision_input("norole", Uuid::new_v4()))
        .await
        .unwrap()
        .tenant;
    let id = Uuid::new_v4();

    let err = repos
        .provisioning()
        .create_member(
            CreateMember {
                id,
                tenant_id: tenant.id,
                email: "x@norole.test".into(),
                first_name: "X".into(),
                last_name: "Y".into(),
                department: None,
                position: None,
            },
            "auditor",
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(repos.members().get_by_id(id).await.is_err());
}

#[tokio::test]
async fn binding_a_role_from_another_tenant_is_refused() {
    let (_db, repos) = setup().await;
    let a = repos
        .provisioning()
        .provision_tenant(provision_input("tenant-a", Uuid::new_v4()))
        .await
        .unwrap();
    let b = repos
        .provisioning()
        .provision_tenant(provision_input("tenant-b", Uuid::new_v4()))
        .await
        .unwrap();
    let foreign_role = repos
        .roles()
        .get_by_code(b.tenant.id, seed::SYSTEM_ADMIN)
        .await
        .unwrap();

    let err = repos
        .roles()
        .bind_member(a.tenant.id, a.admin.id, foreign_role.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
