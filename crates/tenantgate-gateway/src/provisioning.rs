//! Self-service tenant signup.
//!
//! The admin account is created at the identity provider first, outside
//! any transaction. Everything else is one provisioning unit of work,
//! retried once when storage reports a transient failure. A unit of work
//! that still fails strands the external account; that is reported as
//! [`GateError::ExternalAccountOrphaned`] and logged for manual cleanup.
//!
//! Once the account exists, the storage work runs on its own task and is
//! not abandoned when the caller is cancelled or times out.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::tenant::{
    CreateTenant, ProvisionAdmin, ProvisionTenant, ProvisionedTenant,
};
use tenantgate_core::repository::{ProvisioningRepository, TenantRepository};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::idp::{IdentityProvider, NewAccount};

#[derive(Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub company_code: Option<String>,
    #[serde(default)]
    pub e_sign_mode: Option<String>,
    #[serde(default)]
    pub retention_default_months: Option<i32>,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_first_name: String,
    pub admin_last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResult {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub admin_user_id: Uuid,
    pub admin_email: String,
}

/// Fail with `InvalidArgument "<field> is required"` when `value` is blank.
pub(crate) fn require(field: &str, value: &str) -> GateResult<()> {
    if value.trim().is_empty() {
        return Err(GateError::invalid_argument(format!("{field} is required")));
    }
    Ok(())
}

/// Lowercase DNS label: `[a-z0-9-]`, 1 to 63 characters, no hyphen at
/// either end.
pub fn is_valid_slug(slug: &str) -> bool {
    (1..=63).contains(&slug.len())
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn validate(request: &SignupRequest) -> GateResult<()> {
    require("name", &request.name)?;
    require("slug", &request.slug)?;
    require("admin_email", &request.admin_email)?;
    require("admin_password", &request.admin_password)?;
    require("admin_first_name", &request.admin_first_name)?;
    require("admin_last_name", &request.admin_last_name)?;
    if !is_valid_slug(request.slug.trim()) {
        return Err(GateError::invalid_argument(
            "slug must be a lowercase DNS label",
        ));
    }
    Ok(())
}

/// A hit is `AlreadyExists`, a miss is fine, anything else propagates.
pub(crate) fn ensure_unused<R>(field: &str, key: &str, lookup: GateResult<R>) -> GateResult<()> {
    match lookup {
        Ok(_) => Err(GateError::already_exists(field, key)),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Run the storage work that follows a created external account to
/// completion on a detached task. A failure is logged against `external_id`
/// and reported as [`GateError::ExternalAccountOrphaned`], whether or not
/// anyone still awaits the result.
pub(crate) async fn after_account_created<T, F>(
    external_id: Uuid,
    what: &'static str,
    work: F,
) -> GateResult<T>
where
    T: Send + 'static,
    F: Future<Output = GateResult<T>> + Send + 'static,
{
    let task = tokio::spawn(async move {
        work.await.map_err(|source| {
            error!(
                external_id = %external_id,
                error = %source,
                "{what} failed after the external account was created; account is orphaned"
            );
            GateError::ExternalAccountOrphaned {
                external_id: external_id.to_string(),
                source: Box::new(source),
            }
        })
    });

    match task.await {
        Ok(result) => result,
        Err(join) => {
            error!(
                external_id = %external_id,
                error = %join,
                "{what} task aborted after the external account was created; account is orphaned"
            );
            Err(GateError::ExternalAccountOrphaned {
                external_id: external_id.to_string(),
                source: Box::new(GateError::Internal(format!("{what} task aborted: {join}"))),
            })
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct ProvisioningService<T, W, I>
where
    T: TenantRepository,
    W: ProvisioningRepository + Clone + 'static,
    I: IdentityProvider,
{
    tenants: T,
    provisioning: W,
    idp: I,
    retry_delay: Duration,
}

impl<T, W, I> ProvisioningService<T, W, I>
where
    T: TenantRepository,
    W: ProvisioningRepository + Clone + 'static,
    I: IdentityProvider,
{
    pub fn new(tenants: T, provisioning: W, idp: I) -> Self {
        Self {
            tenants,
            provisioning,
            idp,
            retry_delay: Duration::from_millis(10),
        }
    }

    /// Pause before the single retry of a transient failure.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub async fn signup(&self, request: SignupRequest) -> GateResult<SignupResult> {
        validate(&request)?;

        let slug = request.slug.trim().to_string();
        let company_code = non_blank(request.company_code);
        ensure_unused("slug", &slug, self.tenants.get_by_slug(&slug).await)?;
        if let Some(code) = &company_code {
            ensure_unused("company_code", code, self.tenants.get_by_company_code(code).await)?;
        }

        let admin_email = request.admin_email.trim().to_string();
        let admin_id = self
            .idp
            .create_account(&NewAccount {
                email: admin_email.clone(),
                password: request.admin_password,
                first_name: request.admin_first_name.clone(),
                last_name: request.admin_last_name.clone(),
            })
            .await?;

        let input = ProvisionTenant {
            tenant: CreateTenant {
                name: request.name.trim().to_string(),
                slug,
                company_code,
                e_sign_mode: non_blank(request.e_sign_mode),
                retention_default_months: request.retention_default_months,
                settings: None,
            },
            admin: ProvisionAdmin {
                id: admin_id,
                email: admin_email,
                first_name: request.admin_first_name,
                last_name: request.admin_last_name,
            },
        };

        let provisioning = self.provisioning.clone();
        let retry_delay = self.retry_delay;
        let provisioned = after_account_created(admin_id, "Tenant provisioning", async move {
            let provisioned = provision_with_retry(&provisioning, input, retry_delay).await?;
            info!(
                tenant_id = %provisioned.tenant.id,
                slug = %provisioned.tenant.slug,
                admin_id = %provisioned.admin.id,
                "Tenant signed up"
            );
            Ok(provisioned)
        })
        .await?;

        Ok(SignupResult {
            tenant_id: provisioned.tenant.id,
            tenant_name: provisioned.tenant.name,
            admin_user_id: provisioned.admin.id,
            admin_email: provisioned.admin.email,
        })
    }
}

async fn provision_with_retry<W: ProvisioningRepository>(
    provisioning: &W,
    input: ProvisionTenant,
    retry_delay: Duration,
) -> GateResult<ProvisionedTenant> {
    match provisioning.provision_tenant(input.clone()).await {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "Transient failure while provisioning tenant, retrying once");
            tokio::time::sleep(retry_delay).await;
            provisioning.provision_tenant(input).await
        }
        result => result,
    }
}
