//! Member management within the caller's resolved tenant.
//!
//! Every operation here runs as a pipeline handler, so the caller's
//! identity, tenant access and `users:*` permission are already
//! established in the [`RequestContext`].

use serde::{Deserialize, Serialize};
use tenantgate_core::error::{GateError, GateResult};
use tenantgate_core::models::identity::IdentityKind;
use tenantgate_core::models::member::{CreateMember, Member, UpdateMember};
use tenantgate_core::repository::{
    MemberRepository, PaginatedResult, Pagination, ProvisioningRepository,
};
use tenantgate_core::seed;
use tracing::info;
use uuid::Uuid;

use crate::idp::{IdentityProvider, NewAccount};
use crate::provisioning::{after_account_created, ensure_unused, require};
use crate::request::RequestContext;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp caller-supplied paging: non-positive limits take the default,
/// large ones are capped and negative offsets start at zero.
pub fn page(limit: i64, offset: i64) -> Pagination {
    let limit = if limit <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    };
    Pagination {
        offset: u64::try_from(offset).unwrap_or(0),
        limit: u64::try_from(limit).unwrap_or(DEFAULT_PAGE_SIZE as u64),
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct CreateMemberRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Partial update. An empty `department` or `position` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMemberRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhoAmI {
    pub user_id: Uuid,
    pub email: String,
    pub kind: IdentityKind,
    pub tenant_id: Option<Uuid>,
}

/// The caller as resolved by the pipeline.
pub fn whoami(ctx: &RequestContext) -> GateResult<WhoAmI> {
    let identity = ctx.identity()?;
    Ok(WhoAmI {
        user_id: identity.id,
        email: identity.email.clone(),
        kind: identity.kind,
        tenant_id: identity.effective_tenant_id,
    })
}

fn parse_member_id(id: &str) -> GateResult<Uuid> {
    Uuid::parse_str(id.trim())
        .map_err(|_| GateError::invalid_argument(format!("invalid user id format: {id}")))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `None` leaves a field alone; blank clears it.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
}

pub struct MemberService<M, W, I>
where
    M: MemberRepository,
    W: ProvisioningRepository + Clone + 'static,
    I: IdentityProvider,
{
    members: M,
    provisioning: W,
    idp: I,
}

impl<M, W, I> MemberService<M, W, I>
where
    M: MemberRepository,
    W: ProvisioningRepository + Clone + 'static,
    I: IdentityProvider,
{
    pub fn new(members: M, provisioning: W, idp: I) -> Self {
        Self {
            members,
            provisioning,
            idp,
        }
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> GateResult<PaginatedResult<Member>> {
        self.members.list(ctx.tenant_id()?, page(limit, offset)).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> GateResult<Member> {
        let id = parse_member_id(id)?;
        self.members.get_in_tenant(ctx.tenant_id()?, id).await
    }

    /// Create the login account, then the member row bound to the
    /// tenant's `member` role.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateMemberRequest,
    ) -> GateResult<Member> {
        let tenant_id = ctx.tenant_id()?;
        require("email", &request.email)?;
        require("password", &request.password)?;
        require("first_name", &request.first_name)?;
        require("last_name", &request.last_name)?;

        let email = request.email.trim().to_string();
        ensure_unused(
            "email",
            &email,
            self.members.get_by_email(tenant_id, &email).await,
        )?;

        let account_id = self
            .idp
            .create_account(&NewAccount {
                email: email.clone(),
                password: request.password,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
            })
            .await?;

        let input = CreateMember {
            id: account_id,
            tenant_id,
            email,
            first_name: request.first_name,
            last_name: request.last_name,
            department: optional(request.department),
            position: optional(request.position),
        };

        let provisioning = self.provisioning.clone();
        after_account_created(account_id, "Member creation", async move {
            let member = provisioning.create_member(input, seed::MEMBER).await?;
            info!(tenant_id = %tenant_id, member_id = %member.id, "Member created");
            Ok(member)
        })
        .await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        request: UpdateMemberRequest,
    ) -> GateResult<Member> {
        let tenant_id = ctx.tenant_id()?;
        let id = parse_member_id(id)?;
        let existing = self.members.get_in_tenant(tenant_id, id).await?;

        let email = optional(request.email);
        if let Some(email) = email.as_deref().filter(|e| *e != existing.email) {
            ensure_unused(
                "email",
                email,
                self.members.get_by_email(tenant_id, email).await,
            )?;
        }

        let patch = UpdateMember {
            email,
            first_name: optional(request.first_name),
            last_name: optional(request.last_name),
            department: clearable(request.department),
            position: clearable(request.position),
            status: None,
        };
        self.members.update(tenant_id, id, patch).await
    }

    /// Soft delete, recording the caller as `deleted_by`.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> GateResult<()> {
        let tenant_id = ctx.tenant_id()?;
        let caller = ctx.identity()?.id;
        let id = parse_member_id(id)?;
        self.members.soft_delete(tenant_id, id, caller).await?;
        info!(tenant_id = %tenant_id, member_id = %id, deleted_by = %caller, "Member deleted");
        Ok(())
    }
}
