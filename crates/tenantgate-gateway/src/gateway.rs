//! The gateway facade: every exposed operation, each run through the
//! pipeline.

use std::sync::Arc;

use tenantgate_auth::AuthConfig;
use tenantgate_core::error::GateResult;
use tenantgate_core::models::member::Member;
use tenantgate_core::repository::{PaginatedResult, Repositories};

use crate::audit::AuditSink;
use crate::config::{PipelineConfig, TenancyConfig};
use crate::idp::IdentityProvider;
use crate::members::{self, CreateMemberRequest, MemberService, UpdateMemberRequest, WhoAmI};
use crate::operations;
use crate::pipeline::Pipeline;
use crate::provisioning::{ProvisioningService, SignupRequest, SignupResult};
use crate::request::InboundRequest;

pub struct Gateway<R, I, S>
where
    R: Repositories,
    I: IdentityProvider + Clone,
    S: AuditSink,
{
    pipeline: Pipeline<R, S>,
    signup: Arc<ProvisioningService<R::Tenants, R::Provisioning, I>>,
    members: Arc<MemberService<R::Members, R::Provisioning, I>>,
}

impl<R, I, S> Clone for Gateway<R, I, S>
where
    R: Repositories,
    I: IdentityProvider + Clone,
    S: AuditSink,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            signup: Arc::clone(&self.signup),
            members: Arc::clone(&self.members),
        }
    }
}

impl<R, I, S> Gateway<R, I, S>
where
    R: Repositories,
    I: IdentityProvider + Clone,
    S: AuditSink,
{
    pub fn new(
        repos: &R,
        idp: I,
        auth: AuthConfig,
        tenancy: TenancyConfig,
        config: PipelineConfig,
        sink: S,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(repos, auth, tenancy, config, sink),
            signup: Arc::new(ProvisioningService::new(
                repos.tenants().clone(),
                repos.provisioning().clone(),
                idp.clone(),
            )),
            members: Arc::new(MemberService::new(
                repos.members().clone(),
                repos.provisioning().clone(),
                idp,
            )),
        }
    }

    pub fn pipeline(&self) -> &Pipeline<R, S> {
        &self.pipeline
    }

    pub async fn signup_client(
        &self,
        request: InboundRequest,
        params: SignupRequest,
    ) -> GateResult<SignupResult> {
        let signup = &self.signup;
        self.pipeline
            .execute(operations::SIGNUP_CLIENT, request, |_| async move {
                signup.signup(params).await
            })
            .await
    }

    pub async fn whoami(&self, request: InboundRequest) -> GateResult<WhoAmI> {
        self.pipeline
            .execute(operations::WHOAMI, request, |ctx| async move {
                members::whoami(&ctx)
            })
            .await
    }

    pub async fn list_members(
        &self,
        request: InboundRequest,
        limit: i64,
        offset: i64,
    ) -> GateResult<PaginatedResult<Member>> {
        let members = &self.members;
        self.pipeline
            .execute(operations::LIST_MEMBERS, request, |ctx| async move {
                members.list(&ctx, limit, offset).await
            })
            .await
    }

    pub async fn get_member(&self, request: InboundRequest, id: &str) -> GateResult<Member> {
        let members = &self.members;
        self.pipeline
            .execute(operations::GET_MEMBER, request, |ctx| async move {
                members.get(&ctx, id).await
            })
            .await
    }

    pub async fn create_member(
        &self,
        request: InboundRequest,
        params: CreateMemberRequest,
    ) -> GateResult<Member> {
        let members = &self.members;
        self.pipeline
            .execute(operations::CREATE_MEMBER, request, |ctx| async move {
                members.create(&ctx, params).await
            })
            .await
    }

    pub async fn update_member(
        &self,
        request: InboundRequest,
        id: &str,
        params: UpdateMemberRequest,
    ) -> GateResult<Member> {
        let members = &self.members;
        self.pipeline
            .execute(operations::UPDATE_MEMBER, request, |ctx| async move {
                members.update(&ctx, id, params).await
            })
            .await
    }

    pub async fn delete_member(&self, request: InboundRequest, id: &str) -> GateResult<()> {
        let members = &self.members;
        self.pipeline
            .execute(operations::DELETE_MEMBER, request, |ctx| async move {
                members.delete(&ctx, id).await
            })
            .await
    }
}
