//! TenantGate Gateway — tenant resolution, the authorization pipeline,
//! audit, and the tenant-scoped services that run behind it.
//!
//! This crate provides:
//! - Tenant resolution from host, header, parameter and default
//!   ([`TenantResolver`])
//! - The ordered request pipeline with total audit coverage ([`Pipeline`])
//! - Tenant signup with atomic provisioning ([`ProvisioningService`])
//! - Member management ([`MemberService`])
//! - An HTTP identity-provider client ([`HttpIdentityProvider`])

pub mod audit;
pub mod config;
pub mod gateway;
pub mod idp;
pub mod members;
pub mod operations;
pub mod pipeline;
pub mod provisioning;
pub mod request;
pub mod tenant;

pub use audit::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use config::{Environment, PipelineConfig, TenancyConfig};
pub use gateway::Gateway;
pub use idp::{HttpIdentityProvider, IdentityProvider, IdpConfig, IdpError, NewAccount};
pub use members::MemberService;
pub use pipeline::Pipeline;
pub use provisioning::{ProvisioningService, SignupRequest, SignupResult};
pub use request::{InboundRequest, Operation, RequestContext, Requirement};
pub use tenant::TenantResolver;
