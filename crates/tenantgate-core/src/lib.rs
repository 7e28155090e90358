//! TenantGate Core — domain models, the error taxonomy, repository
//! contracts and the canonical role seed shared by every crate.

pub mod error;
pub mod models;
pub mod repository;
pub mod seed;
