//! TenantGate Database — SQLite pool management, schema migrations and
//! repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types with transient/permanent classification ([`DbError`])
//! - Implementations of every `tenantgate-core` repository trait
//!   ([`repository`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SqliteRepositories;
pub use schema::{run_migrations, schema_v1};
