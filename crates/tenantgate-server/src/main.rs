//! TenantGate Server — application entry point.

mod config;

use std::process::ExitCode;

use tenantgate_db::{DbError, DbManager};
use tenantgate_gateway::{Gateway, HttpIdentityProvider, IdpError, TracingAuditSink};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("identity provider client: {0}")]
    Idp(#[from] IdpError),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenantgate=info")),
        )
        .json()
        .init();

    info!("Starting TenantGate server...");

    match run().await {
        Ok(()) => {
            info!("TenantGate server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "TenantGate server failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds the gateway and holds it until shutdown. A transport mounts the
/// gateway here.
async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;
    info!(
        environment = %config.tenancy.environment,
        base_domain = %config.tenancy.base_domain,
        validate_subdomain = config.tenancy.validate_subdomain,
        "Configuration loaded"
    );

    let db = DbManager::connect(&config.db).await?;
    tenantgate_db::run_migrations(db.pool()).await?;
    let repos = db.repositories();

    let gateway = Gateway::new(
        &repos,
        HttpIdentityProvider::new(config.idp)?,
        config.auth,
        config.tenancy,
        config.pipeline,
        TracingAuditSink,
    );
    info!(request_timeout = ?gateway.pipeline().config().request_timeout, "Gateway ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    db.pool().close().await;
    Ok(())
}
