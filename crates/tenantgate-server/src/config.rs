//! Server configuration loaded from environment variables.
//!
//! Every section maps onto the config struct of the crate that consumes
//! it. Unset optional variables fall back to that struct's `Default`.

use std::env;
use std::time::Duration;

use tenantgate_auth::AuthConfig;
use tenantgate_db::DbConfig;
use tenantgate_gateway::{Environment, IdpConfig, PipelineConfig, TenancyConfig};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub auth: AuthConfig,
    pub tenancy: TenancyConfig,
    pub pipeline: PipelineConfig,
    pub db: DbConfig,
    pub idp: IdpConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let environment = match vars.get("APP_ENV") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => Environment::default(),
        };

        let jwt_secret = vars
            .get("JWT_SECRET")
            .or_else(|| vars.get("SUPABASE_JWT_SECRET"))
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let auth = AuthConfig {
            jwt_secret,
            audience: vars.get("JWT_AUDIENCE"),
            ..AuthConfig::default()
        };

        let defaults = TenancyConfig::default();
        let default_tenant_id = vars_or(&vars, "DEFAULT_CLIENT_ID", &defaults.default_tenant_id);
        if Uuid::parse_str(&default_tenant_id).is_err() {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_CLIENT_ID",
                value: default_tenant_id,
            });
        }
        let tenancy = TenancyConfig {
            base_domain: vars_or(&vars, "BASE_DOMAIN", &defaults.base_domain),
            allowed_domains: vars
                .get("ALLOWED_DOMAINS")
                .map(|list| split_list(&list))
                .unwrap_or(defaults.allowed_domains),
            validate_subdomain: vars
                .parse("ENABLE_SUBDOMAIN_VALIDATION")?
                .unwrap_or(defaults.validate_subdomain),
            default_tenant_id,
            environment,
        };

        let pipeline = PipelineConfig {
            request_timeout: vars
                .parse::<u64>("REQUEST_TIMEOUT_MS")?
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            ..PipelineConfig::default()
        };

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            url: vars_or(&vars, "DATABASE_URL", &db_defaults.url),
            max_connections: vars
                .parse("DB_MAX_CONNS")?
                .unwrap_or(db_defaults.max_connections),
            min_connections: vars
                .parse("DB_MIN_CONNS")?
                .unwrap_or(db_defaults.min_connections),
            max_lifetime: vars
                .parse("DB_MAX_CONN_LIFETIME_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(db_defaults.max_lifetime),
            idle_timeout: vars
                .parse("DB_MAX_CONN_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(db_defaults.idle_timeout),
            ..db_defaults
        };

        let idp = IdpConfig {
            base_url: vars.get("IDP_URL").ok_or(ConfigError::Missing("IDP_URL"))?,
            service_key: vars
                .get("IDP_SERVICE_KEY")
                .ok_or(ConfigError::Missing("IDP_SERVICE_KEY"))?,
            ..IdpConfig::default()
        };

        Ok(Self {
            auth,
            tenancy,
            pipeline,
            db,
            idp,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { key, value })
            })
            .transpose()
    }
}

fn vars_or<F>(vars: &Vars<F>, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    vars.get(key).unwrap_or_else(|| default.to_owned())
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
        .collect()
}
