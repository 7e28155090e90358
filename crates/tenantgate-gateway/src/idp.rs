//! External identity provider: creates the login accounts that back
//! members.
//!
//! The provider owns passwords and issues credentials. This side only asks
//! it to create an account and keeps the returned id as the member id.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tenantgate_core::error::{GateError, GateResult};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Account to create at the identity provider.
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its external id.
    fn create_account(&self, account: &NewAccount) -> impl Future<Output = GateResult<Uuid>> + Send;
}

#[derive(Debug, Error)]
pub enum IdpError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("account already registered: {0}")]
    AlreadyRegistered(String),

    /// Non-success status. The response body is logged, never carried.
    #[error("identity provider returned {status}")]
    Status { status: u16 },

    /// The provider accepted the account but its response could not be
    /// read, so the account exists without a known id.
    #[error("account {email} created with unreadable response: {reason}")]
    UnconfirmedAccount { email: String, reason: String },
}

impl From<IdpError> for GateError {
    fn from(err: IdpError) -> Self {
        match err {
            IdpError::AlreadyRegistered(email) => GateError::already_exists("user", email),
            IdpError::UnconfirmedAccount { email, reason } => GateError::ExternalAccountOrphaned {
                external_id: email,
                source: Box::new(GateError::Internal(format!(
                    "invalid identity provider response: {reason}"
                ))),
            },
            other => GateError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Provider root, e.g. `https://project.supabase.co`.
    pub base_url: String,
    /// Service-role key sent as both `apikey` and bearer token.
    pub service_key: String,
    pub timeout: Duration,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".into(),
            service_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedAccount {
    id: String,
}

/// Supabase-style admin API client.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    config: IdpConfig,
}

impl HttpIdentityProvider {
    pub fn new(config: IdpConfig) -> Result<Self, IdpError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn users_url(&self) -> String {
        format!(
            "{}/auth/v1/admin/users",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn create(&self, account: &NewAccount) -> Result<Uuid, IdpError> {
        let body = serde_json::json!({
            "email": account.email,
            "password": account.password,
            "email_confirm": true,
            "user_metadata": {
                "first_name": account.first_name,
                "last_name": account.last_name,
            },
        });

        let response = self
            .client
            .post(self.users_url())
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        match status {
            200 | 201 => {
                let unconfirmed = |reason: String| IdpError::UnconfirmedAccount {
                    email: account.email.clone(),
                    reason,
                };
                let created: CreatedAccount = response
                    .json()
                    .await
                    .map_err(|e| unconfirmed(e.to_string()))?;
                Uuid::parse_str(&created.id)
                    .map_err(|_| unconfirmed(format!("account id {:?}", created.id)))
            }
            409 | 422 => Err(IdpError::AlreadyRegistered(account.email.clone())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, body = %body, "Identity provider rejected account creation");
                Err(IdpError::Status { status })
            }
        }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn create_account(&self, account: &NewAccount) -> GateResult<Uuid> {
        match self.create(account).await {
            Ok(id) => {
                info!(email = %account.email, account_id = %id, "Identity provider account created");
                Ok(id)
            }
            Err(e @ IdpError::UnconfirmedAccount { .. }) => {
                error!(email = %account.email, error = %e, "Identity provider account state unknown; account may be orphaned");
                Err(e.into())
            }
            Err(e) => {
                warn!(email = %account.email, error = %e, "Identity provider account creation failed");
                Err(e.into())
            }
        }
    }
}
