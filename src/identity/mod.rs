//! Identity store collaborator
//!
//! The relay touches the identity store for exactly one operation: the
//! conditional provisioning write on first sign-in. The store is reached
//! over its HTTP EdgeQL endpoint, with the freshly exchanged auth token
//! passed explicitly as the per-call credential so it never outlives the
//! one write it authorizes.

use async_trait::async_trait;
use log::info;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::settings::IdentityStoreSettings;

/// EdgeQL executed once per first sign-in. The identity itself comes out of
/// the client token global; the relay never sees it.
const PROVISION_QUERY: &str =
    "insert User { identity := (global ext::auth::ClientTokenIdentity) };";

/// Failures of the provisioning write
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The store accepted the connection but rejected the write
    #[error("identity store rejected the provisioning write ({status}): {body}")]
    Store { status: u16, body: String },
    /// Transport-level failure, including the bounded client timeout
    #[error("identity store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The single write the relay performs against the identity store
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create the local identity record for a first sign-in, credentialed by
    /// the auth token obtained moments earlier from the token exchange.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisioningError`] if the store rejects the write or is
    /// unreachable.
    async fn provision_identity(&self, auth_token: &str) -> Result<(), ProvisioningError>;
}

/// Production implementation over the store's HTTP EdgeQL endpoint
pub struct HttpIdentityStore {
    http: reqwest::Client,
    edgeql_endpoint: Url,
}

impl HttpIdentityStore {
    /// Build the client from settings, resolving the EdgeQL endpoint for
    /// the configured branch once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is unparseable or the
    /// HTTP client cannot be constructed.
    pub fn new(settings: &IdentityStoreSettings) -> anyhow::Result<Self> {
        let edgeql_endpoint = crate::oauth::endpoint_url(
            &settings.base_url,
            &format!("db/{}/edgeql", settings.branch),
        )?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            edgeql_endpoint,
        })
    }
}

#[async_trait]
impl IdentityStore for HttpIdentityStore {
    async fn provision_identity(&self, auth_token: &str) -> Result<(), ProvisioningError> {
        let body = json!({
            "query": PROVISION_QUERY,
            "globals": { "ext::auth::client_token": auth_token },
        });

        let response = self
            .http
            .post(self.edgeql_endpoint.clone())
            .bearer_auth(auth_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisioningError::Store {
                status: status.as_u16(),
                body,
            });
        }

        info!("provisioned new user identity");
        Ok(())
    }
}
