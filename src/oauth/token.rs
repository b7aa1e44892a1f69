//! Server-to-server token exchange with the authorization server

use std::time::Duration;

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::settings::AuthServerSettings;

/// Failures of the one-shot token exchange. None of these are retried; each
/// callback request attempts the exchange exactly once.
#[derive(Debug, thiserror::Error)]
pub enum TokenExchangeError {
    /// Non-2xx reply from the token endpoint
    #[error("token endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },
    /// 2xx reply without a usable `auth_token` field
    #[error("token endpoint returned a malformed payload: {body}")]
    Malformed { body: String },
    /// Transport-level failure, including the bounded client timeout
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    auth_token: Option<String>,
}

/// Client for the authorization server's token endpoint
#[derive(Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    token_endpoint: Url,
}

impl TokenClient {
    /// Build the client from settings, resolving the token endpoint once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is unparseable or the
    /// HTTP client cannot be constructed.
    pub fn new(settings: &AuthServerSettings) -> anyhow::Result<Self> {
        let token_endpoint = crate::oauth::endpoint_url(&settings.base_url, "token")?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            token_endpoint,
        })
    }

    /// Exchange an authorization code and its PKCE verifier for an auth
    /// token.
    ///
    /// The verifier travels only inside this request; it is never logged.
    ///
    /// # Errors
    ///
    /// Returns [`TokenExchangeError`] on a non-2xx reply, a 2xx reply
    /// missing the `auth_token` field, or a transport failure.
    pub async fn exchange(&self, code: &str, verifier: &str) -> Result<String, TokenExchangeError> {
        let mut url = self.token_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("code", code)
            .append_pair("verifier", verifier);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("token exchange rejected with status {status}");
            return Err(TokenExchangeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).unwrap_or(TokenResponse { auth_token: None });
        match parsed.auth_token {
            Some(token) if !token.is_empty() => {
                debug!("token exchange succeeded");
                Ok(token)
            }
            _ => Err(TokenExchangeError::Malformed { body }),
        }
    }
}
