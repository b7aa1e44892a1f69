//! Pre-built test objects

use crate::oauth::TokenClient;
use crate::settings::{AuthServerSettings, RelaySettings};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Default settings, suitable for handler tests that never leave the
    /// process
    #[must_use]
    pub fn settings() -> RelaySettings {
        RelaySettings::default()
    }

    /// Settings pointed at a live (usually mock) authorization server
    #[must_use]
    pub fn settings_with_auth_server(base_url: &str) -> RelaySettings {
        let mut settings = RelaySettings::default();
        settings.auth_server.base_url = base_url.to_string();
        settings
    }

    /// Token client pointed at a live (usually mock) authorization server,
    /// with a short timeout so broken tests fail fast
    ///
    /// # Panics
    ///
    /// Panics if `base_url` is not a valid URL.
    #[must_use]
    pub fn token_client(base_url: &str) -> TokenClient {
        TokenClient::new(&AuthServerSettings {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        })
        .expect("test token client should build")
    }
}
