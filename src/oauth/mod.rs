//! OAuth PKCE flow building blocks
//!
//! This module provides the verifier/challenge generation and the token
//! exchange client used by the authorize and callback handlers, plus the
//! query parameter shapes both endpoints accept.

pub mod pkce;
pub mod token;

pub use pkce::{derive_challenge, generate_pkce, PkcePair};
pub use token::{TokenClient, TokenExchangeError};

use serde::Deserialize;
use url::Url;

/// Query parameters accepted by the authorize endpoint
#[derive(Deserialize, Debug)]
pub struct AuthorizeQuery {
    pub provider: Option<String>,
}

/// Query parameters the authorization server delivers to the callback
/// endpoint. `code` and `error` are mutually exclusive; `isSignUp` is echoed
/// back from the `redirect_to_on_signup` URL chosen during authorize.
#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "isSignUp")]
    pub is_sign_up: Option<String>,
}

impl CallbackQuery {
    /// The authorization server marks first sign-ins with the literal
    /// string `"true"`; anything else is a plain sign-in.
    #[must_use]
    pub fn signup_requested(&self) -> bool {
        self.is_sign_up.as_deref() == Some("true")
    }
}

/// Resolve an endpoint path against a configured base URL, tolerating
/// trailing slashes in the configured value.
///
/// # Errors
///
/// Returns an error if the combined URL cannot be parsed.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/{path}", base.trim_end_matches('/')))
}
