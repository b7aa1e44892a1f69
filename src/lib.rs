#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the authrelay application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod handlers;
pub mod identity;
pub mod oauth;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use handlers::{health, oauth_authorize, oauth_callback};
pub use identity::{HttpIdentityStore, IdentityStore, ProvisioningError};
pub use oauth::{generate_pkce, PkcePair, TokenClient, TokenExchangeError};
pub use settings::RelaySettings;
