// HTTP request handlers for the PKCE relay
pub mod authorize;
pub mod callback;
pub mod health;

// Re-export the main handler functions
pub use authorize::oauth_authorize;
pub use callback::{oauth_callback, CallbackOutcome};
pub use health::health;
