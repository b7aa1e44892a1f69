#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use authrelay::{
    handlers::{health, oauth_authorize, oauth_callback},
    identity::{HttpIdentityStore, IdentityStore},
    oauth::TokenClient,
    settings::RelaySettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables.
    // This also loads the .env file and initializes the logger.
    let settings = RelaySettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let token_client = TokenClient::new(&settings.auth_server)
        .map_err(|e| std::io::Error::other(format!("Failed to build token exchange client: {e}")))?;

    let identity_store: Arc<dyn IdentityStore> = Arc::new(
        HttpIdentityStore::new(&settings.identity_store).map_err(|e| {
            std::io::Error::other(format!("Failed to build identity store client: {e}"))
        })?,
    );

    start_server(settings, token_client, identity_store).await
}

/// Start the relay server
///
/// # Errors
///
/// Returns an error if server binding or startup fails.
async fn start_server(
    settings: RelaySettings,
    token_client: TokenClient,
    identity_store: Arc<dyn IdentityStore>,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(token_client.clone()))
            .app_data(web::Data::from(identity_store.clone()))
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // PKCE flow endpoints
        .route("/auth/authorize", web::get().to(oauth_authorize))
        .route("/auth/callback", web::get().to(oauth_callback))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &RelaySettings) {
    println!("Starting Authrelay PKCE relay on http://{bind_address}");
    println!();
    println!("Auth endpoints:");
    println!("  GET  /auth/authorize - Redirect to the authorization server with a PKCE challenge");
    println!("  GET  /auth/callback  - Exchange the authorization code for an auth token");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping           - Health check");
    println!();
    println!("Authorization server: {}", settings.auth_server.base_url);
    println!(
        "Identity store:       {} (branch {})",
        settings.identity_store.base_url, settings.identity_store.branch
    );
}
