use actix_web::{HttpResponse, Result};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
}

/// Health check endpoint
///
/// # Errors
///
/// Never fails; the `Result` matches the handler signature convention.
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Authrelay PKCE relay is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
