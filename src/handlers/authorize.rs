//! Authorize leg of the PKCE flow

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error};

use crate::oauth::{endpoint_url, generate_pkce, AuthorizeQuery};
use crate::settings::RelaySettings;
use crate::utils::cookies::verifier_cookie;

/// Redirects OAuth requests to the authorization server's authorize
/// endpoint with the PKCE challenge, and saves the PKCE verifier in an
/// HttpOnly cookie for later retrieval by the callback.
pub async fn oauth_authorize(
    query: web::Query<AuthorizeQuery>,
    req: HttpRequest,
    settings: web::Data<RelaySettings>,
) -> HttpResponse {
    let provider = match query.provider.as_deref() {
        Some(provider) if !provider.is_empty() => provider,
        _ => {
            debug!("no provider found in query parameters");
            return HttpResponse::BadRequest()
                .content_type("text/plain")
                .body("Must provide a 'provider' value in the query parameters");
        }
    };
    debug!("authorize request for provider {provider}");

    let pkce = generate_pkce();

    // Both redirect targets point back at this service, derived from the
    // host the user agent is actually talking to. The authorization server
    // echoes one of them, and the isSignUp marker on the second is how
    // sign-up is distinguished from sign-in at callback time.
    let callback_url = {
        let conn = req.connection_info();
        format!("{}://{}/auth/callback", conn.scheme(), conn.host())
    };

    let mut redirect = match endpoint_url(&settings.auth_server.base_url, "authorize") {
        Ok(url) => url,
        Err(e) => {
            error!("invalid authorization server base URL: {e}");
            return HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body("Authorization server URL is misconfigured");
        }
    };
    redirect
        .query_pairs_mut()
        .append_pair("provider", provider)
        .append_pair("challenge", &pkce.challenge)
        .append_pair("redirect_to", &callback_url)
        .append_pair(
            "redirect_to_on_signup",
            &format!("{callback_url}?isSignUp=true"),
        );

    debug!("redirecting to {redirect}");
    HttpResponse::Found()
        .cookie(verifier_cookie(
            pkce.verifier,
            settings.cookies.secure,
            settings.cookies.verifier_ttl_minutes,
        ))
        .append_header(("Location", redirect.to_string()))
        .finish()
}
