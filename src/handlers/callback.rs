//! Callback leg of the PKCE flow
//!
//! Recovers the verifier from the cookie written by the authorize leg,
//! exchanges the authorization code for an auth token, provisions the
//! account on first sign-in, and hands the token to the browser as an
//! HttpOnly cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};

use crate::identity::{IdentityStore, ProvisioningError};
use crate::oauth::{CallbackQuery, TokenClient, TokenExchangeError};
use crate::settings::RelaySettings;
use crate::utils::cookies::{
    auth_token_cookie, expired_verifier_cookie, extract_cookie_value, VERIFIER_COOKIE,
};

/// Terminal states of one callback request
///
/// Every request reaches exactly one of these; there are no retries and no
/// re-entrancy anywhere in the flow.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// The authorization server reported an error instead of a code
    UpstreamDenied { error: String },
    /// No verifier cookie accompanied the request, so the exchange cannot
    /// be proven to originate from the agent that started the flow
    VerifierMissing,
    /// The token exchange failed or returned an unusable payload
    ExchangeFailed(TokenExchangeError),
    /// The first-sign-in provisioning write failed; no session is issued
    ProvisioningFailed(ProvisioningError),
    /// Token obtained, and the account provisioned when requested
    Complete { auth_token: String },
}

/// Handles the PKCE callback: exchanges the `code` and cookie-held verifier
/// for an auth token, optionally provisioning the account, and sets the
/// auth token as an HttpOnly cookie.
pub async fn oauth_callback(
    query: web::Query<CallbackQuery>,
    req: HttpRequest,
    settings: web::Data<RelaySettings>,
    token_client: web::Data<TokenClient>,
    identity_store: web::Data<dyn IdentityStore>,
) -> HttpResponse {
    let verifier = extract_cookie_value(&req, VERIFIER_COOKIE).ok();
    let outcome = run_callback(
        &query,
        verifier,
        token_client.get_ref(),
        identity_store.get_ref(),
    )
    .await;
    into_response(outcome, &settings)
}

/// Drive one callback request to its terminal state
async fn run_callback(
    query: &CallbackQuery,
    verifier: Option<String>,
    token_client: &TokenClient,
    identity_store: &dyn IdentityStore,
) -> CallbackOutcome {
    let Some(code) = query.code.as_deref() else {
        return CallbackOutcome::UpstreamDenied {
            error: query.error.clone().unwrap_or_default(),
        };
    };

    let Some(verifier) = verifier else {
        error!(
            "could not find the PKCE verifier cookie; the callback may come from a \
             different user agent than the one that started the flow"
        );
        return CallbackOutcome::VerifierMissing;
    };

    let auth_token = match token_client.exchange(code, &verifier).await {
        Ok(auth_token) => auth_token,
        Err(e) => {
            error!("token exchange failed: {e}");
            return CallbackOutcome::ExchangeFailed(e);
        }
    };

    if query.signup_requested() {
        info!("creating new user for first sign-in");
        if let Err(e) = identity_store.provision_identity(&auth_token).await {
            error!("provisioning write failed: {e}");
            return CallbackOutcome::ProvisioningFailed(e);
        }
    }

    debug!("callback complete");
    CallbackOutcome::Complete { auth_token }
}

/// Map a terminal state to its HTTP response. The verifier cookie is
/// expired on every path that consumed it.
fn into_response(outcome: CallbackOutcome, settings: &RelaySettings) -> HttpResponse {
    let secure = settings.cookies.secure;
    match outcome {
        CallbackOutcome::UpstreamDenied { error } => HttpResponse::BadRequest()
            .content_type("text/plain")
            .body(format!("Error from the auth server: {error}")),
        CallbackOutcome::VerifierMissing => HttpResponse::BadRequest()
            .content_type("text/plain")
            .body(
                "Could not find 'verifier' in the cookie store. Is this the same \
                 user agent/browser that started the authorization flow?",
            ),
        CallbackOutcome::ExchangeFailed(e) => {
            let body = match e {
                TokenExchangeError::Upstream { body, .. }
                | TokenExchangeError::Malformed { body } => body,
                TokenExchangeError::Transport(e) => e.to_string(),
            };
            HttpResponse::BadRequest()
                .cookie(expired_verifier_cookie(secure))
                .content_type("text/plain")
                .body(format!("Error from the auth server: {body}"))
        }
        CallbackOutcome::ProvisioningFailed(e) => HttpResponse::BadGateway()
            .cookie(expired_verifier_cookie(secure))
            .content_type("text/plain")
            .body(format!("Failed to provision the new account: {e}")),
        CallbackOutcome::Complete { auth_token } => HttpResponse::NoContent()
            .cookie(auth_token_cookie(auth_token, secure))
            .cookie(expired_verifier_cookie(secure))
            .finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockIdentityStore, TestFixtures};
    use crate::utils::cookies::AUTH_COOKIE;

    fn query(code: Option<&str>, error: Option<&str>, is_sign_up: Option<&str>) -> CallbackQuery {
        CallbackQuery {
            code: code.map(String::from),
            error: error.map(String::from),
            is_sign_up: is_sign_up.map(String::from),
        }
    }

    #[actix_web::test]
    async fn test_missing_code_reports_upstream_error() {
        let token_client = TestFixtures::token_client("http://127.0.0.1:1");
        let store = MockIdentityStore::new();

        let outcome = run_callback(
            &query(None, Some("access_denied"), None),
            Some("secret".to_string()),
            &token_client,
            store.as_ref(),
        )
        .await;

        match outcome {
            CallbackOutcome::UpstreamDenied { error } => assert_eq!(error, "access_denied"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(store.recorded_tokens().is_empty());
    }

    #[actix_web::test]
    async fn test_missing_verifier_is_terminal() {
        let token_client = TestFixtures::token_client("http://127.0.0.1:1");
        let store = MockIdentityStore::new();

        let outcome = run_callback(
            &query(Some("abc"), None, None),
            None,
            &token_client,
            store.as_ref(),
        )
        .await;

        assert!(matches!(outcome, CallbackOutcome::VerifierMissing));
        assert!(store.recorded_tokens().is_empty());
    }

    #[test]
    fn test_upstream_denied_maps_to_400_with_no_cookies() {
        let settings = TestFixtures::settings();
        let response = into_response(
            CallbackOutcome::UpstreamDenied {
                error: "access_denied".to_string(),
            },
            &settings,
        );
        assert_eq!(response.status(), 400);
        assert!(response.cookies().next().is_none());
    }

    #[test]
    fn test_exchange_failure_maps_to_400_and_expires_verifier() {
        let settings = TestFixtures::settings();
        let response = into_response(
            CallbackOutcome::ExchangeFailed(TokenExchangeError::Upstream {
                status: 400,
                body: "invalid_grant".to_string(),
            }),
            &settings,
        );
        assert_eq!(response.status(), 400);

        let cleared = response
            .cookies()
            .find(|c| c.name() == VERIFIER_COOKIE)
            .expect("verifier cookie should be expired");
        assert_eq!(cleared.value(), "");
        assert!(response.cookies().all(|c| c.name() != AUTH_COOKIE));
    }

    #[test]
    fn test_provisioning_failure_maps_to_502_without_session_cookie() {
        let settings = TestFixtures::settings();
        let response = into_response(
            CallbackOutcome::ProvisioningFailed(ProvisioningError::Store {
                status: 500,
                body: "write rejected".to_string(),
            }),
            &settings,
        );
        assert_eq!(response.status(), 502);
        assert!(response.cookies().all(|c| c.name() != AUTH_COOKIE));
    }

    #[test]
    fn test_completion_maps_to_204_with_session_cookie() {
        let settings = TestFixtures::settings();
        let response = into_response(
            CallbackOutcome::Complete {
                auth_token: "tok1".to_string(),
            },
            &settings,
        );
        assert_eq!(response.status(), 204);

        let session = response
            .cookies()
            .find(|c| c.name() == AUTH_COOKIE)
            .expect("session cookie should be set");
        assert_eq!(session.value(), "tok1");
        assert_eq!(session.http_only(), Some(true));

        let cleared = response
            .cookies()
            .find(|c| c.name() == VERIFIER_COOKIE)
            .expect("verifier cookie should be expired");
        assert_eq!(cleared.value(), "");
    }
}
