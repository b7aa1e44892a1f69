use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::{anyhow, Result};

/// Cookie carrying the PKCE verifier between the authorize and callback legs
pub const VERIFIER_COOKIE: &str = "edgedb-pkce-verifier";
/// Cookie carrying the exchanged auth token to downstream application routes
pub const AUTH_COOKIE: &str = "edgedb-auth-token";

/// Build the verifier cookie set by the authorize leg.
///
/// HttpOnly keeps the verifier away from page scripts; the bounded Max-Age
/// keeps a captured cookie from staying valid past the expected
/// authorization round trip.
#[must_use]
pub fn verifier_cookie(verifier: String, secure: bool, ttl_minutes: u64) -> Cookie<'static> {
    Cookie::build(VERIFIER_COOKIE, verifier)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::minutes(i64::try_from(ttl_minutes).unwrap_or(10)))
        .finish()
}

/// Build the session cookie issued by the callback leg on success
#[must_use]
pub fn auth_token_cookie(auth_token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, auth_token)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .finish()
}

/// Expire the verifier cookie once the callback has consumed it
#[must_use]
pub fn expired_verifier_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build(VERIFIER_COOKIE, "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(-1))
        .finish()
}

/// Helper function to extract a cookie value from an `HttpRequest`
///
/// # Errors
///
/// Returns an error if the named cookie is absent.
pub fn extract_cookie_value(req: &HttpRequest, cookie_name: &str) -> Result<String> {
    req.cookie(cookie_name)
        .ok_or_else(|| anyhow!("Cookie not found: {cookie_name}"))
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_verifier_cookie_attributes() {
        let cookie = verifier_cookie("secret".to_string(), true, 10);
        assert_eq!(cookie.name(), VERIFIER_COOKIE);
        assert_eq!(cookie.value(), "secret");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(10)));
    }

    #[test]
    fn test_auth_token_cookie_is_session_scoped() {
        let cookie = auth_token_cookie("tok1".to_string(), true);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "tok1");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), None);
    }

    #[test]
    fn test_expired_verifier_cookie_clears_value() {
        let cookie = expired_verifier_cookie(true);
        assert_eq!(cookie.name(), VERIFIER_COOKIE);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().is_negative());
    }

    #[test]
    fn test_extract_cookie_value() {
        let req = TestRequest::get()
            .cookie(Cookie::new(VERIFIER_COOKIE, "secret"))
            .to_http_request();
        assert_eq!(
            extract_cookie_value(&req, VERIFIER_COOKIE).unwrap(),
            "secret"
        );
        assert!(extract_cookie_value(&req, AUTH_COOKIE).is_err());
    }
}
