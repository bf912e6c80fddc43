//! Cart session tokens.
//!
//! Every request through the API carries an opaque cart session token in an
//! HttpOnly cookie. The middleware assigns a fresh token on first contact and
//! exposes it to handlers as a [`CartSession`] request extension; the token is
//! unrelated to account authentication.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::config::AppConfig;

const SESSION_TOKEN_LEN: usize = 21;

/// Opaque session token identifying one cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSession(pub String);

impl CartSession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = axum::http::StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The middleware always inserts a session; a miss means the router is
        // wired without it.
        parts
            .extensions
            .get::<CartSession>()
            .cloned()
            .ok_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Reads the cart session cookie, minting a new token when absent, and sets
/// the cookie on the way out for fresh sessions.
pub async fn cart_session_middleware(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = cookie_value(request.headers(), &config.cart_cookie_name);
    let is_new = existing.is_none();
    let token = existing.unwrap_or_else(generate_session_token);

    request.extensions_mut().insert(CartSession(token.clone()));

    let mut response = next.run(request).await;

    if is_new {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            config.cart_cookie_name, token, config.cart_cookie_max_age_secs
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(_) => {
                return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    response
}

/// Extract a cookie value from the request headers
fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(header::COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                if let Some(value) = parts.next() {
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }
    None
}

fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn generated_tokens_are_opaque_and_distinct() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), SESSION_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn cookie_value_parses_multi_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; atelier_cart=tok123; lang=en".parse().unwrap(),
        );

        assert_eq!(
            cookie_value(&headers, "atelier_cart"),
            Some("tok123".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "atelier_cart=".parse().unwrap());
        assert_eq!(cookie_value(&headers, "atelier_cart"), None);
    }
}
