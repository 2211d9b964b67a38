use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::{errors::codes, models::AuthContext, AppState};

pub const SESSION_COOKIE: &str = "rhymera_session";
pub const OAUTH_STATE_COOKIE: &str = "rhymera_oauth_state";

pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Resolves the caller and stores an `AuthContext` in request extensions.
    /// Never rejects; gating is left to `require_login`.
    pub async fn auth_middleware(
        State(state): State<AppState>,
        mut request: Request,
        next: Next,
    ) -> Response {
        let token = extract_token_from_headers(request.headers());
        let ctx = state.auth.context_for(token.as_deref());
        request.extensions_mut().insert(ctx);

        next.run(request).await
    }

    pub async fn require_login(request: Request, next: Next) -> Response {
        let logged_in = request
            .extensions()
            .get::<AuthContext>()
            .is_some_and(AuthContext::is_logged_in);

        if logged_in {
            return next.run(request).await;
        }

        tracing::debug!("require_login: rejecting anonymous request to {}", request.uri().path());
        create_unauthorized_response(&request)
    }
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    // Try Authorization header first
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        tracing::debug!("Found Bearer token in Authorization header");
        return Some(token.trim().to_string());
    }

    cookie_value(headers, SESSION_COOKIE)
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

fn is_api_request(request: &Request) -> bool {
    request.uri().path().starts_with("/api/")
        || request
            .headers()
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json"))
}

fn create_unauthorized_response(request: &Request) -> Response {
    if is_api_request(request) {
        let body = json!({
            "error": codes::UNAUTHORIZED,
            "message": "Authentication required"
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    } else {
        // Browsers go to the login page with any stale session dropped
        (
            [(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))],
            Redirect::to("/login"),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(header::COOKIE, HeaderValue::from_static("rhymera_session=zzz"));
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; rhymera_session=tok123; lang=en"),
        );
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("tok123"));
        assert_eq!(cookie_value(&headers, "lang").as_deref(), Some("en"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("rhymera_session="));
        assert_eq!(extract_token_from_headers(&headers), None);
    }

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("tok", 1800, true);
        assert!(cookie.starts_with("rhymera_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=1800"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!session_cookie("tok", 1800, false).contains("Secure"));
    }
}
