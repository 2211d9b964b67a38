use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{pages::{IndexPage, LoginPage, RegisterPage}, render};
use crate::{
    dto::auth::{AuthPageQuery, GoogleCallbackQuery, LoginForm, RegisterRequest},
    errors::{AppError, PageError},
    middleware::auth::{clear_cookie, cookie_value, session_cookie, OAUTH_STATE_COOKIE, SESSION_COOKIE},
    models::AuthContext,
    services::auth::AuthError,
    AppState,
};

const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

pub async fn index_page(Extension(ctx): Extension<AuthContext>) -> Result<Html<String>, PageError> {
    let page = IndexPage {
        current_user: ctx.username().map(str::to_string),
    };
    Ok(render(&page)?)
}

/// Message for the `?error=` codes used by the Google redirect flow.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "state" => "Your sign-in session expired. Please try again.",
        "config" => "Google sign-in is not available right now.",
        "google" => "Failed to sign in with Google",
        _ => "An error occurred during sign in",
    }
}

fn login_form(state: &AppState, username: &str, error: Option<String>) -> LoginPage {
    LoginPage {
        current_user: None,
        error,
        username: username.to_string(),
        google_enabled: state.config.google.is_configured(),
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<AuthPageQuery>,
) -> Result<Response, PageError> {
    if ctx.is_logged_in() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let error = query.error.as_deref().map(|code| login_error_message(code).to_string());
    Ok(render(&login_form(&state, "", error))?.into_response())
}

/// Sets the session cookie and sends the browser to the dashboard.
fn signed_in(state: &AppState, session: &str) -> Response {
    let max_age = state.auth.session_ttl().num_seconds();
    let cookie = session_cookie(session, max_age, state.config.auth.cookie_secure);
    (
        AppendHeaders([
            (SET_COOKIE, cookie),
            (SET_COOKIE, clear_cookie(OAUTH_STATE_COOKIE)),
        ]),
        Redirect::to("/dashboard"),
    )
        .into_response()
}

pub async fn login_handler(
    State(state): State<AppState>,
    Form(login_form_data): Form<LoginForm>,
) -> Result<Response, PageError> {
    info!("Login attempt for account: {}", login_form_data.username);

    match state
        .auth
        .login_with_password(&login_form_data.username, &login_form_data.password)
        .await
    {
        Ok(session) => Ok(signed_in(&state, &session)),
        Err(AuthError::InvalidCredentials) => {
            let page = login_form(
                &state,
                &login_form_data.username,
                Some(AuthError::InvalidCredentials.to_string()),
            );
            Ok((StatusCode::UNAUTHORIZED, render(&page)?).into_response())
        }
        Err(e) => {
            warn!("Login failed: {}", e);
            let page = login_form(
                &state,
                &login_form_data.username,
                Some("Sign in failed. Please try again.".to_string()),
            );
            Ok((StatusCode::BAD_GATEWAY, render(&page)?).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, String> {
        let username = self.username.trim();
        let email = self.email.trim();
        if username.is_empty() {
            return Err("Username is required".to_string());
        }
        if !email.contains('@') {
            return Err("Please enter a valid email address".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }

        let full_name = self.full_name.trim();
        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            full_name: (!full_name.is_empty()).then(|| full_name.to_string()),
        })
    }
}

fn register_form(state: &AppState, form: Option<&RegisterForm>, error: Option<String>) -> RegisterPage {
    RegisterPage {
        current_user: None,
        error,
        username: form.map(|f| f.username.clone()).unwrap_or_default(),
        email: form.map(|f| f.email.clone()).unwrap_or_default(),
        full_name: form.map(|f| f.full_name.clone()).unwrap_or_default(),
        google_enabled: state.config.google.is_configured(),
    }
}

pub async fn register_page(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response, PageError> {
    if ctx.is_logged_in() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(render(&register_form(&state, None, None))?.into_response())
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, PageError> {
    let request = match form.validate() {
        Ok(request) => request,
        Err(message) => {
            let page = register_form(&state, Some(&form), Some(message));
            return Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response());
        }
    };

    info!("Registration attempt for account: {}", request.username);
    match state.auth.register(&request).await {
        Ok(session) => Ok(signed_in(&state, &session)),
        Err(e) => {
            let (status, message) = match AppError::from(e) {
                AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),
                other => {
                    warn!("Registration failed: {}", other);
                    (other.status_code(), "Registration failed. Please try again.".to_string())
                }
            };
            let page = register_form(&state, Some(&form), Some(message));
            Ok((status, render(&page)?).into_response())
        }
    }
}

pub async fn logout(Extension(ctx): Extension<AuthContext>) -> Response {
    if let Some(user) = ctx.username() {
        info!("Logging out {}", user);
    }
    (
        AppendHeaders([(SET_COOKIE, clear_cookie(SESSION_COOKIE))]),
        Redirect::to("/"),
    )
        .into_response()
}

/// Starts the Google authorization-code flow.
pub async fn google_start(State(state): State<AppState>) -> Response {
    let oauth_state = Uuid::new_v4().simple().to_string();

    match state.auth.google_authorize_url(&oauth_state) {
        Ok(url) => {
            let cookie = format!(
                "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
                OAUTH_STATE_COOKIE, oauth_state, OAUTH_STATE_MAX_AGE_SECS
            );
            (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(&url)).into_response()
        }
        Err(e) => {
            warn!("Cannot start Google sign-in: {}", e);
            Redirect::to("/login?error=config").into_response()
        }
    }
}

pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GoogleCallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        warn!("Google returned an error: {}", error);
        return Redirect::to("/login?error=google").into_response();
    }

    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    if expected.is_none() || expected != query.state {
        warn!("Google callback state mismatch");
        return Redirect::to("/login?error=state").into_response();
    }

    let Some(code) = query.code else {
        return Redirect::to("/login?error=google").into_response();
    };

    match state.auth.login_with_google_code(&code).await {
        Ok(session) => signed_in(&state, &session),
        Err(e) => {
            warn!("Google sign-in failed: {}", e);
            Redirect::to("/login?error=google").into_response()
        }
    }
}
