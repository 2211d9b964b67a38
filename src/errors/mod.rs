//! Application error type and its HTTP mapping.
//!
//! API handlers return `AppError`, rendered as `{"error": CODE, "message": ...}`.
//! Page handlers wrap it in `PageError`, rendered as an HTML error page.

use askama::Template;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::handlers::pages::ErrorPage;
use crate::middleware::auth::{clear_cookie, SESSION_COOKIE};
use crate::services::{auth::AuthError, backend::BackendError};

pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Backend request failed: {0}")]
    Upstream(BackendError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err.status().map(|s| s.as_u16()) {
            Some(401) => AppError::Unauthorized,
            Some(404) => AppError::NotFound("Book".to_string()),
            Some(400) | Some(422) => match err {
                BackendError::Status { message, .. } => AppError::Validation(message),
                other => AppError::Upstream(other),
            },
            _ => {
                tracing::error!("Backend error: {}", err);
                AppError::Upstream(err)
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::Backend(e) => e.into(),
            AuthError::GoogleNotConfigured | AuthError::Google(_) => {
                tracing::warn!("{}", err);
                AppError::Validation(err.to_string())
            }
            AuthError::Token(e) => AppError::Internal(format!("Session error: {}", e)),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        tracing::error!("Template error: {}", err);
        AppError::Internal("Template rendering failed".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Error shown to a browser as a page.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<BackendError> for PageError {
    fn from(err: BackendError) -> Self {
        PageError(err.into())
    }
}

impl From<askama::Error> for PageError {
    fn from(err: askama::Error) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        // Drop the session too; a cookie the backend no longer accepts
        // would otherwise send /login straight back to the dashboard
        if matches!(err, AppError::Unauthorized) {
            return (
                [(header::SET_COOKIE, clear_cookie(SESSION_COOKIE))],
                Redirect::to("/login"),
            )
                .into_response();
        }

        let status = err.status_code();
        let page = ErrorPage {
            status: status.as_u16(),
            heading: match err {
                AppError::NotFound(ref what) => format!("{} not found", what),
                _ => "Something went wrong".to_string(),
            },
            message: err.to_string(),
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, err.to_string()).into_response()
            }
        }
    }
}
