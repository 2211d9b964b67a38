pub mod api;
pub mod auth;
pub mod books;
pub mod pages;
pub mod viewer;

use askama::Template;
use axum::response::Html;

use crate::errors::AppError;
use crate::models::AuthContext;

pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

/// Backend ids are opaque tokens; anything else never reaches a backend URL.
pub fn valid_id(id: &str) -> Result<&str, AppError> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(id)
    } else {
        Err(AppError::NotFound("Book".to_string()))
    }
}

/// Backend credential of a signed-in caller.
pub fn require_bearer(ctx: &AuthContext) -> Result<&str, AppError> {
    ctx.bearer().ok_or(AppError::Unauthorized)
}
