use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    pages::{BookSummary, BookTypeOption, CreateBookPage, DashboardPage},
    render, require_bearer, valid_id,
};
use crate::{
    dto::book::{BookListQuery, BookRequest, SaveBookRequest},
    errors::{AppError, PageError},
    models::{AuthContext, BookType},
    services::{backend::BOOKS_PER_PAGE, drafts::Draft},
    AppState,
};

pub const MIN_PAGES: u32 = 1;
pub const MAX_PAGES: u32 = 20;
pub const DEFAULT_PAGES: u32 = 5;

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<BookListQuery>,
) -> Result<Response, PageError> {
    let bearer = require_bearer(&ctx)?;
    let saved = state.backend.list_books(bearer, query.page).await?;
    let has_next = saved.len() == BOOKS_PER_PAGE as usize;

    let books = saved
        .iter()
        .map(|book| BookSummary {
            id: book.id.clone(),
            title: book.display_title().to_string(),
            page_count: book.page_count(),
            created_at: book.created_at.clone(),
        })
        .collect();

    let page = DashboardPage {
        current_user: ctx.username().map(str::to_string),
        books,
        page: query.page,
        has_next,
    };
    Ok(render(&page)?.into_response())
}

/// Raw form fields; kept as strings so a bad submission can be echoed back.
#[derive(Debug, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub book_type: String,
    #[serde(default)]
    pub pages: String,
}

pub fn validate_book_request(form: &BookForm) -> Result<BookRequest, String> {
    let topic = form.topic.trim();
    if topic.is_empty() {
        return Err("Please enter a topic for your book".to_string());
    }

    let book_type = if form.book_type.trim().is_empty() {
        BookType::default()
    } else {
        form.book_type.parse::<BookType>().map_err(|e| e.to_string())?
    };

    let pages = match form.pages.trim() {
        "" => DEFAULT_PAGES,
        raw => raw
            .parse::<u32>()
            .map_err(|_| "Number of pages must be a whole number".to_string())?,
    };
    if !(MIN_PAGES..=MAX_PAGES).contains(&pages) {
        return Err(format!(
            "Number of pages must be between {} and {}",
            MIN_PAGES, MAX_PAGES
        ));
    }

    Ok(BookRequest {
        pages,
        book_type,
        topic: topic.to_string(),
    })
}

fn create_form(ctx: &AuthContext, form: &BookForm, error: Option<String>) -> CreateBookPage {
    let selected = form.book_type.parse().unwrap_or_default();
    let pages = form.pages.trim().parse().unwrap_or(DEFAULT_PAGES);
    CreateBookPage {
        current_user: ctx.username().map(str::to_string),
        error,
        topic: form.topic.clone(),
        pages,
        satirical: BookType::is_satirical(&selected),
        book_types: BookTypeOption::all(selected),
        min_pages: MIN_PAGES,
        max_pages: MAX_PAGES,
    }
}

pub async fn new_book_page(Extension(ctx): Extension<AuthContext>) -> Result<Response, PageError> {
    let page = create_form(&ctx, &BookForm::default(), None);
    Ok(render(&page)?.into_response())
}

pub async fn create_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<BookForm>,
) -> Result<Response, PageError> {
    let request = match validate_book_request(&form) {
        Ok(request) => request,
        Err(message) => {
            let page = create_form(&ctx, &form, Some(message));
            return Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response());
        }
    };

    let content = match state.backend.generate_book(ctx.bearer(), &request).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Book generation failed: {}", e);
            let page = create_form(
                &ctx,
                &form,
                Some("Failed to generate book. Please try again.".to_string()),
            );
            return Ok((StatusCode::BAD_GATEWAY, render(&page)?).into_response());
        }
    };

    if let Some(id) = content.saved_book_id.as_deref().filter(|id| valid_id(id).is_ok()) {
        info!("Generated book {} was saved by the backend", id);
        return Ok(Redirect::to(&format!("/books/{}", id)).into_response());
    }

    let owner = ctx.username().unwrap_or_default().to_string();
    let title = content
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(request.topic);
    let draft_id = state
        .drafts
        .insert(Draft {
            owner,
            title,
            content,
        })
        .await;
    Ok(Redirect::to(&format!("/drafts/{}", draft_id)).into_response())
}

pub async fn delete_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let bearer = require_bearer(&ctx)?;
    let id = valid_id(&id)?;
    state.backend.delete_book(bearer, id).await?;
    info!("Deleted book {}", id);
    Ok(Redirect::to("/dashboard").into_response())
}

/// Persists a draft and moves the browser to the saved copy.
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(draft_id): Path<Uuid>,
) -> Result<Response, PageError> {
    let bearer = require_bearer(&ctx)?;
    let owner = ctx.username().unwrap_or_default();

    let draft = state
        .drafts
        .get(draft_id, owner)
        .await
        .ok_or_else(|| AppError::NotFound("Draft".to_string()))?;

    let request = SaveBookRequest {
        user_id: String::new(),
        title: draft.title,
        content: draft.content,
    };
    let saved = state.backend.save_book(bearer, &request).await?;
    let id = valid_id(&saved.id)?.to_string();

    state.drafts.remove(draft_id, owner).await;
    info!("Saved draft {} as book {}", draft_id, id);
    Ok(Redirect::to(&format!("/books/{}", id)).into_response())
}
