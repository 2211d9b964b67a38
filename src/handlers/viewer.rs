use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use super::{api::pdf_response, pages::ViewerPage, render, require_bearer, valid_id};
use crate::{
    dto::book::{lenient_spread, ViewerQuery},
    errors::{AppError, PageError},
    models::{AuthContext, Book},
    viewer::{ExportTrigger, Viewer},
    AppState,
};

/// Outcome flag carried back to the viewer after an export attempt.
const EXPORT_FAILED: &str = "failed";
const EXPORT_BUSY: &str = "busy";

/// Applies server-side export state to a freshly opened viewer.
fn sync_export(viewer: &mut Viewer, in_flight: bool, flag: Option<&str>) {
    let trigger = viewer.export_mut();
    if in_flight {
        trigger.begin();
        return;
    }
    if flag == Some(EXPORT_FAILED) && trigger.begin() {
        trigger.finish(Err(ExportTrigger::FAILURE_MESSAGE));
    }
}

fn viewer_page(
    state: &AppState,
    ctx: &AuthContext,
    viewer: &Viewer,
    base_path: String,
    export_path: Option<String>,
    save_path: Option<String>,
) -> ViewerPage {
    ViewerPage {
        current_user: ctx.username().map(str::to_string),
        view: viewer.render(&state.config.backend.images_base),
        base_path,
        export_path,
        save_path,
    }
}

pub async fn view_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> Result<Response, PageError> {
    let bearer = require_bearer(&ctx)?;
    let id = valid_id(&id)?;
    let book = Book::from(state.backend.get_book(bearer, id).await?);

    let mut viewer = Viewer::at(book, query.spread);
    sync_export(
        &mut viewer,
        state.exports.is_in_flight(id),
        query.export.as_deref(),
    );

    let cursor = viewer.pagination().cursor();
    let page = viewer_page(
        &state,
        &ctx,
        &viewer,
        format!("/books/{}", id),
        Some(format!("/books/{}/export?spread={}", id, cursor)),
        None,
    );
    Ok(render(&page)?.into_response())
}

pub async fn view_draft(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(draft_id): Path<Uuid>,
    Query(query): Query<ViewerQuery>,
) -> Result<Response, PageError> {
    let owner = ctx.username().unwrap_or_default();
    let draft = state
        .drafts
        .get(draft_id, owner)
        .await
        .ok_or_else(|| AppError::NotFound("Draft".to_string()))?;

    let book = draft.content.into_book(None, Some(draft.title));
    let viewer = Viewer::at(book, query.spread);

    // A backend-assigned id can only come from a saved record
    let export_path = viewer
        .export()
        .is_visible()
        .then(|| viewer.book().saved_id.clone())
        .flatten()
        .map(|id| format!("/books/{}/export", id));

    let page = viewer_page(
        &state,
        &ctx,
        &viewer,
        format!("/drafts/{}", draft_id),
        export_path,
        Some(format!("/drafts/{}/save", draft_id)),
    );
    Ok(render(&page)?.into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default, deserialize_with = "lenient_spread")]
    pub spread: usize,
}

/// Browser export: downloads the PDF, or returns to the same spread with a
/// flag the viewer turns into a failure message.
pub async fn export_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, PageError> {
    let bearer = require_bearer(&ctx)?;
    let id = valid_id(&id)?;
    let back = |flag: &str| format!("/books/{}?spread={}&export={}", id, query.spread, flag);

    let Some(_guard) = state.exports.try_begin(id) else {
        return Ok(Redirect::to(&back(EXPORT_BUSY)).into_response());
    };

    match state.backend.export_pdf(bearer, id).await {
        Ok(bytes) => Ok(pdf_response(id, bytes)),
        Err(e) if e.is_unauthorized() => Err(AppError::Unauthorized.into()),
        Err(e) => {
            warn!("PDF export for {} failed: {}", id, e);
            Ok(Redirect::to(&back(EXPORT_FAILED)).into_response())
        }
    }
}
