use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use utoipa::OpenApi;

use super::{require_bearer, valid_id};
use crate::{
    dto::book::{parse_spread, BookContentDto, BookPageDto, SavedBookDto},
    errors::AppError,
    models::{AuthContext, Book, BookType},
    viewer::{SpreadView, Viewer},
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(get_book, delete_book, get_spread, export_pdf, get_image, health),
    components(schemas(SavedBookDto, BookContentDto, BookPageDto, BookType)),
    tags(
        (name = "books", description = "Saved book proxy and viewer API"),
        (name = "images", description = "Illustration proxy")
    )
)]
pub struct ApiDoc;

pub fn pdf_response(id: &str, bytes: Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"book-{}.pdf\"", id),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Get a saved book
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Saved book id")),
    responses(
        (status = 200, description = "Book record", body = SavedBookDto),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<SavedBookDto>, AppError> {
    let bearer = require_bearer(&ctx)?;
    let book = state.backend.get_book(bearer, valid_id(&id)?).await?;
    Ok(Json(book))
}

/// Delete a saved book
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Saved book id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let bearer = require_bearer(&ctx)?;
    state.backend.delete_book(bearer, valid_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render one spread of a saved book
///
/// The cursor is clamped to the book, so any value yields a valid spread.
#[utoipa::path(
    get,
    path = "/api/books/{id}/spreads/{cursor}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Saved book id"),
        ("cursor" = String, Path, description = "Spread index, 0 is the cover; out-of-range values are clamped")
    ),
    responses(
        (status = 200, description = "Spread with resolved illustrations", body = serde_json::Value),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_spread(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((id, cursor)): Path<(String, String)>,
) -> Result<Json<SpreadView>, AppError> {
    let bearer = require_bearer(&ctx)?;
    let id = valid_id(&id)?;
    let book = Book::from(state.backend.get_book(bearer, id).await?);

    let mut viewer = Viewer::at(book, parse_spread(&cursor));
    if state.exports.is_in_flight(id) {
        viewer.export_mut().begin();
    }
    Ok(Json(viewer.render(&state.config.backend.images_base)))
}

/// Export a saved book as PDF
#[utoipa::path(
    get,
    path = "/api/books/{id}/pdf",
    tag = "books",
    params(("id" = String, Path, description = "Saved book id")),
    responses(
        (status = 200, description = "PDF document (application/pdf)"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "An export for this book is already running"),
        (status = 502, description = "Backend export failed")
    )
)]
pub async fn export_pdf(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let bearer = require_bearer(&ctx)?;
    let id = valid_id(&id)?;

    let _guard = state
        .exports
        .try_begin(id)
        .ok_or_else(|| AppError::Conflict("An export for this book is already running".to_string()))?;

    let bytes = state.backend.export_pdf(bearer, id).await?;
    Ok(pdf_response(id, bytes))
}

/// Fetch an illustration
#[utoipa::path(
    get,
    path = "/api/images/{file_id}",
    tag = "images",
    params(("file_id" = String, Path, description = "Backend image file id")),
    responses(
        (status = 200, description = "Image bytes with the backend's content type"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let file_id = valid_id(&file_id).map_err(|_| AppError::NotFound("Image".to_string()))?;
    let image = state.backend.fetch_image(file_id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound("Image".to_string())
        } else {
            e.into()
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
        ],
        image.bytes,
    )
        .into_response())
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": state.config.app.name,
        "version": state.config.app.version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_is_an_attachment() {
        let response = pdf_response("abc", Bytes::from_static(b"%PDF-1.4"));
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"book-abc.pdf\""
        );
    }

    #[test]
    fn openapi_lists_book_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/books/{id}/spreads/{cursor}"));
        assert!(doc.paths.paths.contains_key("/api/images/{file_id}"));
    }
}
