pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;
pub mod viewer;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;

use handlers::{api, api::ApiDoc, auth, books, viewer as viewer_pages};
use middleware::AuthMiddleware;
use services::{
    auth::AuthService,
    backend::{BackendClient, BackendError},
    drafts::DraftStore,
    exports::ExportTracker,
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Client for the generation backend
    pub backend: BackendClient,
    pub auth: AuthService,
    /// Generated books not yet saved
    pub drafts: DraftStore,
    pub exports: ExportTracker,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let auth = AuthService::new(&config, backend.clone());
        let drafts = DraftStore::new(Duration::from_secs(config.drafts.ttl_secs));

        Ok(Self {
            config: Arc::new(config),
            backend,
            auth,
            drafts,
            exports: ExportTracker::new(),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    // Pages for signed-in users; anonymous browsers are sent to /login
    let protected_pages = Router::new()
        .route("/dashboard", get(books::dashboard))
        .route("/books/new", get(books::new_book_page).post(books::create_book))
        .route("/books/:id", get(viewer_pages::view_book))
        .route("/books/:id/export", get(viewer_pages::export_book))
        .route("/books/:id/delete", post(books::delete_book))
        .route("/drafts/:draft_id", get(viewer_pages::view_draft))
        .route("/drafts/:draft_id/save", post(books::save_draft))
        .route_layer(axum_middleware::from_fn(AuthMiddleware::require_login));

    // Protected API routes answer 401 with a JSON body
    let protected_api = Router::new()
        .route("/api/books/:id", get(api::get_book).delete(api::delete_book))
        .route("/api/books/:id/spreads/:cursor", get(api::get_spread))
        .route("/api/books/:id/pdf", get(api::export_pdf))
        .route_layer(axum_middleware::from_fn(AuthMiddleware::require_login));

    // Public routes - no authentication required
    let public_routes = Router::new()
        .route("/", get(auth::index_page))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/register", get(auth::register_page).post(auth::register_handler))
        .route("/logout", post(auth::logout))
        .route("/auth/google", get(auth::google_start))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/images/:file_id", get(api::get_image))
        .route("/health", get(api::health));

    let api_docs = SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(protected_pages)
        .merge(protected_api)
        .merge(public_routes)
        .merge(api_docs)
        .nest_service("/static", ServeDir::new("static"))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
