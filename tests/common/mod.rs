#![allow(dead_code)]

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use rhymera_web::{create_router, AppConfig, AppState};

pub const BACKEND_TOKEN: &str = "backend-token";
pub const PASSWORD: &str = "correct horse";
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Cookie header carrying a valid session for `ada`.
    pub fn session_cookie(&self) -> String {
        self.session_cookie_wrapping(BACKEND_TOKEN)
    }

    /// Session that verifies locally but carries `backend_token`.
    pub fn session_cookie_wrapping(&self, backend_token: &str) -> String {
        let token = self
            .state
            .auth
            .issue_session("ada", backend_token)
            .expect("issue session");
        format!("rhymera_session={}", token)
    }
}

/// Starts a fake generation backend and builds the app pointed at it.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let base_url = spawn_fake_backend().await;

    let mut config = AppConfig::default();
    config.backend.api_url = base_url;
    config.backend.export_timeout_secs = 5;
    config.auth.session_secret = "integration-test-secret".to_string();
    configure(&mut config);

    let state = AppState::new(config).expect("app state");
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

async fn spawn_fake_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");

    tokio::spawn(async move {
        axum::serve(listener, fake_backend()).await.unwrap();
    });

    format!("http://{}", addr)
}

fn fake_backend() -> Router {
    Router::new()
        .route("/token", post(token))
        .route("/users/me", get(current_user))
        .route("/books", get(list_books).post(save_book))
        .route("/books/:id", get(get_book).delete(delete_book))
        .route("/books/:id/pdf", get(book_pdf))
        .route("/images/:id", get(image))
        .route("/generate-book", post(generate_book))
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", BACKEND_TOKEN).as_str())
}

#[derive(Deserialize)]
struct TokenForm {
    username: String,
    password: String,
}

async fn token(Form(form): Form<TokenForm>) -> Response {
    if form.username == "ada" && form.password == PASSWORD {
        Json(json!({ "access_token": BACKEND_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Incorrect username or password")
    }
}

async fn current_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({ "id": "u1", "username": "ada", "email": "ada@example.com" })).into_response()
}

/// Five pages; page 1 has a stored image, the rest only prompts.
pub fn five_page_content() -> Value {
    let pages: Vec<Value> = (1..=5)
        .map(|i| {
            let mut page = json!({
                "page": i,
                "content": format!("verse {}", i),
                "illustration": format!("scene {}", i),
            });
            if i == 1 {
                page["illustration_file"] = json!("img-1");
            }
            page
        })
        .collect();

    json!({
        "book_type": "nursery_rhyme",
        "pages": 5,
        "book_content": pages,
    })
}

fn saved_record(id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "title": "Twinkle Verses",
        "content": five_page_content(),
        "created_at": "2024-05-01T10:00:00",
    })
}

async fn list_books(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!([saved_record("book-1")])).into_response()
}

pub const SAVED_BOOK_ID: &str = "book-9";

async fn save_book(headers: HeaderMap, Json(request): Json<Value>) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    if request["content"].is_null() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "content is required");
    }
    Json(json!({
        "id": SAVED_BOOK_ID,
        "user_id": "u1",
        "title": request["title"],
        "content": request["content"],
    }))
    .into_response()
}

async fn get_book(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    match id.as_str() {
        "book-1" | "broken" => Json(saved_record(&id)).into_response(),
        _ => detail(StatusCode::NOT_FOUND, "Book not found"),
    }
}

async fn delete_book(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    match id.as_str() {
        "book-1" => Json(json!({ "message": "Book deleted" })).into_response(),
        _ => detail(StatusCode::NOT_FOUND, "Book not found"),
    }
}

async fn book_pdf(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    match id.as_str() {
        "book-1" => ([(header::CONTENT_TYPE, "application/pdf")], "%PDF-1.4 fake").into_response(),
        _ => detail(StatusCode::INTERNAL_SERVER_ERROR, "Error generating PDF"),
    }
}

async fn image(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "img-1" => ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response(),
        _ => detail(StatusCode::NOT_FOUND, "Image not found"),
    }
}

/// Answers the way the real generator does: the book serialized into a string.
async fn generate_book(Json(request): Json<Value>) -> Response {
    let pages = request["pages"].as_u64().unwrap_or(1);
    let content: Vec<Value> = (1..=pages)
        .map(|i| json!({ "page": i, "content": format!("dragon page {}", i), "illustration": "a dragon" }))
        .collect();
    let book = json!({
        "book_type": request["book_type"],
        "pages": pages,
        "book_content": content,
    });
    Json(Value::String(book.to_string())).into_response()
}
