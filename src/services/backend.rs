use std::time::Duration;

use axum::body::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::dto::auth::{GoogleLoginRequest, RegisterRequest, TokenResponse};
use crate::dto::book::{BookContentDto, BookRequest, SaveBookRequest, SavedBookDto};
use crate::models::user::User;

pub const BOOKS_PER_PAGE: u32 = 20;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Transport(e) => e.status(),
            BackendError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Image bytes relayed from the backend image endpoint.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Bytes,
}

/// HTTP client for the book generation backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    export_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            export_timeout: Duration::from_secs(config.export_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(builder: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Passes successful responses through; turns the rest into `Status`
    /// errors carrying the backend's `detail` message when present.
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| if body.is_empty() { "no details".to_string() } else { body });

        tracing::warn!("Backend responded {}: {}", status, message);
        Err(BackendError::Status { status, message })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        Self::json(response).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, BackendError> {
        let response = self.client.post(self.url("/register")).json(request).send().await?;
        Self::json(response).await
    }

    pub async fn google_login(&self, request: &GoogleLoginRequest) -> Result<TokenResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/google-login"))
            .json(request)
            .send()
            .await?;

        Self::json(response).await
    }

    pub async fn current_user(&self, bearer: &str) -> Result<User, BackendError> {
        let response = self
            .client
            .get(self.url("/users/me"))
            .bearer_auth(bearer)
            .send()
            .await?;

        Self::json(response).await
    }

    /// The backend answers with the book serialized into a JSON string, so
    /// both a string and a plain object are accepted.
    pub async fn generate_book(
        &self,
        bearer: Option<&str>,
        request: &BookRequest,
    ) -> Result<BookContentDto, BackendError> {
        tracing::info!(
            "Requesting {} page {} about {:?}",
            request.pages,
            request.book_type,
            request.topic
        );

        let response = Self::authorized(self.client.post(self.url("/generate-book")), bearer)
            .json(request)
            .send()
            .await?;

        let value: serde_json::Value = Self::json(response).await?;
        parse_generated(value)
    }

    pub async fn save_book(&self, bearer: &str, request: &SaveBookRequest) -> Result<SavedBookDto, BackendError> {
        let response = self
            .client
            .post(self.url("/books"))
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await?;

        Self::json(response).await
    }

    pub async fn list_books(&self, bearer: &str, page: u32) -> Result<Vec<SavedBookDto>, BackendError> {
        let skip = page.saturating_mul(BOOKS_PER_PAGE);
        let response = self
            .client
            .get(self.url("/books"))
            .bearer_auth(bearer)
            .query(&[("limit", BOOKS_PER_PAGE), ("skip", skip)])
            .send()
            .await?;

        Self::json(response).await
    }

    pub async fn get_book(&self, bearer: &str, id: &str) -> Result<SavedBookDto, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/books/{}", id)))
            .bearer_auth(bearer)
            .send()
            .await?;

        Self::json(response).await
    }

    pub async fn delete_book(&self, bearer: &str, id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/books/{}", id)))
            .bearer_auth(bearer)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn export_pdf(&self, bearer: &str, id: &str) -> Result<Bytes, BackendError> {
        tracing::info!("Exporting book {} as PDF", id);
        let response = self
            .client
            .get(self.url(&format!("/books/{}/pdf", id)))
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/pdf")
            .timeout(self.export_timeout)
            .send()
            .await?;

        let bytes = Self::check(response).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(BackendError::Decode("empty PDF body".to_string()));
        }
        Ok(bytes)
    }

    pub async fn fetch_image(&self, file_id: &str) -> Result<ImagePayload, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/images/{}", file_id)))
            .send()
            .await?;

        let response = Self::check(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await?;

        Ok(ImagePayload { content_type, bytes })
    }
}

fn parse_generated(value: serde_json::Value) -> Result<BookContentDto, BackendError> {
    let value = match value {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).map_err(|e| BackendError::Decode(e.to_string()))?
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}
