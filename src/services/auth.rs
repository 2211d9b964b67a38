use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::Url;
use thiserror::Error;

use crate::{
    config::{AppConfig, GoogleConfig},
    dto::auth::{
        GoogleLoginRequest, GoogleTokenResponse, GoogleUserInfo, RegisterRequest, SessionClaims,
        TokenResponse,
    },
    models::AuthContext,
    services::backend::{BackendClient, BackendError},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Google sign-in is not configured")]
    GoogleNotConfigured,
    #[error("Google sign-in failed: {0}")]
    Google(String),
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Issues and checks front-end session tokens.
///
/// The backend owns identities and issues the bearer credential; the session
/// token only carries that credential to later requests inside an HS256 JWT.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<Inner>,
}

struct Inner {
    secret: String,
    ttl: Duration,
    backend: BackendClient,
    google: GoogleConfig,
    http: reqwest::Client,
}

impl AuthService {
    pub fn new(config: &AppConfig, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                secret: config.auth.session_secret.clone(),
                ttl: Duration::minutes(config.auth.session_ttl_minutes),
                backend,
                google: config.google.clone(),
                http: reqwest::Client::new(),
            }),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn issue_session(&self, username: &str, access_token: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.inner.ttl;

        let claims = SessionClaims {
            sub: username.to_string(),
            access_token: access_token.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.inner.secret.as_ref()),
        )?;

        Ok(token)
    }

    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let token_data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.inner.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Context for a request carrying `token`, anonymous when it does not verify.
    pub fn context_for(&self, token: Option<&str>) -> AuthContext {
        let Some(token) = token else {
            return AuthContext::anonymous();
        };

        match self.validate_session(token) {
            Ok(claims) => {
                tracing::debug!("Session valid for user: {}", claims.sub);
                AuthContext::authenticated(claims.sub, claims.access_token)
            }
            Err(e) => {
                tracing::warn!("Session validation failed: {}", e);
                AuthContext::anonymous()
            }
        }
    }

    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let token = match self.inner.backend.login(username, password).await {
            Ok(token) => token,
            Err(e) if e.is_unauthorized() => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        self.session_from_backend_token(token, username).await
    }

    /// Creates the account, then signs in with the same credentials.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, AuthError> {
        let user = self.inner.backend.register(request).await?;
        tracing::info!("Registered user {}", user.username);
        self.login_with_password(&request.username, &request.password).await
    }

    pub fn google_authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let google = &self.inner.google;
        if !google.is_configured() {
            return Err(AuthError::GoogleNotConfigured);
        }

        let url = Url::parse_with_params(
            &google.auth_url,
            &[
                ("client_id", google.client_id.as_str()),
                ("redirect_uri", google.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::Google(e.to_string()))?;

        Ok(url.to_string())
    }

    /// Exchanges an authorization code with Google, then trades the Google
    /// identity for a backend credential.
    pub async fn login_with_google_code(&self, code: &str) -> Result<String, AuthError> {
        let google = &self.inner.google;
        if !google.is_configured() {
            return Err(AuthError::GoogleNotConfigured);
        }

        let token: GoogleTokenResponse = self
            .inner
            .http
            .post(&google.token_url)
            .form(&[
                ("code", code),
                ("client_id", google.client_id.as_str()),
                ("client_secret", google.client_secret.as_str()),
                ("redirect_uri", google.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Google(format!("code exchange: {}", e)))?
            .json()
            .await
            .map_err(|e| AuthError::Google(format!("token response: {}", e)))?;

        let profile: GoogleUserInfo = self
            .inner
            .http
            .get(&google.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Google(format!("userinfo: {}", e)))?
            .json()
            .await
            .map_err(|e| AuthError::Google(format!("userinfo response: {}", e)))?;

        tracing::info!("Google identity confirmed for {}", profile.email);

        let fallback_name = profile.email.split('@').next().unwrap_or_default().to_string();
        let backend_token = self
            .inner
            .backend
            .google_login(&GoogleLoginRequest {
                token: profile.sub,
                email: profile.email,
                name: profile.name,
            })
            .await?;

        self.session_from_backend_token(backend_token, &fallback_name).await
    }

    /// Looks up the backend username for the session subject, falling back to
    /// the name the user signed in with.
    async fn session_from_backend_token(
        &self,
        token: TokenResponse,
        fallback_name: &str,
    ) -> Result<String, AuthError> {
        let username = match self.inner.backend.current_user(&token.access_token).await {
            Ok(user) => user.username,
            Err(e) => {
                tracing::warn!("Could not load profile, using sign-in name: {}", e);
                fallback_name.to_string()
            }
        };

        self.issue_session(&username, &token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(config: AppConfig) -> AuthService {
        let backend = BackendClient::new(&config.backend).unwrap();
        AuthService::new(&config, backend)
    }

    #[test]
    fn session_round_trip() {
        let auth = service_with(AppConfig::default());
        let token = auth.issue_session("ada", "backend-token").unwrap();

        let claims = auth.validate_session(&token).unwrap();
        assert_eq!(claims.sub, "ada");
        assert_eq!(claims.access_token, "backend-token");
        assert!(claims.exp > claims.iat);

        let ctx = auth.context_for(Some(&token));
        assert_eq!(ctx.bearer(), Some("backend-token"));
    }

    #[test]
    fn foreign_or_expired_sessions_are_anonymous() {
        let auth = service_with(AppConfig::default());

        let mut other = AppConfig::default();
        other.auth.session_secret = "another-secret".to_string();
        let foreign = service_with(other).issue_session("eve", "stolen").unwrap();
        assert!(auth.validate_session(&foreign).is_err());
        assert!(!auth.context_for(Some(&foreign)).is_logged_in());

        let mut short = AppConfig::default();
        short.auth.session_ttl_minutes = -10;
        let expired = service_with(short).issue_session("ada", "old").unwrap();
        assert!(!auth.context_for(Some(&expired)).is_logged_in());

        assert!(!auth.context_for(None).is_logged_in());
    }

    #[test]
    fn google_url_requires_configuration() {
        let auth = service_with(AppConfig::default());
        assert!(matches!(
            auth.google_authorize_url("s1"),
            Err(AuthError::GoogleNotConfigured)
        ));

        let mut config = AppConfig::default();
        config.google.client_id = "client-123".to_string();
        config.google.client_secret = "secret".to_string();
        let url = service_with(config).google_authorize_url("state-xyz").unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=state-xyz"));
        assert!(url.contains("response_type=code"));
    }
}
