use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application configuration structure
///
/// Layers, lowest priority first:
/// - built-in defaults
/// - `config.yaml` in the working directory
/// - `APP_` environment variables (`APP_BACKEND__API_URL=...`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub google: GoogleConfig,
    pub drafts: DraftConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub debug: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub api_url: String,
    /// Base used by browsers to fetch remote illustrations.
    pub images_base: String,
    /// Book generation runs text and image models, so this is generous.
    pub timeout_secs: u64,
    pub export_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftConfig {
    pub ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "rhymera".to_string(),
                version: "0.1.0".to_string(),
                debug: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            backend: BackendConfig {
                api_url: "http://localhost:8000".to_string(),
                images_base: "/api/images".to_string(),
                timeout_secs: 300,
                export_timeout_secs: 30,
            },
            auth: AuthConfig {
                session_secret: "change-me-session-secret".to_string(),
                session_ttl_minutes: 30,
                cookie_secure: false,
            },
            google: GoogleConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_url: "http://localhost:3000/auth/google/callback".to_string(),
                auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            },
            drafts: DraftConfig { ttl_secs: 3600 },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        info!("Loading application configuration...");

        let config: AppConfig = Self::figment().extract()?;

        info!("Configuration loaded successfully");
        info!("name: {:?}", config.app.name);
        info!("Backend API: {}", config.backend.api_url);
        info!("Google sign-in enabled: {}", config.google.is_configured());

        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file("config.yaml"))
            // Double underscore so snake_case keys survive the split
            .merge(Env::prefixed("APP_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_BACKEND__API_URL", "http://backend:9000");
            jail.set_env("APP_AUTH__SESSION_TTL_MINUTES", "90");

            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config.backend.api_url, "http://backend:9000");
            assert_eq!(config.auth.session_ttl_minutes, 90);
            assert_eq!(config.server.port, 3000);
            Ok(())
        });
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "server:\n  port: 8080\ngoogle:\n  client_id: abc\n  client_secret: xyz\n",
            )?;

            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config.server.port, 8080);
            assert!(config.google.is_configured());
            Ok(())
        });
    }
}
