/// Configuration management for Social Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
    pub file_host: FileHostConfig,
    pub oauth: OAuthConfig,
    pub cron: CronConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Public origin of the web app, used for OAuth redirects
    pub base_url: String,
    /// Emit JSON logs instead of the human-readable format
    pub json_logs: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Managed chat service credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// External file host (uploads)
#[derive(Clone, Serialize, Deserialize)]
pub struct FileHostConfig {
    pub api_url: String,
    pub app_id: String,
    pub secret: String,
}

impl std::fmt::Debug for FileHostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHostConfig")
            .field("api_url", &self.api_url)
            .field("app_id", &self.app_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Google OAuth client
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"[REDACTED]")
            .field("authorize_url", &self.authorize_url)
            .finish()
    }
}

/// Scheduled maintenance endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct CronConfig {
    pub secret: String,
}

impl std::fmt::Debug for CronConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronConfig").field("secret", &"[REDACTED]").finish()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            base_url: env_or("APP_BASE_URL", "http://localhost:3000"),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };
        let production = app.is_production();

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if production => bail!("CORS_ALLOWED_ORIGINS must be set in production"),
            Err(_) => "http://localhost:3000".to_string(),
        };
        if production && allowed_origins.trim() == "*" {
            bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
        }

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
        };

        let chat = ChatConfig {
            api_url: env_or("STREAM_API_URL", "https://chat.stream-io-api.com"),
            api_key: env_or("STREAM_API_KEY", ""),
            api_secret: env_or("STREAM_SECRET", ""),
        };
        if production && (chat.api_key.is_empty() || chat.api_secret.is_empty()) {
            bail!("STREAM_API_KEY and STREAM_SECRET must be set in production");
        }

        let file_host = FileHostConfig {
            api_url: env_or("UPLOADTHING_API_URL", "https://api.uploadthing.com"),
            app_id: env_or("UPLOADTHING_APP_ID", ""),
            secret: env_or("UPLOADTHING_SECRET", ""),
        };

        let oauth = OAuthConfig {
            google_client_id: env_or("GOOGLE_CLIENT_ID", ""),
            google_client_secret: env_or("GOOGLE_CLIENT_SECRET", ""),
            authorize_url: env_or(
                "GOOGLE_AUTHORIZE_URL",
                "https://accounts.google.com/o/oauth2/v2/auth",
            ),
            token_url: env_or("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            userinfo_url: env_or(
                "GOOGLE_USERINFO_URL",
                "https://www.googleapis.com/oauth2/v1/userinfo",
            ),
        };

        let cron = CronConfig {
            secret: env_or("CRON_SECRET", ""),
        };
        if production && cron.secret.is_empty() {
            bail!("CRON_SECRET must be set in production");
        }

        Ok(Config {
            app,
            cors: CorsConfig { allowed_origins },
            database,
            chat,
            file_host,
            oauth,
            cron,
        })
    }

    /// Where Google sends the user back after consent
    pub fn google_redirect_uri(&self) -> String {
        format!(
            "{}/api/auth/callback/google",
            self.app.base_url.trim_end_matches('/')
        )
    }
}
