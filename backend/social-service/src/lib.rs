//! Social network backend: posts, follows, likes, comments, bookmarks,
//! notifications, search and chat tokens over a cookie-session JSON API.

pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod security;
pub mod services;

use actix_middleware::SessionCookieConfig;
use sqlx::PgPool;
use std::sync::Arc;

pub use config::Config;

use clients::{ChatService, FileHost, GoogleOAuthClient, StreamChatClient, UploadThingClient};
use services::TrendsCache;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub cookies: SessionCookieConfig,
    pub chat: Arc<dyn ChatService>,
    pub file_host: Arc<dyn FileHost>,
    pub google: Arc<GoogleOAuthClient>,
    pub trends: TrendsCache,
}

impl AppState {
    /// State wired to the real external services.
    pub fn new(db: PgPool, config: Config) -> Self {
        let chat = Arc::new(StreamChatClient::new(&config.chat));
        let file_host = Arc::new(UploadThingClient::new(&config.file_host));
        Self::with_clients(db, config, chat, file_host)
    }

    pub fn with_clients(
        db: PgPool,
        config: Config,
        chat: Arc<dyn ChatService>,
        file_host: Arc<dyn FileHost>,
    ) -> Self {
        let google = Arc::new(GoogleOAuthClient::from_config(&config));
        let cookies = SessionCookieConfig::new(config.app.is_production());

        Self {
            db,
            config: Arc::new(config),
            cookies,
            chat,
            file_host,
            google,
            trends: TrendsCache::default(),
        }
    }
}
