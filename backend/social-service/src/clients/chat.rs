/// Managed chat service client (Stream Chat REST API)
///
/// The backend only keeps chat user profiles in sync and issues user tokens;
/// message transport and presence stay with the provider.
use crate::config::ChatConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

/// Lifetime of a token handed to the browser chat client
pub const USER_TOKEN_TTL_SECS: i64 = 60 * 60;
/// `iat` is backdated to tolerate clock drift with the provider
const ISSUED_AT_SKEW_SECS: i64 = 60;

/// Profile mirrored into the chat service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Create or replace the chat profile of a user
    async fn upsert_user(&self, user: &ChatUser) -> Result<()>;

    /// Set fields on an existing chat user, leaving the others untouched
    async fn partial_update_user(&self, user_id: Uuid, update: &ChatUserUpdate) -> Result<()>;

    /// Unread messages across all of the user's channels
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;

    /// Token the browser uses to connect as `user_id`
    fn create_user_token(&self, user_id: Uuid) -> Result<String>;
}

/// Fields to `set` on a chat user; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
struct ServerClaims {
    server: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserTokenClaims {
    pub user_id: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
struct UnreadResponse {
    total_unread_count: i64,
}

#[derive(Clone)]
pub struct StreamChatClient {
    client: Client,
    api_url: String,
    api_key: String,
    encoding_key: EncodingKey,
}

impl StreamChatClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            encoding_key: EncodingKey::from_secret(config.api_secret.as_bytes()),
        }
    }

    fn server_token(&self) -> Result<String> {
        encode(&Header::default(), &ServerClaims { server: true }, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign chat server token: {}", e)))
    }

    /// Attach the server credentials every REST call needs.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request
            .query(&[("api_key", self.api_key.as_str())])
            .header("Authorization", self.server_token()?)
            .header("stream-auth-type", "jwt"))
    }

    async fn check(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, body = %body, "Chat service {} failed", action);
        Err(AppError::Upstream(format!(
            "chat service {} failed ({})",
            action, status
        )))
    }
}

#[async_trait]
impl ChatService for StreamChatClient {
    async fn upsert_user(&self, user: &ChatUser) -> Result<()> {
        let id = user.id.to_string();
        let mut users = serde_json::Map::new();
        users.insert(
            id.clone(),
            serde_json::json!({
                "id": id,
                "username": user.username,
                "name": user.name,
            }),
        );
        let body = serde_json::json!({ "users": users });

        let request = self.authorized(self.client.post(format!("{}/users", self.api_url)))?;
        let response = request.json(&body).send().await?;
        Self::check(response, "upsert user").await?;

        info!(user_id = %user.id, "Chat user upserted");
        Ok(())
    }

    async fn partial_update_user(&self, user_id: Uuid, update: &ChatUserUpdate) -> Result<()> {
        let body = serde_json::json!({
            "users": [{
                "id": user_id.to_string(),
                "set": update,
            }]
        });

        let request = self.authorized(self.client.patch(format!("{}/users", self.api_url)))?;
        let response = request.json(&body).send().await?;
        Self::check(response, "update user").await?;

        Ok(())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let request = self.authorized(self.client.get(format!("{}/unread", self.api_url)))?;
        let response = request
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await?;
        let unread: UnreadResponse = Self::check(response, "unread count").await?.json().await?;

        Ok(unread.total_unread_count)
    }

    fn create_user_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = UserTokenClaims {
            user_id: user_id.to_string(),
            exp: (now + Duration::seconds(USER_TOKEN_TTL_SECS)).timestamp(),
            iat: (now - Duration::seconds(ISSUED_AT_SKEW_SECS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign chat user token: {}", e)))
    }
}
