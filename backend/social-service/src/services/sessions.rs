//! Database-backed sessions behind the `auth_session` cookie
//!
//! The browser holds a random token; the `sessions` table holds its SHA-256
//! digest. Sessions live 30 days and slide forward to a full 30 days once
//! fewer than 15 remain.

use crate::db::sessions;
use crate::domain::models::Session;
use crate::error::Result;
use crate::security::{generate_session_token, hash_session_token};
use actix_middleware::{SessionLookupError, SessionValidator, ValidatedSession};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_TTL_DAYS: i64 = 30;
pub const SESSION_REFRESH_THRESHOLD_DAYS: i64 = 15;

/// Outcome of checking a session's expiry at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Expired,
    Valid,
    /// Still valid; push the expiry to the carried instant
    Extend(DateTime<Utc>),
}

pub fn check_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Expiry {
    if now >= expires_at {
        Expiry::Expired
    } else if expires_at - now < Duration::days(SESSION_REFRESH_THRESHOLD_DAYS) {
        Expiry::Extend(now + Duration::days(SESSION_TTL_DAYS))
    } else {
        Expiry::Valid
    }
}

#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
}

impl SessionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a session; returns the cookie token and the stored row.
    pub async fn create_session(&self, user_id: Uuid) -> Result<(String, Session)> {
        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        let session =
            sessions::insert_session(&self.pool, &hash_session_token(&token), user_id, expires_at)
                .await?;

        info!(user_id = %user_id, "Session created");
        Ok((token, session))
    }

    pub async fn validate(&self, token: &str) -> Result<Option<ValidatedSession>> {
        let session_id = hash_session_token(token);
        let Some(session) = sessions::find_session(&self.pool, &session_id).await? else {
            return Ok(None);
        };

        match check_expiry(session.expires_at, Utc::now()) {
            Expiry::Expired => {
                sessions::delete_session(&self.pool, &session_id).await?;
                debug!(user_id = %session.user_id, "Expired session removed");
                Ok(None)
            }
            Expiry::Valid => Ok(Some(ValidatedSession {
                session_id,
                user_id: session.user_id,
                expires_at: session.expires_at,
                fresh: false,
            })),
            Expiry::Extend(expires_at) => {
                sessions::extend_session(&self.pool, &session_id, expires_at).await?;
                Ok(Some(ValidatedSession {
                    session_id,
                    user_id: session.user_id,
                    expires_at,
                    fresh: true,
                }))
            }
        }
    }

    pub async fn invalidate(&self, session_id: &str) -> Result<()> {
        sessions::delete_session(&self.pool, session_id).await?;
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        sessions::delete_expired_sessions(&self.pool).await
    }
}

#[async_trait]
impl SessionValidator for SessionService {
    async fn validate_session(
        &self,
        token: &str,
    ) -> std::result::Result<Option<ValidatedSession>, SessionLookupError> {
        self.validate(token)
            .await
            .map_err(|e| SessionLookupError(e.to_string()))
    }
}
