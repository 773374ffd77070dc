//! Account lifecycle: sign-up, sign-in, Google sign-in, profile edits
//!
//! Every new account is mirrored into the chat service inside the same
//! transaction as the user row, so a chat failure leaves no user behind.

use crate::clients::{ChatService, ChatUser, ChatUserUpdate, FileHost, GoogleUser};
use crate::db::users::{self, NewUser};
use crate::domain::models::{User, UserData};
use crate::domain::requests::{
    AvatarRequest, LoginRequest, SignupRequest, UpdateProfileRequest, ValidatedRequest,
};
use crate::error::{AppError, Result};
use crate::security::{hash_password, verify_password};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("slug pattern is a valid regex"));
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("slug pattern is a valid regex"));

/// URL-friendly form of a display name: lower case, words joined by `-`.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

/// Username for a first Google sign-in: slug of the name plus the first
/// four characters of the new user id.
pub fn google_username(name: &str, user_id: Uuid) -> String {
    let id = user_id.to_string();
    format!("{}-{}", slugify(name), &id[..4])
}

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    chat: Arc<dyn ChatService>,
}

impl AccountService {
    pub fn new(pool: PgPool, chat: Arc<dyn ChatService>) -> Self {
        Self { pool, chat }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User> {
        let request = request.into_valid()?;

        if users::username_taken(&self.pool, &request.username).await? {
            return Err(AppError::validation("Username is already taken"));
        }
        if users::email_taken(&self.pool, &request.email).await? {
            return Err(AppError::validation("Email is already taken"));
        }

        let password_hash = hash_password(&request.password)?;
        let user_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(
            &mut tx,
            NewUser {
                id: user_id,
                username: &request.username,
                display_name: &request.username,
                email: Some(&request.email),
                password_hash: Some(&password_hash),
                google_id: None,
            },
        )
        .await?;
        self.chat
            .upsert_user(&ChatUser {
                id: user.id,
                username: user.username.clone(),
                name: user.display_name.clone(),
            })
            .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<User> {
        let request = request.into_valid()?;

        let user = users::find_by_username(&self.pool, &request.username)
            .await?
            .ok_or_else(|| AppError::validation(INVALID_CREDENTIALS))?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::validation(INVALID_CREDENTIALS));
        };
        if !verify_password(&request.password, password_hash)? {
            return Err(AppError::validation(INVALID_CREDENTIALS));
        }

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Find the account linked to a Google profile, creating it on first use.
    pub async fn google_login(&self, google_user: &GoogleUser) -> Result<User> {
        if let Some(user) = users::find_by_google_id(&self.pool, &google_user.id).await? {
            return Ok(user);
        }

        let user_id = Uuid::new_v4();
        let username = google_username(&google_user.name, user_id);

        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(
            &mut tx,
            NewUser {
                id: user_id,
                username: &username,
                display_name: &google_user.name,
                email: None,
                password_hash: None,
                google_id: Some(&google_user.id),
            },
        )
        .await?;
        self.chat
            .upsert_user(&ChatUser {
                id: user.id,
                username: user.username.clone(),
                name: user.display_name.clone(),
            })
            .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User signed up with Google");
        Ok(user)
    }

    pub async fn profile(&self, viewer_id: Uuid, username: &str) -> Result<UserData> {
        users::user_data_by_username(&self.pool, viewer_id, username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn suggestions(&self, viewer_id: Uuid, limit: i64) -> Result<Vec<UserData>> {
        users::suggestions(&self.pool, viewer_id, limit).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserData> {
        let request = request.into_valid()?;

        let mut tx = self.pool.begin().await?;
        users::update_profile(&mut tx, user_id, &request.display_name, request.bio.as_deref())
            .await?;
        let data = users::user_data_by_id(&mut *tx, user_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        self.chat
            .partial_update_user(
                user_id,
                &ChatUserUpdate {
                    name: Some(request.display_name.clone()),
                    ..ChatUserUpdate::default()
                },
            )
            .await?;
        tx.commit().await?;

        Ok(data)
    }

    /// Store a freshly uploaded avatar and drop the previous file.
    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        request: AvatarRequest,
        file_host: &dyn FileHost,
    ) -> Result<String> {
        let request = request.into_valid()?;
        let avatar_url = file_host.app_url(&request.url);

        let previous = users::replace_avatar(&self.pool, user_id, &avatar_url).await?;

        if let Some(key) = previous
            .filter(|old| *old != avatar_url)
            .and_then(|old| file_host.file_key(&old))
        {
            if let Err(e) = file_host.delete_files(&[key]).await {
                warn!(user_id = %user_id, error = %e, "Failed to delete previous avatar");
            }
        }

        self.chat
            .partial_update_user(
                user_id,
                &ChatUserUpdate {
                    image: Some(avatar_url.clone()),
                    ..ChatUserUpdate::default()
                },
            )
            .await?;

        Ok(avatar_url)
    }
}
