use actix_web::{web, HttpResponse};

use crate::domain::requests::{AvatarRequest, UpdateProfileRequest};
use crate::error::Result;
use crate::services::AccountService;
use crate::AppState;
use actix_middleware::SessionUser;

const SUGGESTION_LIMIT: i64 = 5;

fn accounts(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.chat.clone())
}

pub async fn get_by_username(
    state: web::Data<AppState>,
    user: SessionUser,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = accounts(&state).profile(user.user_id, &username).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: SessionUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let profile = accounts(&state)
        .update_profile(user.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_avatar(
    state: web::Data<AppState>,
    user: SessionUser,
    body: web::Json<AvatarRequest>,
) -> Result<HttpResponse> {
    let avatar_url = accounts(&state)
        .update_avatar(user.user_id, body.into_inner(), &*state.file_host)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "avatarUrl": avatar_url })))
}

pub async fn suggestions(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    let users = accounts(&state)
        .suggestions(user.user_id, SUGGESTION_LIMIT)
        .await?;
    Ok(HttpResponse::Ok().json(users))
}
