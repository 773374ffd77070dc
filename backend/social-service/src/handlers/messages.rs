/// Chat service pass-throughs
use actix_web::{web, HttpResponse};

use crate::domain::models::UnreadCount;
use crate::error::Result;
use crate::AppState;
use actix_middleware::SessionUser;

pub async fn unread_count(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    let unread_count = state.chat.unread_count(user.user_id).await?;
    Ok(HttpResponse::Ok().json(UnreadCount { unread_count }))
}

pub async fn get_token(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    let token = state.chat.create_user_token(user.user_id)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}
