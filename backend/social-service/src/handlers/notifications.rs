use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::services::NotificationService;
use crate::AppState;
use actix_middleware::SessionUser;
use pagination::CursorQuery;

pub async fn list_notifications(
    state: web::Data<AppState>,
    user: SessionUser,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    let page = NotificationService::new(state.db.clone())
        .list(user.user_id, query.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn unread_count(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    let count = NotificationService::new(state.db.clone())
        .unread_count(user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(count))
}

pub async fn mark_as_read(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    let updated = NotificationService::new(state.db.clone())
        .mark_all_read(user.user_id)
        .await?;
    tracing::debug!(user_id = %user.user_id, updated, "Notifications marked as read");
    Ok(HttpResponse::Ok().finish())
}
