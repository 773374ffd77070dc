/// Like, bookmark and follow toggles
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::services::InteractionService;
use crate::AppState;
use actix_middleware::SessionUser;

fn service(state: &AppState) -> InteractionService {
    InteractionService::new(state.db.clone())
}

pub async fn like_info(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let info = service(&state).like_info(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

pub async fn like(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).like(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn unlike(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).unlike(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn bookmark_info(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let info = service(&state).bookmark_info(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

pub async fn bookmark(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).bookmark(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn unbookmark(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).unbookmark(user.user_id, *post_id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn follower_info(
    state: web::Data<AppState>,
    user: SessionUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let info = service(&state).follower_info(user.user_id, *user_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

pub async fn follow(
    state: web::Data<AppState>,
    user: SessionUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).follow(user.user_id, *user_id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn unfollow(
    state: web::Data<AppState>,
    user: SessionUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&state).unfollow(user.user_id, *user_id).await?;
    Ok(HttpResponse::Ok().finish())
}
