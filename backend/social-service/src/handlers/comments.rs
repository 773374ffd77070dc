use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::domain::requests::CreateCommentRequest;
use crate::error::Result;
use crate::services::CommentService;
use crate::AppState;
use actix_middleware::SessionUser;
use pagination::CursorQuery;

pub async fn list_comments(
    state: web::Data<AppState>,
    _user: SessionUser,
    post_id: web::Path<Uuid>,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    let page = CommentService::new(state.db.clone())
        .list(*post_id, query.cursor)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_comment(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = CommentService::new(state.db.clone())
        .create(user.user_id, *post_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    user: SessionUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment = CommentService::new(state.db.clone())
        .delete(user.user_id, *comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}
