use actix_web::{http::header, web, HttpRequest, HttpResponse};

use crate::domain::requests::CreateMediaRequest;
use crate::error::Result;
use crate::services::MediaService;
use crate::AppState;
use actix_middleware::SessionUser;

pub async fn create_media(
    state: web::Data<AppState>,
    _user: SessionUser,
    body: web::Json<CreateMediaRequest>,
) -> Result<HttpResponse> {
    let media_id = MediaService::new(state.db.clone())
        .create_media(body.into_inner(), &*state.file_host)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "mediaId": media_id })))
}

fn cron_authorized(state: &AppState, req: &HttpRequest) -> bool {
    let secret = &state.config.cron.secret;
    if secret.is_empty() {
        return false;
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

/// Scheduled sweep of uploads that never made it into a post
pub async fn clear_uploads(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if !cron_authorized(&state, &req) {
        return Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "message": "Invalid authorization header" })));
    }

    let deleted = MediaService::new(state.db.clone())
        .clear_orphans(&*state.file_host, state.config.app.is_production())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": deleted })))
}
