use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::posts::PostFeed;
use crate::domain::requests::{CreatePostRequest, SearchQuery};
use crate::error::Result;
use crate::services::PostService;
use crate::AppState;
use actix_middleware::SessionUser;
use pagination::{CursorQuery, PageRequest};

pub async fn create_post(
    state: web::Data<AppState>,
    user: SessionUser,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = PostService::new(state.db.clone())
        .create_post(user.user_id, body.into_inner())
        .await?;
    state.trends.invalidate().await;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_post(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = PostService::new(state.db.clone())
        .get_post(user.user_id, post_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = PostService::new(state.db.clone())
        .delete_post(user.user_id, post_id.into_inner())
        .await?;
    state.trends.invalidate().await;
    Ok(HttpResponse::Ok().json(post))
}

async fn feed_page(
    state: &AppState,
    user: &SessionUser,
    feed: PostFeed<'_>,
    page: PageRequest,
) -> Result<HttpResponse> {
    let page = PostService::new(state.db.clone())
        .feed(user.user_id, feed, page)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn for_you(
    state: web::Data<AppState>,
    user: SessionUser,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    feed_page(&state, &user, PostFeed::ForYou, query.into_inner().into()).await
}

pub async fn following(
    state: web::Data<AppState>,
    user: SessionUser,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    feed_page(&state, &user, PostFeed::Following, query.into_inner().into()).await
}

pub async fn bookmarked(
    state: web::Data<AppState>,
    user: SessionUser,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    feed_page(&state, &user, PostFeed::Bookmarked, query.into_inner().into()).await
}

pub async fn user_posts(
    state: web::Data<AppState>,
    user: SessionUser,
    user_id: web::Path<Uuid>,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    let feed = PostFeed::ByUser(user_id.into_inner());
    feed_page(&state, &user, feed, query.into_inner().into()).await
}

pub async fn search(
    state: web::Data<AppState>,
    user: SessionUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page: PageRequest = CursorQuery { cursor: query.cursor }.into();
    feed_page(&state, &user, PostFeed::Search(&query.q), page).await
}

pub async fn trends(state: web::Data<AppState>, _user: SessionUser) -> Result<HttpResponse> {
    let topics = state.trends.trending(&state.db).await?;
    Ok(HttpResponse::Ok().json(topics))
}
