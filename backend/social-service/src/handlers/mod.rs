/// HTTP handlers for the social API
///
/// All `/api` data routes require a session; the auth routes and the
/// cron-protected upload sweep do not.
use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

pub mod auth;
pub mod comments;
pub mod health;
pub mod interactions;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;

fn query_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected query string");
    AppError::validation("Invalid query parameters").into()
}

fn path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected path parameter");
    AppError::not_found("Not found").into()
}

fn json_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected request body");
    AppError::validation("Invalid request body").into()
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    // extractor failures answer with the same `{"error": ..}` body as handlers
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::JsonConfig::default().error_handler(json_error));

    cfg.route("/health", web::get().to(health::health))
        .route("/ready", web::get().to(health::ready))
        .route("/metrics", web::get().to(crate::metrics::metrics_handler))
        .route("/login/google", web::get().to(auth::google_start))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(auth::signup))
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout))
                        .route("/callback/google", web::get().to(auth::google_callback)),
                )
                .service(
                    web::scope("/posts")
                        .route("", web::post().to(posts::create_post))
                        .route("/for-you", web::get().to(posts::for_you))
                        .route("/following", web::get().to(posts::following))
                        .route("/bookmarked", web::get().to(posts::bookmarked))
                        .route("/{post_id}", web::get().to(posts::get_post))
                        .route("/{post_id}", web::delete().to(posts::delete_post))
                        .route("/{post_id}/likes", web::get().to(interactions::like_info))
                        .route("/{post_id}/likes", web::post().to(interactions::like))
                        .route("/{post_id}/likes", web::delete().to(interactions::unlike))
                        .route("/{post_id}/bookmark", web::get().to(interactions::bookmark_info))
                        .route("/{post_id}/bookmark", web::post().to(interactions::bookmark))
                        .route("/{post_id}/bookmark", web::delete().to(interactions::unbookmark))
                        .route("/{post_id}/comments", web::get().to(comments::list_comments))
                        .route("/{post_id}/comments", web::post().to(comments::create_comment)),
                )
                .route("/comments/{comment_id}", web::delete().to(comments::delete_comment))
                .service(
                    web::scope("/users")
                        .route("/suggestions", web::get().to(users::suggestions))
                        .route("/profile", web::patch().to(users::update_profile))
                        .route("/avatar", web::post().to(users::update_avatar))
                        .route("/username/{username}", web::get().to(users::get_by_username))
                        .route("/{user_id}/posts", web::get().to(posts::user_posts))
                        .route("/{user_id}/followers", web::get().to(interactions::follower_info))
                        .route("/{user_id}/followers", web::post().to(interactions::follow))
                        .route("/{user_id}/followers", web::delete().to(interactions::unfollow)),
                )
                .service(
                    web::scope("/notifications")
                        .route("", web::get().to(notifications::list_notifications))
                        .route("/unread-count", web::get().to(notifications::unread_count))
                        .route("/mark-as-read", web::patch().to(notifications::mark_as_read)),
                )
                .route("/messages/unread-count", web::get().to(messages::unread_count))
                .route("/get-token", web::get().to(messages::get_token))
                .route("/search", web::get().to(posts::search))
                .route("/trends", web::get().to(posts::trends))
                .route("/media", web::post().to(media::create_media))
                .route("/clear-uploads", web::get().to(media::clear_uploads)),
        );
}
