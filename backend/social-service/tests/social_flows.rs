//! Database-backed behaviour of feeds, toggles, notifications and sessions.

mod common;

use chrono::{Duration, Utc};
use common::{count, create_user, start_db, FakeChat, FakeFileHost};
use pagination::PageRequest;
use social_service::db::posts::PostFeed;
use social_service::domain::requests::{CreateCommentRequest, SignupRequest};
use social_service::error::AppError;
use social_service::services::{
    AccountService, CommentService, InteractionService, MediaService, PostService,
    SessionService,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Insert a post `minutes_ago` minutes in the past.
async fn post_at(pool: &PgPool, author: Uuid, minutes_ago: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO posts (id, content, user_id, created_at) \
         VALUES ($1, $2, $3, NOW() - ($4 * INTERVAL '1 minute'))",
    )
    .bind(id)
    .bind(format!("post {}", minutes_ago))
    .bind(author)
    .bind(minutes_ago as f64)
    .execute(pool)
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn test_eleven_posts_page_into_ten_and_one() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;

    let mut ids = Vec::new();
    for minutes_ago in 0..11 {
        ids.push(post_at(&db.pool, author.id, minutes_ago).await);
    }

    let service = PostService::new(db.pool.clone());
    let first = service
        .feed(author.id, PostFeed::ForYou, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(first.posts.len(), 10);
    assert_eq!(first.posts[0].id, ids[0]);
    assert_eq!(first.next_cursor, Some(ids[10]));

    let second = service
        .feed(author.id, PostFeed::ForYou, PageRequest::new(first.next_cursor, 10))
        .await
        .unwrap();
    assert_eq!(second.posts.len(), 1);
    assert_eq!(second.posts[0].id, ids[10]);
    assert_eq!(second.next_cursor, None);
}

#[tokio::test]
async fn test_equal_timestamps_page_without_gaps() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;

    for _ in 0..15 {
        sqlx::query(
            "INSERT INTO posts (id, content, user_id, created_at) \
             VALUES ($1, 'same instant', $2, '2024-01-01T00:00:00Z')",
        )
        .bind(Uuid::new_v4())
        .bind(author.id)
        .execute(&db.pool)
        .await
        .unwrap();
    }

    let service = PostService::new(db.pool.clone());
    let first = service
        .feed(author.id, PostFeed::ByUser(author.id), PageRequest::first(10))
        .await
        .unwrap();
    let second = service
        .feed(
            author.id,
            PostFeed::ByUser(author.id),
            PageRequest::new(first.next_cursor, 10),
        )
        .await
        .unwrap();

    let mut seen: Vec<Uuid> = first.posts.iter().chain(&second.posts).map(|p| p.id).collect();
    assert_eq!(seen.len(), 15);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 15);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn test_unknown_cursor_yields_empty_page() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    post_at(&db.pool, author.id, 0).await;

    let page = PostService::new(db.pool.clone())
        .feed(author.id, PostFeed::ForYou, PageRequest::new(Some(Uuid::new_v4()), 10))
        .await
        .unwrap();
    assert!(page.posts.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_repeated_like_keeps_one_row_and_one_notification() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let fan = create_user(&db.pool, "fan").await;
    let post_id = post_at(&db.pool, author.id, 0).await;

    let service = InteractionService::new(db.pool.clone());
    for _ in 0..3 {
        service.like(fan.id, post_id).await.unwrap();
    }

    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM likes").await, 1);
    assert_eq!(
        count(&db.pool, "SELECT COUNT(*) FROM notifications WHERE type = 'LIKE'").await,
        1
    );

    let info = service.like_info(fan.id, post_id).await.unwrap();
    assert_eq!(info.likes, 1);
    assert!(info.is_liked_by_user);

    service.unlike(fan.id, post_id).await.unwrap();
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM likes").await, 0);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM notifications").await, 0);
}

#[tokio::test]
async fn test_follow_then_unfollow_leaves_nothing() {
    let db = start_db().await;
    let ada = create_user(&db.pool, "ada").await;
    let grace = create_user(&db.pool, "grace").await;

    let service = InteractionService::new(db.pool.clone());
    service.follow(ada.id, grace.id).await.unwrap();

    let info = service.follower_info(ada.id, grace.id).await.unwrap();
    assert_eq!(info.followers, 1);
    assert!(info.is_followed_by_user);
    assert_eq!(
        count(&db.pool, "SELECT COUNT(*) FROM notifications WHERE type = 'FOLLOW'").await,
        1
    );

    service.unfollow(ada.id, grace.id).await.unwrap();
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM follows").await, 0);
    assert_eq!(
        count(&db.pool, "SELECT COUNT(*) FROM notifications WHERE type = 'FOLLOW'").await,
        0
    );
}

#[tokio::test]
async fn test_own_content_never_notifies() {
    let db = start_db().await;
    let ada = create_user(&db.pool, "ada").await;
    let post_id = post_at(&db.pool, ada.id, 0).await;

    InteractionService::new(db.pool.clone())
        .like(ada.id, post_id)
        .await
        .unwrap();
    InteractionService::new(db.pool.clone())
        .follow(ada.id, ada.id)
        .await
        .unwrap();
    CommentService::new(db.pool.clone())
        .create(
            ada.id,
            post_id,
            CreateCommentRequest {
                content: "talking to myself".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM likes").await, 1);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM comments").await, 1);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM notifications").await, 0);
}

#[tokio::test]
async fn test_comments_page_backwards_oldest_first() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let reader = create_user(&db.pool, "reader").await;
    let post_id = post_at(&db.pool, author.id, 60).await;

    let mut ids = Vec::new();
    for minutes_ago in (0..7).rev() {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO comments (id, content, user_id, post_id, created_at) \
             VALUES ($1, 'hi', $2, $3, NOW() - ($4 * INTERVAL '1 minute'))",
        )
        .bind(id)
        .bind(reader.id)
        .bind(post_id)
        .bind(minutes_ago as f64)
        .execute(&db.pool)
        .await
        .unwrap();
        ids.push(id);
    }
    // ids[0] is the oldest comment, ids[6] the newest

    let service = CommentService::new(db.pool.clone());
    let latest = service.list(post_id, None).await.unwrap();
    let latest_ids: Vec<Uuid> = latest.comments.iter().map(|c| c.id).collect();
    assert_eq!(latest_ids, ids[2..].to_vec());
    assert_eq!(latest.previous_cursor, Some(ids[1]));

    let earlier = service.list(post_id, latest.previous_cursor).await.unwrap();
    let earlier_ids: Vec<Uuid> = earlier.comments.iter().map(|c| c.id).collect();
    assert_eq!(earlier_ids, ids[..2].to_vec());
    assert_eq!(earlier.previous_cursor, None);
}

#[tokio::test]
async fn test_comment_notifies_post_author() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let reader = create_user(&db.pool, "reader").await;
    let post_id = post_at(&db.pool, author.id, 0).await;

    let comment = CommentService::new(db.pool.clone())
        .create(
            reader.id,
            post_id,
            CreateCommentRequest {
                content: "  nice post  ".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(comment.content, "nice post");
    assert_eq!(comment.user.username, "reader");

    let recipient: Uuid = sqlx::query_scalar("SELECT recipient_id FROM notifications WHERE type = 'COMMENT'")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(recipient, author.id);

    let err = CommentService::new(db.pool.clone())
        .delete(author.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn test_only_the_author_deletes_a_post() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let other = create_user(&db.pool, "other").await;
    let post_id = post_at(&db.pool, author.id, 0).await;
    InteractionService::new(db.pool.clone())
        .like(other.id, post_id)
        .await
        .unwrap();

    let service = PostService::new(db.pool.clone());
    assert!(matches!(
        service.delete_post(other.id, post_id).await,
        Err(AppError::Unauthorized)
    ));

    let deleted = service.delete_post(author.id, post_id).await.unwrap();
    assert_eq!(deleted.id, post_id);
    assert_eq!(deleted.likes, 1);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM likes").await, 0);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM notifications").await, 0);

    assert!(matches!(
        service.get_post(author.id, post_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_bookmarks_page_by_bookmark_time() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let reader = create_user(&db.pool, "reader").await;
    let older_post = post_at(&db.pool, author.id, 10).await;
    let newer_post = post_at(&db.pool, author.id, 5).await;

    let service = InteractionService::new(db.pool.clone());
    service.bookmark(reader.id, newer_post).await.unwrap();
    service.bookmark(reader.id, older_post).await.unwrap();
    service.bookmark(reader.id, older_post).await.unwrap();
    sqlx::query("UPDATE bookmarks SET created_at = NOW() - INTERVAL '1 hour' WHERE post_id = $1")
        .bind(newer_post)
        .execute(&db.pool)
        .await
        .unwrap();

    let page = PostService::new(db.pool.clone())
        .feed(reader.id, PostFeed::Bookmarked, PageRequest::first(1))
        .await
        .unwrap();
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.posts[0].id, older_post);
    assert!(page.posts[0].is_bookmarked_by_user);

    let cursor: Uuid = sqlx::query_scalar("SELECT id FROM bookmarks WHERE post_id = $1")
        .bind(newer_post)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(page.next_cursor, Some(cursor));
}

#[tokio::test]
async fn test_following_feed_and_search() {
    let db = start_db().await;
    let ada = create_user(&db.pool, "ada").await;
    let grace = create_user(&db.pool, "grace").await;
    let linus = create_user(&db.pool, "linus").await;

    sqlx::query("INSERT INTO posts (id, content, user_id) VALUES ($1, 'compilers are fun #rust', $2)")
        .bind(Uuid::new_v4())
        .bind(grace.id)
        .execute(&db.pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO posts (id, content, user_id) VALUES ($1, 'kernels and #Rust', $2)")
        .bind(Uuid::new_v4())
        .bind(linus.id)
        .execute(&db.pool)
        .await
        .unwrap();

    InteractionService::new(db.pool.clone())
        .follow(ada.id, grace.id)
        .await
        .unwrap();

    let service = PostService::new(db.pool.clone());
    let following = service
        .feed(ada.id, PostFeed::Following, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(following.posts.len(), 1);
    assert_eq!(following.posts[0].user.id, grace.id);

    let found = service
        .feed(ada.id, PostFeed::Search("compilers"), PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(found.posts.len(), 1);

    let by_name = service
        .feed(ada.id, PostFeed::Search("linus"), PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(by_name.posts.len(), 1);

    let blank = service
        .feed(ada.id, PostFeed::Search("   "), PageRequest::first(10))
        .await
        .unwrap();
    assert!(blank.posts.is_empty());

    let topics = social_service::db::posts::trending_topics(&db.pool, 5).await.unwrap();
    assert_eq!(topics[0].hashtag, "#rust");
    assert_eq!(topics[0].count, 2);
}

#[tokio::test]
async fn test_signup_rolls_back_when_chat_fails() {
    let db = start_db().await;
    let service = AccountService::new(db.pool.clone(), Arc::new(FakeChat::failing()));

    let result = service
        .signup(SignupRequest {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "correct horse".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AppError::Upstream(_))));
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn test_signup_rejects_taken_username_case_insensitively() {
    let db = start_db().await;
    let chat = Arc::new(FakeChat::default());
    let service = AccountService::new(db.pool.clone(), chat.clone());

    let user = service
        .signup(SignupRequest {
            email: "ada@example.com".to_string(),
            username: "Ada".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(chat.upserts.lock().unwrap()[0].id, user.id);

    let err = service
        .signup(SignupRequest {
            email: "other@example.com".to_string(),
            username: "ada".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Username is already taken");

    let err = service
        .signup(SignupRequest {
            email: "ADA@example.com".to_string(),
            username: "lovelace".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Email is already taken");
}

#[tokio::test]
async fn test_sessions_slide_and_expire() {
    let db = start_db().await;
    let user = create_user(&db.pool, "ada").await;
    let sessions = SessionService::new(db.pool.clone());

    let (token, session) = sessions.create_session(user.id).await.unwrap();
    let validated = sessions.validate(&token).await.unwrap().unwrap();
    assert_eq!(validated.user_id, user.id);
    assert!(!validated.fresh);

    sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
        .bind(&session.id)
        .bind(Utc::now() + Duration::days(2))
        .execute(&db.pool)
        .await
        .unwrap();
    let refreshed = sessions.validate(&token).await.unwrap().unwrap();
    assert!(refreshed.fresh);
    assert!(refreshed.expires_at > Utc::now() + Duration::days(29));

    sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
        .bind(&session.id)
        .bind(Utc::now() - Duration::seconds(1))
        .execute(&db.pool)
        .await
        .unwrap();
    assert!(sessions.validate(&token).await.unwrap().is_none());
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM sessions").await, 0);

    assert!(sessions.validate("not-a-token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_orphaned_uploads_are_swept() {
    let db = start_db().await;
    let author = create_user(&db.pool, "author").await;
    let post_id = post_at(&db.pool, author.id, 0).await;

    for (key, attached) in [("orphan.png", false), ("used.png", true)] {
        sqlx::query(
            "INSERT INTO media (id, post_id, type, url, created_at) \
             VALUES ($1, $2, 'IMAGE', $3, NOW() - INTERVAL '2 days')",
        )
        .bind(Uuid::new_v4())
        .bind(attached.then_some(post_id))
        .bind(format!("https://utfs.io/a/testapp/{}", key))
        .execute(&db.pool)
        .await
        .unwrap();
    }

    let file_host = FakeFileHost::default();
    let deleted = MediaService::new(db.pool.clone())
        .clear_orphans(&file_host, true)
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(*file_host.deleted.lock().unwrap(), vec!["orphan.png".to_string()]);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM media").await, 1);
}
