//! Likes, bookmarks and follows
//!
//! Writes are idempotent. A like or follow that creates a new row notifies
//! the target's owner in the same transaction; undoing it removes that
//! notification in the same transaction.

use crate::db::notifications::{self, NewNotification};
use crate::db::{bookmarks, follows, likes, posts, users};
use crate::domain::models::{BookmarkInfo, FollowerInfo, LikeInfo, NotificationType};
use crate::error::{AppError, Result};
use crate::metrics;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct InteractionService {
    pool: PgPool,
}

impl InteractionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn like_info(&self, viewer_id: Uuid, post_id: Uuid) -> Result<LikeInfo> {
        likes::like_info(&self.pool, viewer_id, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }

    pub async fn like(&self, viewer_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let author_id = posts::post_author(&mut *tx, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let mut notified = false;
        if likes::insert_like(&mut tx, viewer_id, post_id).await? {
            notified = notifications::notify(
                &mut tx,
                NewNotification {
                    issuer_id: viewer_id,
                    recipient_id: author_id,
                    notification_type: NotificationType::Like,
                    post_id: Some(post_id),
                },
            )
            .await?;
        }
        tx.commit().await?;

        metrics::record_toggle("like", "add");
        if notified {
            metrics::record_notification(NotificationType::Like.as_str());
        }
        Ok(())
    }

    pub async fn unlike(&self, viewer_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let author_id = posts::post_author(&mut *tx, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        likes::delete_like(&mut tx, viewer_id, post_id).await?;
        notifications::retract(
            &mut tx,
            NewNotification {
                issuer_id: viewer_id,
                recipient_id: author_id,
                notification_type: NotificationType::Like,
                post_id: Some(post_id),
            },
        )
        .await?;
        tx.commit().await?;

        metrics::record_toggle("like", "remove");
        Ok(())
    }

    pub async fn bookmark_info(&self, viewer_id: Uuid, post_id: Uuid) -> Result<BookmarkInfo> {
        Ok(BookmarkInfo {
            is_bookmarked_by_user: bookmarks::is_bookmarked(&self.pool, viewer_id, post_id).await?,
        })
    }

    pub async fn bookmark(&self, viewer_id: Uuid, post_id: Uuid) -> Result<()> {
        if posts::post_author(&self.pool, post_id).await?.is_none() {
            return Err(AppError::not_found("Post not found"));
        }

        bookmarks::insert_bookmark(&self.pool, viewer_id, post_id).await?;
        metrics::record_toggle("bookmark", "add");
        Ok(())
    }

    pub async fn unbookmark(&self, viewer_id: Uuid, post_id: Uuid) -> Result<()> {
        bookmarks::delete_bookmark(&self.pool, viewer_id, post_id).await?;
        metrics::record_toggle("bookmark", "remove");
        Ok(())
    }

    pub async fn follower_info(&self, viewer_id: Uuid, user_id: Uuid) -> Result<FollowerInfo> {
        follows::follower_info(&self.pool, viewer_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn follow(&self, viewer_id: Uuid, user_id: Uuid) -> Result<()> {
        if !users::exists(&self.pool, user_id).await? {
            return Err(AppError::not_found("User not found"));
        }

        let mut tx = self.pool.begin().await?;
        let mut notified = false;
        if follows::insert_follow(&mut tx, viewer_id, user_id).await? {
            notified = notifications::notify(
                &mut tx,
                NewNotification {
                    issuer_id: viewer_id,
                    recipient_id: user_id,
                    notification_type: NotificationType::Follow,
                    post_id: None,
                },
            )
            .await?;
        }
        tx.commit().await?;

        metrics::record_toggle("follow", "add");
        if notified {
            metrics::record_notification(NotificationType::Follow.as_str());
        }
        Ok(())
    }

    pub async fn unfollow(&self, viewer_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        follows::delete_follow(&mut tx, viewer_id, user_id).await?;
        notifications::retract(
            &mut tx,
            NewNotification {
                issuer_id: viewer_id,
                recipient_id: user_id,
                notification_type: NotificationType::Follow,
                post_id: None,
            },
        )
        .await?;
        tx.commit().await?;

        metrics::record_toggle("follow", "remove");
        Ok(())
    }
}
