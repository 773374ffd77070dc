use crate::db::comments;
use crate::db::notifications::{self, NewNotification};
use crate::db::posts;
use crate::domain::models::{CommentData, CommentsPage, NotificationType};
use crate::domain::requests::{CreateCommentRequest, ValidatedRequest};
use crate::error::{AppError, Result};
use crate::metrics;
use pagination::{paginate_backward, PageRequest};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Comments load five at a time
pub const COMMENTS_PAGE_SIZE: usize = 5;

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Oldest-first page ending at `cursor` (or at the newest comment).
    pub async fn list(&self, post_id: Uuid, cursor: Option<Uuid>) -> Result<CommentsPage> {
        let request = PageRequest::new(cursor, COMMENTS_PAGE_SIZE);
        let rows = comments::list_comments(&self.pool, post_id, &request).await?;
        let page = paginate_backward(rows, request.page_size).map(CommentData::from);

        Ok(CommentsPage {
            comments: page.items,
            previous_cursor: page.previous_cursor,
        })
    }

    pub async fn create(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
        request: CreateCommentRequest,
    ) -> Result<CommentData> {
        let request = request.into_valid()?;
        let comment_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        let author_id = posts::post_author(&mut *tx, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        comments::insert_comment(&mut tx, comment_id, viewer_id, post_id, &request.content).await?;
        let notified = notifications::notify(
            &mut tx,
            NewNotification {
                issuer_id: viewer_id,
                recipient_id: author_id,
                notification_type: NotificationType::Comment,
                post_id: Some(post_id),
            },
        )
        .await?;
        let comment = comments::find_comment(&mut *tx, comment_id)
            .await?
            .ok_or_else(|| AppError::Internal("created comment not readable".to_string()))?;
        tx.commit().await?;

        if notified {
            metrics::record_notification(NotificationType::Comment.as_str());
        }
        info!(user_id = %viewer_id, post_id = %post_id, "Comment created");
        Ok(comment.into())
    }

    /// Delete a comment the viewer wrote; returns it as it was.
    pub async fn delete(&self, viewer_id: Uuid, comment_id: Uuid) -> Result<CommentData> {
        let comment = comments::find_comment(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.user_id != viewer_id {
            return Err(AppError::Unauthorized);
        }

        comments::delete_comment(&self.pool, comment_id).await?;
        Ok(comment.into())
    }
}
