use crate::db::posts::{self, PostFeed, PostRow};
use crate::domain::models::{MediaData, PostData, PostsPage};
use crate::domain::requests::{CreatePostRequest, ValidatedRequest};
use crate::error::{AppError, Result};
use pagination::{paginate, PageRequest};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach media to post rows, keeping row order.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<PostData>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut attachments: HashMap<Uuid, Vec<MediaData>> = HashMap::new();
        for media in posts::attachments_for(&self.pool, &ids).await? {
            if let Some(post_id) = media.post_id {
                attachments.entry(post_id).or_default().push(media.into());
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let media = attachments.remove(&row.id).unwrap_or_default();
                row.into_post_data(media)
            })
            .collect())
    }

    pub async fn create_post(&self, author_id: Uuid, request: CreatePostRequest) -> Result<PostData> {
        let request = request.into_valid()?;
        let post_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        posts::insert_post(&mut tx, post_id, author_id, &request.content).await?;
        posts::attach_media(&mut tx, post_id, &request.media_ids).await?;
        let row = posts::find_post(&mut *tx, author_id, post_id)
            .await?
            .ok_or_else(|| AppError::Internal("created post not readable".to_string()))?;
        tx.commit().await?;

        info!(user_id = %author_id, post_id = %post_id, "Post created");
        self.single(row).await
    }

    async fn single(&self, row: PostRow) -> Result<PostData> {
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("post hydration lost a row".to_string()))
    }

    pub async fn get_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<PostData> {
        let row = posts::find_post(&self.pool, viewer_id, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        self.single(row).await
    }

    /// Delete a post the viewer wrote; returns it as it was.
    pub async fn delete_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<PostData> {
        let post = self.get_post(viewer_id, post_id).await?;
        if post.user.id != viewer_id {
            return Err(AppError::Unauthorized);
        }

        posts::delete_post(&self.pool, post_id).await?;
        info!(user_id = %viewer_id, post_id = %post_id, "Post deleted");
        Ok(post)
    }

    pub async fn feed(&self, viewer_id: Uuid, feed: PostFeed<'_>, page: PageRequest) -> Result<PostsPage> {
        if let PostFeed::Search(terms) = feed {
            if terms.trim().is_empty() {
                return Ok(PostsPage {
                    posts: Vec::new(),
                    next_cursor: None,
                });
            }
        }

        let rows = posts::list_posts(&self.pool, viewer_id, feed, &page).await?;
        let page = paginate(rows, page.page_size);

        Ok(PostsPage {
            posts: self.hydrate(page.items).await?,
            next_cursor: page.next_cursor,
        })
    }
}
