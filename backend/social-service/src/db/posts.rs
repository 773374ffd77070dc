use crate::domain::models::{Media, MediaData, PostData, TrendingTopic, UserSummary};
use crate::error::Result;
use chrono::{DateTime, Utc};
use pagination::{Cursored, Keyset, PageRequest};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const POSTS_KEYSET: Keyset = Keyset::new("posts", "p");
const BOOKMARKS_KEYSET: Keyset = Keyset::new("bookmarks", "bm");

const POSTS_FROM: &str = " FROM posts p JOIN users u ON u.id = p.user_id WHERE TRUE";
const BOOKMARKS_FROM: &str = " FROM bookmarks bm \
    JOIN posts p ON p.id = bm.post_id \
    JOIN users u ON u.id = p.user_id \
    WHERE TRUE";

/// A post joined with its author, counters and the viewer's flags.
///
/// `cursor_id` is the id paging runs on: the post id for feeds, the bookmark
/// id for the bookmarks list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub cursor_id: Uuid,
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked_by_user: bool,
    pub is_bookmarked_by_user: bool,
}

impl Cursored for PostRow {
    fn cursor_id(&self) -> Uuid {
        self.cursor_id
    }
}

impl PostRow {
    pub fn into_post_data(self, attachments: Vec<MediaData>) -> PostData {
        PostData {
            id: self.id,
            content: self.content,
            created_at: self.created_at,
            user: UserSummary {
                id: self.user_id,
                username: self.username,
                display_name: self.display_name,
                avatar_url: self.avatar_url,
            },
            attachments,
            likes: self.like_count,
            comments: self.comment_count,
            is_liked_by_user: self.is_liked_by_user,
            is_bookmarked_by_user: self.is_bookmarked_by_user,
        }
    }
}

/// Which list of posts to read
#[derive(Debug, Clone, Copy)]
pub enum PostFeed<'a> {
    /// Every post
    ForYou,
    /// Posts by users the viewer follows
    Following,
    ByUser(Uuid),
    /// The viewer's bookmarks, most recently bookmarked first
    Bookmarked,
    /// Full-text match on content, display name or username
    Search(&'a str),
}

fn select_posts<'a>(viewer_id: Uuid, cursor_column: &str, from: &str) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(cursor_column);
    qb.push(
        " AS cursor_id, p.id, p.content, p.created_at, \
         u.id AS user_id, u.username, u.display_name, u.avatar_url, \
         (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
         (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count, \
         EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ",
    );
    qb.push_bind(viewer_id);
    qb.push(
        ") AS is_liked_by_user, \
         EXISTS(SELECT 1 FROM bookmarks b WHERE b.post_id = p.id AND b.user_id = ",
    );
    qb.push_bind(viewer_id);
    qb.push(") AS is_bookmarked_by_user");
    qb.push(from);
    qb
}

fn feed_query<'a>(viewer_id: Uuid, feed: PostFeed<'a>, page: &PageRequest) -> QueryBuilder<'a, Postgres> {
    match feed {
        PostFeed::ForYou => {
            let mut qb = select_posts(viewer_id, "p.id", POSTS_FROM);
            POSTS_KEYSET.push_page(&mut qb, page);
            qb
        }
        PostFeed::Following => {
            let mut qb = select_posts(viewer_id, "p.id", POSTS_FROM);
            qb.push(" AND p.user_id IN (SELECT following_id FROM follows WHERE follower_id = ");
            qb.push_bind(viewer_id);
            qb.push(")");
            POSTS_KEYSET.push_page(&mut qb, page);
            qb
        }
        PostFeed::ByUser(user_id) => {
            let mut qb = select_posts(viewer_id, "p.id", POSTS_FROM);
            qb.push(" AND p.user_id = ");
            qb.push_bind(user_id);
            POSTS_KEYSET.push_page(&mut qb, page);
            qb
        }
        PostFeed::Bookmarked => {
            let mut qb = select_posts(viewer_id, "bm.id", BOOKMARKS_FROM);
            qb.push(" AND bm.user_id = ");
            qb.push_bind(viewer_id);
            BOOKMARKS_KEYSET.push_page(&mut qb, page);
            qb
        }
        PostFeed::Search(terms) => {
            let mut qb = select_posts(viewer_id, "p.id", POSTS_FROM);
            qb.push(" AND (to_tsvector('english', p.content) @@ plainto_tsquery('english', ");
            qb.push_bind(terms);
            qb.push(") OR to_tsvector('simple', u.display_name) @@ plainto_tsquery('simple', ");
            qb.push_bind(terms);
            qb.push(") OR to_tsvector('simple', u.username) @@ plainto_tsquery('simple', ");
            qb.push_bind(terms);
            qb.push("))");
            POSTS_KEYSET.push_page(&mut qb, page);
            qb
        }
    }
}

/// Fetch `page_size + 1` rows of a feed, newest first.
pub async fn list_posts(
    pool: &PgPool,
    viewer_id: Uuid,
    feed: PostFeed<'_>,
    page: &PageRequest,
) -> Result<Vec<PostRow>> {
    let mut qb = feed_query(viewer_id, feed, page);
    let rows = qb.build_query_as::<PostRow>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_post<'e, E: PgExecutor<'e>>(
    executor: E,
    viewer_id: Uuid,
    post_id: Uuid,
) -> Result<Option<PostRow>> {
    let mut qb = select_posts(viewer_id, "p.id", POSTS_FROM);
    qb.push(" AND p.id = ");
    qb.push_bind(post_id);

    let row = qb.build_query_as::<PostRow>().fetch_optional(executor).await?;
    Ok(row)
}

pub async fn post_author<'e, E: PgExecutor<'e>>(executor: E, post_id: Uuid) -> Result<Option<Uuid>> {
    let author = sqlx::query_scalar("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(executor)
        .await?;

    Ok(author)
}

pub async fn insert_post(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, content, user_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(post_id)
    .bind(content)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Attach uploaded media that is not used by another post yet.
pub async fn attach_media(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    media_ids: &[Uuid],
) -> Result<u64> {
    if media_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        UPDATE media
        SET post_id = $1
        WHERE id = ANY($2) AND post_id IS NULL
        "#,
    )
    .bind(post_id)
    .bind(media_ids)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Attachments of the given posts, oldest upload first
pub async fn attachments_for<'e, E: PgExecutor<'e>>(
    executor: E,
    post_ids: &[Uuid],
) -> Result<Vec<Media>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let media = sqlx::query_as::<_, Media>(
        r#"
        SELECT id, post_id, type, url, created_at
        FROM media
        WHERE post_id = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await?;

    Ok(media)
}

/// Most used hashtags across all posts
pub async fn trending_topics(pool: &PgPool, limit: i64) -> Result<Vec<TrendingTopic>> {
    let topics = sqlx::query_as::<_, TrendingTopic>(
        r#"
        SELECT LOWER(m[1]) AS hashtag, COUNT(*) AS count
        FROM posts p, regexp_matches(p.content, '#[[:alnum:]_]+', 'g') AS m
        GROUP BY LOWER(m[1])
        ORDER BY 2 DESC, 1 ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmarks_page_runs_on_bookmark_ids() {
        let page = PageRequest::new(Some(Uuid::new_v4()), 10);
        let qb = feed_query(Uuid::new_v4(), PostFeed::Bookmarked, &page);
        let sql = qb.sql();

        assert!(sql.starts_with("SELECT bm.id AS cursor_id"));
        assert!(sql.contains("(SELECT created_at, id FROM bookmarks WHERE id = $4)"));
        assert!(sql.ends_with("ORDER BY bm.created_at DESC, bm.id DESC LIMIT $5"));
    }

    #[test]
    fn test_following_feed_filters_on_follows() {
        let qb = feed_query(Uuid::new_v4(), PostFeed::Following, &PageRequest::first(10));
        let sql = qb.sql();

        assert!(sql.contains("p.user_id IN (SELECT following_id FROM follows WHERE follower_id = $3)"));
        assert!(sql.ends_with("ORDER BY p.created_at DESC, p.id DESC LIMIT $4"));
    }

    #[test]
    fn test_search_binds_terms_three_times() {
        let qb = feed_query(Uuid::new_v4(), PostFeed::Search("rust async"), &PageRequest::first(10));
        let sql = qb.sql();

        assert!(sql.contains("plainto_tsquery('english', $3)"));
        assert!(sql.contains("plainto_tsquery('simple', $5)"));
        assert!(sql.ends_with("LIMIT $6"));
    }
}
