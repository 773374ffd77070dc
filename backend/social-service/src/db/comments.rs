use crate::domain::models::{CommentData, UserSummary};
use crate::error::Result;
use chrono::{DateTime, Utc};
use pagination::{Cursored, Keyset, PageRequest};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const COMMENTS_KEYSET: Keyset = Keyset::new("comments", "c");

const COMMENT_SELECT: &str = "SELECT c.id, c.content, c.created_at, c.post_id, \
    u.id AS user_id, u.username, u.display_name, u.avatar_url \
    FROM comments c JOIN users u ON u.id = c.user_id";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Cursored for CommentRow {
    fn cursor_id(&self) -> Uuid {
        self.id
    }
}

impl From<CommentRow> for CommentData {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            post_id: row.post_id,
            user: UserSummary {
                id: row.user_id,
                username: row.username,
                display_name: row.display_name,
                avatar_url: row.avatar_url,
            },
        }
    }
}

fn thread_query<'a>(post_id: Uuid, page: &PageRequest) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(COMMENT_SELECT);
    qb.push(" WHERE c.post_id = ");
    qb.push_bind(post_id);
    COMMENTS_KEYSET.push_page(&mut qb, page);
    qb
}

/// Fetch `page_size + 1` comments of a post, newest first.
pub async fn list_comments(pool: &PgPool, post_id: Uuid, page: &PageRequest) -> Result<Vec<CommentRow>> {
    let mut qb = thread_query(post_id, page);
    let rows = qb.build_query_as::<CommentRow>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: Uuid,
) -> Result<Option<CommentRow>> {
    let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
    let row = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(comment_id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

pub async fn insert_comment(
    tx: &mut Transaction<'_, Postgres>,
    comment_id: Uuid,
    user_id: Uuid,
    post_id: Uuid,
    content: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, content, user_id, post_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(comment_id)
    .bind(content)
    .bind(user_id)
    .bind(post_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn delete_comment(pool: &PgPool, comment_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
