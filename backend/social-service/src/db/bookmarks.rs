use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Idempotent; returns `false` when the bookmark already existed.
pub async fn insert_bookmark(pool: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<bool> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO bookmarks (id, user_id, post_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, post_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

pub async fn delete_bookmark(pool: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_bookmarked(pool: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<bool> {
    let bookmarked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE user_id = $1 AND post_id = $2)",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    Ok(bookmarked)
}
