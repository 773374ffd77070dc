use crate::domain::models::{Media, MediaType};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_media(
    pool: &PgPool,
    id: Uuid,
    media_type: MediaType,
    url: &str,
) -> Result<Media> {
    let media = sqlx::query_as::<_, Media>(
        r#"
        INSERT INTO media (id, type, url)
        VALUES ($1, $2, $3)
        RETURNING id, post_id, type, url, created_at
        "#,
    )
    .bind(id)
    .bind(media_type)
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(media)
}

/// Uploads never attached to a post, created at or before `cutoff`
pub async fn orphaned_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<Vec<Media>> {
    let media = sqlx::query_as::<_, Media>(
        r#"
        SELECT id, post_id, type, url, created_at
        FROM media
        WHERE post_id IS NULL AND created_at <= $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(media)
}

pub async fn delete_media(pool: &PgPool, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM media WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
