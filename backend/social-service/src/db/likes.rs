use crate::domain::models::LikeInfo;
use crate::error::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Like a post. Returns `false` when the like already existed.
pub async fn insert_like(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<bool> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO likes (id, user_id, post_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, post_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(inserted.is_some())
}

pub async fn delete_like(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Like counter and viewer flag, `None` if the post does not exist
pub async fn like_info(pool: &PgPool, viewer_id: Uuid, post_id: Uuid) -> Result<Option<LikeInfo>> {
    let info = sqlx::query_as::<_, LikeInfo>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
            EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS is_liked_by_user
        FROM posts p
        WHERE p.id = $2
        "#,
    )
    .bind(viewer_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(info)
}
