use crate::domain::models::FollowerInfo;
use crate::error::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Create the follow edge. Returns `false` when it already existed.
pub async fn insert_follow(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    following_id: Uuid,
) -> Result<bool> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO follows (id, follower_id, following_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (follower_id, following_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(follower_id)
    .bind(following_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(inserted.is_some())
}

pub async fn delete_follow(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    following_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
        .bind(follower_id)
        .bind(following_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Follower counter and viewer flag, `None` if the user does not exist
pub async fn follower_info(
    pool: &PgPool,
    viewer_id: Uuid,
    user_id: Uuid,
) -> Result<Option<FollowerInfo>> {
    let info = sqlx::query_as::<_, FollowerInfo>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM follows f WHERE f.following_id = u.id) AS followers,
            EXISTS(
                SELECT 1 FROM follows f
                WHERE f.following_id = u.id AND f.follower_id = $1
            ) AS is_followed_by_user
        FROM users u
        WHERE u.id = $2
        "#,
    )
    .bind(viewer_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(info)
}
