use crate::domain::models::Session;
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_session(
    pool: &PgPool,
    id: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, expires_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

pub async fn find_session(pool: &PgPool, id: &str) -> Result<Option<Session>> {
    let session =
        sqlx::query_as::<_, Session>("SELECT id, user_id, expires_at FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(session)
}

pub async fn extend_session(pool: &PgPool, id: &str, expires_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
        .bind(id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_session(pool: &PgPool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_expired_sessions(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
