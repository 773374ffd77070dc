use crate::domain::models::{User, UserData};
use crate::error::Result;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Profile projection; `$1` is the viewing user.
const USER_DATA_SELECT: &str = r#"
    SELECT
        u.id, u.username, u.display_name, u.avatar_url, u.bio, u.created_at,
        (SELECT COUNT(*) FROM follows f WHERE f.following_id = u.id) AS followers,
        (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS posts,
        EXISTS(
            SELECT 1 FROM follows f
            WHERE f.following_id = u.id AND f.follower_id = $1
        ) AS is_followed_by_user
    FROM users u
"#;

pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub display_name: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub google_id: Option<&'a str>,
}

pub async fn insert_user(tx: &mut Transaction<'_, Postgres>, user: NewUser<'_>) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, display_name, email, password_hash, google_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, username, display_name, email, password_hash, google_id, avatar_url, bio, created_at
        "#,
    )
    .bind(user.id)
    .bind(user.username)
    .bind(user.display_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.google_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Case-insensitive username lookup
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_google_id(pool: &PgPool, google_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = $1")
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(pool)
            .await?;

    Ok(taken)
}

pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

pub async fn user_data_by_username(
    pool: &PgPool,
    viewer_id: Uuid,
    username: &str,
) -> Result<Option<UserData>> {
    let sql = format!("{USER_DATA_SELECT} WHERE LOWER(u.username) = LOWER($2)");
    let data = sqlx::query_as::<_, UserData>(&sql)
        .bind(viewer_id)
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(data)
}

pub async fn user_data_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    viewer_id: Uuid,
    user_id: Uuid,
) -> Result<Option<UserData>> {
    let sql = format!("{USER_DATA_SELECT} WHERE u.id = $2");
    let data = sqlx::query_as::<_, UserData>(&sql)
        .bind(viewer_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(data)
}

/// Users the viewer does not follow yet, newest accounts first
pub async fn suggestions(pool: &PgPool, viewer_id: Uuid, limit: i64) -> Result<Vec<UserData>> {
    let sql = format!(
        "{USER_DATA_SELECT}
        WHERE u.id <> $1
          AND NOT EXISTS (
              SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.following_id = u.id
          )
        ORDER BY u.created_at DESC, u.id DESC
        LIMIT $2"
    );
    let users = sqlx::query_as::<_, UserData>(&sql)
        .bind(viewer_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(users)
}

pub async fn update_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    display_name: &str,
    bio: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET display_name = $2, bio = $3
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(bio)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Replace the avatar URL, returning the previous one.
pub async fn replace_avatar(pool: &PgPool, user_id: Uuid, url: &str) -> Result<Option<String>> {
    let previous: Option<Option<String>> = sqlx::query_scalar(
        r#"
        UPDATE users u
        SET avatar_url = $2
        FROM (SELECT id, avatar_url FROM users WHERE id = $1 FOR UPDATE) old
        WHERE u.id = old.id
        RETURNING old.avatar_url
        "#,
    )
    .bind(user_id)
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(previous.flatten())
}
