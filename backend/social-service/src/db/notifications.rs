//! Notification rows.
//!
//! Every notification insert and delete in the service goes through this
//! module and runs inside the transaction of the write that caused it.

use crate::domain::models::{NotificationData, NotificationPost, NotificationType, UserSummary};
use crate::error::Result;
use chrono::{DateTime, Utc};
use pagination::{Cursored, Keyset, PageRequest};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const NOTIFICATIONS_KEYSET: Keyset = Keyset::new("notifications", "n");

/// What a write wants to tell its target's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewNotification {
    pub issuer_id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub post_id: Option<Uuid>,
}

impl NewNotification {
    /// Users are never notified about their own actions.
    pub fn is_self(&self) -> bool {
        self.issuer_id == self.recipient_id
    }
}

/// Insert the notification unless issuer and recipient are the same user.
/// Returns whether a row was written.
pub async fn notify(tx: &mut Transaction<'_, Postgres>, notification: NewNotification) -> Result<bool> {
    if notification.is_self() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient_id, issuer_id, post_id, type)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(notification.recipient_id)
    .bind(notification.issuer_id)
    .bind(notification.post_id)
    .bind(notification.notification_type)
    .execute(&mut **tx)
    .await?;

    Ok(true)
}

/// Remove the notifications an undone write had produced.
pub async fn retract(tx: &mut Transaction<'_, Postgres>, notification: NewNotification) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM notifications
        WHERE issuer_id = $1
          AND recipient_id = $2
          AND type = $3
          AND post_id IS NOT DISTINCT FROM $4
        "#,
    )
    .bind(notification.issuer_id)
    .bind(notification.recipient_id)
    .bind(notification.notification_type)
    .bind(notification.post_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub notification_type: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub issuer_id: Uuid,
    pub issuer_username: String,
    pub issuer_display_name: String,
    pub issuer_avatar_url: Option<String>,
    pub post_id: Option<Uuid>,
    pub post_content: Option<String>,
}

impl Cursored for NotificationRow {
    fn cursor_id(&self) -> Uuid {
        self.id
    }
}

impl From<NotificationRow> for NotificationData {
    fn from(row: NotificationRow) -> Self {
        let post = match (row.post_id, row.post_content) {
            (Some(id), Some(content)) => Some(NotificationPost { id, content }),
            _ => None,
        };

        Self {
            id: row.id,
            notification_type: row.notification_type,
            read: row.read,
            created_at: row.created_at,
            issuer: UserSummary {
                id: row.issuer_id,
                username: row.issuer_username,
                display_name: row.issuer_display_name,
                avatar_url: row.issuer_avatar_url,
            },
            post,
        }
    }
}

fn inbox_query<'a>(recipient_id: Uuid, page: &PageRequest) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT n.id, n.type, n.read, n.created_at, \
         i.id AS issuer_id, i.username AS issuer_username, \
         i.display_name AS issuer_display_name, i.avatar_url AS issuer_avatar_url, \
         p.id AS post_id, p.content AS post_content \
         FROM notifications n \
         JOIN users i ON i.id = n.issuer_id \
         LEFT JOIN posts p ON p.id = n.post_id \
         WHERE n.recipient_id = ",
    );
    qb.push_bind(recipient_id);
    NOTIFICATIONS_KEYSET.push_page(&mut qb, page);
    qb
}

pub async fn list_notifications(
    pool: &PgPool,
    recipient_id: Uuid,
    page: &PageRequest,
) -> Result<Vec<NotificationRow>> {
    let mut qb = inbox_query(recipient_id, page);
    let rows = qb.build_query_as::<NotificationRow>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn unread_count(pool: &PgPool, recipient_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = FALSE",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND read = FALSE",
    )
    .bind(recipient_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
