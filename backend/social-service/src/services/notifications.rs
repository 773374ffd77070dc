use crate::db::notifications;
use crate::domain::models::{NotificationData, NotificationsPage, UnreadCount};
use crate::error::Result;
use pagination::{paginate, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, recipient_id: Uuid, page: PageRequest) -> Result<NotificationsPage> {
        let rows = notifications::list_notifications(&self.pool, recipient_id, &page).await?;
        let page = paginate(rows, page.page_size).map(NotificationData::from);

        Ok(NotificationsPage {
            notifications: page.items,
            next_cursor: page.next_cursor,
        })
    }

    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<UnreadCount> {
        Ok(UnreadCount {
            unread_count: notifications::unread_count(&self.pool, recipient_id).await?,
        })
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        notifications::mark_all_read(&self.pool, recipient_id).await
    }
}
