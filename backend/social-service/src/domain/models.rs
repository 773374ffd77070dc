use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a notification was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Like,
    Follow,
    Comment,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "LIKE",
            NotificationType::Follow => "FOLLOW",
            NotificationType::Comment => "COMMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// `image/*` is an image, anything else the uploader accepts is a video.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().to_ascii_lowercase().starts_with("image") {
            MediaType::Image
        } else {
            MediaType::Video
        }
    }
}

/// User entity
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Session entity; `id` is the digest of the cookie token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Uploaded attachment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Media {
    pub id: Uuid,
    pub post_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

// ---- API payloads ----

/// Author block embedded in posts, comments and notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Profile as shown on a user page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub followers: i64,
    pub posts: i64,
    pub is_followed_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaData {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

impl From<Media> for MediaData {
    fn from(media: Media) -> Self {
        Self {
            id: media.id,
            media_type: media.media_type,
            url: media.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
    pub attachments: Vec<MediaData>,
    pub likes: i64,
    pub comments: i64,
    pub is_liked_by_user: bool,
    pub is_bookmarked_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub posts: Vec<PostData>,
    pub next_cursor: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentData {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: Uuid,
    pub user: UserSummary,
}

/// Oldest-first comment page; `previous_cursor` loads earlier comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsPage {
    pub comments: Vec<CommentData>,
    pub previous_cursor: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPost {
    pub id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub issuer: UserSummary,
    pub post: Option<NotificationPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsPage {
    pub notifications: Vec<NotificationData>,
    pub next_cursor: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LikeInfo {
    pub likes: i64,
    pub is_liked_by_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkInfo {
    pub is_bookmarked_by_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FollowerInfo {
    pub followers: i64,
    pub is_followed_by_user: bool,
}

/// Unread badge count (notifications and chat messages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendingTopic {
    pub hashtag: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/png"), MediaType::Image);
        assert_eq!(MediaType::from_mime("IMAGE/JPEG"), MediaType::Image);
        assert_eq!(MediaType::from_mime("video/mp4"), MediaType::Video);
    }

    #[test]
    fn test_payloads_use_camel_case() {
        let info = LikeInfo {
            likes: 3,
            is_liked_by_user: true,
        };
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            serde_json::json!({"likes": 3, "isLikedByUser": true})
        );

        let count = UnreadCount { unread_count: 2 };
        assert_eq!(
            serde_json::to_value(count).unwrap(),
            serde_json::json!({"unreadCount": 2})
        );
    }

    #[test]
    fn test_notification_type_is_uppercase() {
        assert_eq!(
            serde_json::to_value(NotificationType::Follow).unwrap(),
            serde_json::json!("FOLLOW")
        );
    }
}
