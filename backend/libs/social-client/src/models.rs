//! Wire types of the social API (camelCase JSON)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaData {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
    #[serde(default)]
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

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    pub media_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInfo {
    pub likes: i64,
    pub is_liked_by_user: bool,
}

impl LikeInfo {
    /// State after the viewer flips their like
    pub fn toggled(self) -> Self {
        Self {
            likes: self.likes + if self.is_liked_by_user { -1 } else { 1 },
            is_liked_by_user: !self.is_liked_by_user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerInfo {
    pub followers: i64,
    pub is_followed_by_user: bool,
}

impl FollowerInfo {
    pub fn toggled(self) -> Self {
        Self {
            followers: self.followers + if self.is_followed_by_user { -1 } else { 1 },
            is_followed_by_user: !self.is_followed_by_user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkInfo {
    pub is_bookmarked_by_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Like,
    Follow,
    Comment,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_toggle_moves_count_with_flag() {
        let liked = LikeInfo {
            likes: 4,
            is_liked_by_user: false,
        }
        .toggled();
        assert_eq!(
            liked,
            LikeInfo {
                likes: 5,
                is_liked_by_user: true
            }
        );
        assert_eq!(
            liked.toggled(),
            LikeInfo {
                likes: 4,
                is_liked_by_user: false
            }
        );
    }

    #[test]
    fn test_posts_page_reads_server_json() {
        let page: PostsPage = serde_json::from_value(serde_json::json!({
            "posts": [{
                "id": "7f1d5c36-7c52-4c55-9b0b-0e6a5c3b7b11",
                "content": "hi",
                "createdAt": "2024-05-01T12:00:00Z",
                "user": {
                    "id": "0d8f9d42-1a8e-4f0b-9b57-1f3f1b8b2a10",
                    "username": "ada",
                    "displayName": "Ada",
                    "avatarUrl": null
                },
                "attachments": [],
                "likes": 2,
                "comments": 0,
                "isLikedByUser": true,
                "isBookmarkedByUser": false
            }],
            "nextCursor": null
        }))
        .unwrap();

        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].user.display_name, "Ada");
        assert!(page.next_cursor.is_none());
    }
}
