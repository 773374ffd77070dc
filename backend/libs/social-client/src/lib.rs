//! # Social API client
//!
//! Typed `reqwest` client for the social service with a [`QueryCache`] in
//! front of every read. Toggles (like, follow, bookmark) update the cached
//! counters before the request goes out and roll back when it fails; post
//! submission and deletion patch the cached feeds in place.

mod error;
pub mod models;

pub use error::{ClientError, Result};

use models::{
    BookmarkInfo, FollowerInfo, LikeInfo, NewPost, NotificationData, NotificationsPage, PostData,
    PostsPage, UnreadCount,
};
use query_cache::{InfinitePages, PageData, QueryCache};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// Cached post lists
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKey {
    ForYou,
    Following,
    Bookmarks,
    User(Uuid),
}

impl FeedKey {
    fn path(&self) -> String {
        match self {
            FeedKey::ForYou => "/api/posts/for-you".to_string(),
            FeedKey::Following => "/api/posts/following".to_string(),
            FeedKey::Bookmarks => "/api/posts/bookmarked".to_string(),
            FeedKey::User(user_id) => format!("/api/users/{}/posts", user_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct SocialClient {
    http: Client,
    base_url: String,
    session: Option<String>,

    pub likes: QueryCache<Uuid, LikeInfo>,
    pub followers: QueryCache<Uuid, FollowerInfo>,
    pub bookmarks: QueryCache<Uuid, BookmarkInfo>,
    pub feeds: QueryCache<FeedKey, InfinitePages<PostData>>,
    pub notifications: QueryCache<(), InfinitePages<NotificationData>>,
    pub unread: QueryCache<(), UnreadCount>,
}

impl SocialClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
            likes: QueryCache::new(),
            followers: QueryCache::new(),
            bookmarks: QueryCache::new(),
            feeds: QueryCache::new(),
            notifications: QueryCache::new(),
            unread: QueryCache::new(),
        }
    }

    /// Send `auth_session=<token>` with every request.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.session {
            Some(token) => builder.header(
                reqwest::header::COOKIE,
                format!("{}={}", SESSION_COOKIE_NAME, token),
            ),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        tracing::debug!(status = %status, message = %message, "Social API request failed");

        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, cursor: Option<Uuid>) -> Result<T> {
        let mut builder = self.request(Method::GET, path);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("cursor", cursor.to_string())]);
        }
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        Self::check(self.request(method, path).send().await?).await?;
        Ok(())
    }

    // ---- likes ----

    pub async fn like_info(&self, post_id: Uuid) -> Result<LikeInfo> {
        let path = format!("/api/posts/{}/likes", post_id);
        self.likes
            .fetch(post_id, self.get_json(&path, None))
            .await
    }

    /// Like or unlike depending on the cached state.
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<()> {
        let current = match self.likes.get(&post_id) {
            Some(info) => info,
            None => self.like_info(post_id).await?,
        };
        let method = if current.is_liked_by_user {
            Method::DELETE
        } else {
            Method::POST
        };
        let path = format!("/api/posts/{}/likes", post_id);

        self.likes
            .mutate_optimistic(
                post_id,
                |cached| cached.copied().unwrap_or(current).toggled(),
                self.send_empty(method, &path),
            )
            .await
    }

    // ---- follows ----

    pub async fn follower_info(&self, user_id: Uuid) -> Result<FollowerInfo> {
        let path = format!("/api/users/{}/followers", user_id);
        self.followers
            .fetch(user_id, self.get_json(&path, None))
            .await
    }

    pub async fn toggle_follow(&self, user_id: Uuid) -> Result<()> {
        let current = match self.followers.get(&user_id) {
            Some(info) => info,
            None => self.follower_info(user_id).await?,
        };
        let method = if current.is_followed_by_user {
            Method::DELETE
        } else {
            Method::POST
        };
        let path = format!("/api/users/{}/followers", user_id);

        self.followers
            .mutate_optimistic(
                user_id,
                |cached| cached.copied().unwrap_or(current).toggled(),
                self.send_empty(method, &path),
            )
            .await
    }

    // ---- bookmarks ----

    pub async fn bookmark_info(&self, post_id: Uuid) -> Result<BookmarkInfo> {
        let path = format!("/api/posts/{}/bookmark", post_id);
        self.bookmarks
            .fetch(post_id, self.get_json(&path, None))
            .await
    }

    pub async fn toggle_bookmark(&self, post_id: Uuid) -> Result<()> {
        let current = match self.bookmarks.get(&post_id) {
            Some(info) => info,
            None => self.bookmark_info(post_id).await?,
        };
        let method = if current.is_bookmarked_by_user {
            Method::DELETE
        } else {
            Method::POST
        };
        let path = format!("/api/posts/{}/bookmark", post_id);

        self.bookmarks
            .mutate_optimistic(
                post_id,
                |cached| BookmarkInfo {
                    is_bookmarked_by_user: !cached.copied().unwrap_or(current).is_bookmarked_by_user,
                },
                self.send_empty(method, &path),
            )
            .await?;

        // the bookmarks list is ordered by bookmark time; refetch it
        self.feeds.remove(&FeedKey::Bookmarks);
        Ok(())
    }

    // ---- feeds ----

    /// Load a page of `feed`. Without a cursor the cached pages are replaced,
    /// with one the page is appended ("load more").
    pub async fn feed_page(
        &self,
        feed: FeedKey,
        cursor: Option<Uuid>,
    ) -> Result<InfinitePages<PostData>> {
        let path = feed.path();
        let request = async {
            let page: PostsPage = self.get_json(&path, cursor).await?;
            let mut pages = match cursor {
                Some(_) => self.feeds.get(&feed).unwrap_or_default(),
                None => InfinitePages::new(),
            };
            pages.push_page(PageData {
                items: page.posts,
                next_cursor: page.next_cursor.map(|c| c.to_string()),
            });
            Ok::<_, ClientError>(pages)
        };

        self.feeds.fetch(feed.clone(), request).await
    }

    pub async fn for_you_page(&self, cursor: Option<Uuid>) -> Result<InfinitePages<PostData>> {
        self.feed_page(FeedKey::ForYou, cursor).await
    }

    /// Create a post and put it at the top of the cached for-you feed and
    /// the author's own feed.
    pub async fn submit_post(&self, post: &NewPost) -> Result<PostData> {
        let response = self
            .request(Method::POST, "/api/posts")
            .json(post)
            .send()
            .await?;
        let created: PostData = Self::check(response).await?.json().await?;

        let author = created.user.id;
        let touches =
            |key: &FeedKey| matches!(key, FeedKey::ForYou) || *key == FeedKey::User(author);
        self.feeds.cancel_where(touches);
        self.feeds.update_where(touches, |pages| {
            pages.prepend_to_first_page(created.clone());
        });

        Ok(created)
    }

    /// Delete a post and drop it from every cached feed.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<PostData> {
        let response = self
            .request(Method::DELETE, &format!("/api/posts/{}", post_id))
            .send()
            .await?;
        let deleted: PostData = Self::check(response).await?.json().await?;

        self.feeds.cancel_where(|_| true);
        self.feeds.update_where(
            |_| true,
            |pages| {
                pages.retain(|p| p.id != post_id);
            },
        );
        self.likes.remove(&post_id);
        self.bookmarks.remove(&post_id);

        Ok(deleted)
    }

    // ---- notifications ----

    pub async fn notifications_page(
        &self,
        cursor: Option<Uuid>,
    ) -> Result<InfinitePages<NotificationData>> {
        let request = async {
            let page: NotificationsPage = self.get_json("/api/notifications", cursor).await?;
            let mut pages = match cursor {
                Some(_) => self.notifications.get(&()).unwrap_or_default(),
                None => InfinitePages::new(),
            };
            pages.push_page(PageData {
                items: page.notifications,
                next_cursor: page.next_cursor.map(|c| c.to_string()),
            });
            Ok::<_, ClientError>(pages)
        };

        self.notifications.fetch((), request).await
    }

    pub async fn unread_notifications(&self) -> Result<UnreadCount> {
        self.unread
            .fetch((), self.get_json("/api/notifications/unread-count", None))
            .await
    }

    pub async fn mark_notifications_read(&self) -> Result<()> {
        self.send_empty(Method::PATCH, "/api/notifications/mark-as-read")
            .await?;

        self.unread.set((), UnreadCount { unread_count: 0 });
        self.notifications.update_where(
            |_| true,
            |pages| pages.for_each_mut(|n| n.read = true),
        );
        Ok(())
    }
}
