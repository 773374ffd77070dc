//! Trending hashtags with a short in-process cache

use crate::db::posts;
use crate::domain::models::TrendingTopic;
use crate::error::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

pub const TRENDING_LIMIT: i64 = 5;
pub const TRENDS_TTL: Duration = Duration::from_secs(60);

struct Snapshot {
    fetched_at: Instant,
    topics: Vec<TrendingTopic>,
}

#[derive(Clone)]
pub struct TrendsCache {
    ttl: Duration,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
}

impl Default for TrendsCache {
    fn default() -> Self {
        Self::new(TRENDS_TTL)
    }
}

impl TrendsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    async fn cached(&self) -> Option<Vec<TrendingTopic>> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| s.fetched_at.elapsed() < self.ttl)
            .map(|s| s.topics.clone())
    }

    pub async fn trending(&self, pool: &PgPool) -> Result<Vec<TrendingTopic>> {
        if let Some(topics) = self.cached().await {
            return Ok(topics);
        }

        let mut snapshot = self.snapshot.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(s) = snapshot.as_ref().filter(|s| s.fetched_at.elapsed() < self.ttl) {
            return Ok(s.topics.clone());
        }

        let topics = posts::trending_topics(pool, TRENDING_LIMIT).await?;
        debug!(count = topics.len(), "Trending topics refreshed");
        *snapshot = Some(Snapshot {
            fetched_at: Instant::now(),
            topics: topics.clone(),
        });

        Ok(topics)
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(tag: &str, count: i64) -> TrendingTopic {
        TrendingTopic {
            hashtag: tag.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_fresh_snapshot_is_served() {
        let cache = TrendsCache::new(Duration::from_secs(60));
        *cache.snapshot.write().await = Some(Snapshot {
            fetched_at: Instant::now(),
            topics: vec![topic("#rust", 3)],
        });

        assert_eq!(cache.cached().await, Some(vec![topic("#rust", 3)]));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_ignored() {
        let cache = TrendsCache::new(Duration::ZERO);
        *cache.snapshot.write().await = Some(Snapshot {
            fetched_at: Instant::now(),
            topics: vec![topic("#rust", 3)],
        });

        assert_eq!(cache.cached().await, None);

        cache.invalidate().await;
        assert!(cache.snapshot.read().await.is_none());
    }
}
