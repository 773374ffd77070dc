//! Uploaded attachments and the sweep of uploads never used by a post

use crate::clients::FileHost;
use crate::db::media;
use crate::domain::models::MediaType;
use crate::domain::requests::{CreateMediaRequest, ValidatedRequest};
use crate::error::Result;
use crate::metrics;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Unattached uploads younger than this survive the sweep in production
pub const ORPHAN_GRACE_HOURS: i64 = 24;

pub fn orphan_cutoff(now: DateTime<Utc>, production: bool) -> DateTime<Utc> {
    if production {
        now - Duration::hours(ORPHAN_GRACE_HOURS)
    } else {
        now
    }
}

#[derive(Clone)]
pub struct MediaService {
    pool: PgPool,
}

impl MediaService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an upload; it stays unattached until a post claims it.
    pub async fn create_media(&self, request: CreateMediaRequest, file_host: &dyn FileHost) -> Result<Uuid> {
        let request = request.into_valid()?;
        let media = media::insert_media(
            &self.pool,
            Uuid::new_v4(),
            MediaType::from_mime(&request.mime_type),
            &file_host.app_url(&request.url),
        )
        .await?;

        Ok(media.id)
    }

    /// Delete orphaned uploads from the file host, then their rows.
    pub async fn clear_orphans(&self, file_host: &dyn FileHost, production: bool) -> Result<u64> {
        let cutoff = orphan_cutoff(Utc::now(), production);
        let orphans = media::orphaned_before(&self.pool, cutoff).await?;
        if orphans.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = orphans
            .iter()
            .filter_map(|m| file_host.file_key(&m.url))
            .collect();
        file_host.delete_files(&keys).await?;

        let ids: Vec<Uuid> = orphans.iter().map(|m| m.id).collect();
        let deleted = media::delete_media(&self.pool, &ids).await?;

        metrics::record_orphans_deleted(deleted);
        info!(deleted, files = keys.len(), "Orphaned uploads cleared");
        Ok(deleted)
    }
}
