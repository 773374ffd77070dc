/// External file host (UploadThing) used for avatars and post attachments
use crate::config::FileHostConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

#[async_trait]
pub trait FileHost: Send + Sync {
    /// Application id that scopes public file URLs
    fn app_id(&self) -> &str;

    async fn delete_files(&self, keys: &[String]) -> Result<()>;

    /// Rewrite an upload URL (`.../f/{key}`) to the app-scoped form
    /// (`.../a/{appId}/{key}`) that is stored in the database.
    fn app_url(&self, url: &str) -> String {
        url.replacen("/f/", &format!("/a/{}/", self.app_id()), 1)
    }

    /// File key of an app-scoped URL, `None` for foreign URLs.
    fn file_key(&self, url: &str) -> Option<String> {
        let marker = format!("/a/{}/", self.app_id());
        url.split_once(&marker)
            .map(|(_, key)| key.to_string())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFilesRequest<'a> {
    file_keys: &'a [String],
}

#[derive(Clone)]
pub struct UploadThingClient {
    client: Client,
    api_url: String,
    app_id: String,
    secret: String,
}

impl UploadThingClient {
    pub fn new(config: &FileHostConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            secret: config.secret.clone(),
        }
    }
}

#[async_trait]
impl FileHost for UploadThingClient {
    fn app_id(&self) -> &str {
        &self.app_id
    }

    async fn delete_files(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/v6/deleteFiles", self.api_url))
            .header("X-Uploadthing-Api-Key", &self.secret)
            .json(&DeleteFilesRequest { file_keys: keys })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, body = %body, "File host delete failed");
            return Err(AppError::Upstream(format!(
                "file host delete failed ({})",
                status
            )));
        }

        info!(count = keys.len(), "Deleted files from file host");
        Ok(())
    }
}
