//! Image hosting for snapshots.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::ImageHostConfig;

use super::error::SnapshotError;

/// Uploads an image and returns its public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    fn name(&self) -> &str;

    /// Authenticated hosts accept images above the size cap.
    fn authenticated(&self) -> bool;

    async fn upload(&self, path: &Path) -> Result<String, SnapshotError>;
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    filename: String,
}

/// Client for kek.sh style hosts (`POST /api/v1/posts`).
pub struct KekClient {
    client: Client,
    url: String,
    public_url: String,
    auth_key: Option<String>,
}

impl KekClient {
    pub fn new(config: &ImageHostConfig) -> Result<Self, SnapshotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            auth_key: config.auth_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl ImageHost for KekClient {
    fn name(&self) -> &str {
        "kek"
    }

    fn authenticated(&self) -> bool {
        self.auth_key.is_some()
    }

    async fn upload(&self, path: &Path) -> Result<String, SnapshotError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "snapshot".to_string());

        let part = Part::bytes(bytes).file_name(file_name);
        let form = Form::new().part("file", part);

        let mut request = self
            .client
            .post(format!("{}/api/v1/posts", self.url))
            .multipart(form);
        if let Some(key) = &self.auth_key {
            request = request.header("x-kek-auth", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SnapshotError::UploadFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let post: PostResponse = response
            .json()
            .await
            .map_err(|e| SnapshotError::UploadFailed(format!("Invalid response: {}", e)))?;
        let url = format!("{}/{}", self.public_url, post.filename);
        debug!(path = %path.display(), url = %url, "Image uploaded");
        Ok(url)
    }
}
