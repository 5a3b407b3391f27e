use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::extract::multipart::Field;
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle to an uploaded object: the public URL stored on records and the
/// id the gateway deletes by.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// External object-storage collaborator. Constructed at startup and passed
/// in via app state so tests can substitute a recording double.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the file at `local_path`. The spool file is removed whether
    /// or not the upload succeeds.
    async fn upload(&self, local_path: &Path) -> Result<StoredObject>;

    async fn delete(&self, public_id: &str) -> Result<()>;
}

/// Recover the public id from a stored URL: last path segment, extension
/// stripped.
pub fn extract_public_id(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.split('.').next().unwrap_or(last)
}

/// Spool a multipart image field to the upload directory under a fresh
/// UUID filename, returning the local path handed to `ObjectStorage`.
pub async fn spool_upload(dir: &Path, field: Field<'_>) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;

    let ext = field
        .file_name()
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()));
    let filename = match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };
    let path = dir.join(filename);

    let bytes = field.bytes().await.context("failed to read upload body")?;
    fs::write(&path, &bytes).await?;
    Ok(path)
}

/// Remove a spooled upload that will not be handed to storage.
pub async fn discard_spool(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!("Failed to remove spool file {}: {}", path.display(), e);
    }
}

/// Read a text field of a multipart form.
pub async fn field_text(field: Field<'_>) -> Result<String> {
    field.text().await.context("failed to read form field")
}

/// HTTP client for the object-storage gateway.
pub struct GatewayStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
    public_id: String,
}

impl GatewayStorage {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ObjectStorage for GatewayStorage {
    async fn upload(&self, local_path: &Path) -> Result<StoredObject> {
        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = fs::read(local_path).await?;

        let result = self
            .client
            .post(format!("{}/upload", self.base_url))
            .query(&[("filename", filename.as_str())])
            .bearer_auth(&self.api_key)
            .body(bytes)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        // The spool file goes away win or lose.
        if let Err(e) = fs::remove_file(local_path).await {
            warn!("Failed to remove spool file {}: {}", local_path.display(), e);
        }

        let resp: UploadResponse = result?.json().await?;
        info!("Uploaded object {}", resp.public_id);
        Ok(StoredObject {
            url: resp.url,
            public_id: resp.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.client
            .delete(format!("{}/objects/{}", self.base_url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;
        info!("Deleted object {}", public_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_is_last_segment_without_extension() {
        assert_eq!(
            extract_public_id("https://cdn.example.com/v1/abc123.png"),
            "abc123"
        );
        assert_eq!(extract_public_id("https://cdn.example.com/xyz"), "xyz");
        assert_eq!(extract_public_id("bare"), "bare");
    }
}
