//! Category document sources
//!
//! A source answers one question: "give me the JSON document for this
//! category key". The cache validates the shape; sources only move bytes.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading a category document
#[derive(Debug, Error)]
pub enum SourceError {
    /// No document exists for the key
    #[error("No document for category '{0}'")]
    NotFound(String),

    /// Server answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local document failed
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON
    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Loads the raw JSON document for a category key
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn fetch_document(&self, key: &str) -> Result<serde_json::Value, SourceError>;
}

/// Fetches category documents over HTTP from `{base_url}/{key}.json`
#[derive(Debug, Clone)]
pub struct HttpCategorySource {
    http_client: Client,
    base_url: String,
}

impl HttpCategorySource {
    /// Creates a source with the given base URL and request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self::with_client(http_client, base_url))
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the document URL for a key
    fn document_url(&self, key: &str) -> String {
        format!("{}/{}.json", self.base_url, key)
    }
}

#[async_trait]
impl CategorySource for HttpCategorySource {
    async fn fetch_document(&self, key: &str) -> Result<serde_json::Value, SourceError> {
        let url = self.document_url(key);
        info!(%url, "fetching category document");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Reads category documents from `{dir}/{key}.json`
#[derive(Debug, Clone)]
pub struct FileCategorySource {
    dir: PathBuf,
}

impl FileCategorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl CategorySource for FileCategorySource {
    async fn fetch_document(&self, key: &str) -> Result<serde_json::Value, SourceError> {
        let path = self.document_path(key);
        info!(path = %path.display(), "reading category document");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&content)?)
    }
}
