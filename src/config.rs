//! Catalog configuration
//!
//! Where category documents come from and how long they stay fresh.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ProductCache, DEFAULT_TTL};
use crate::data::{CategorySource, FileCategorySource, HttpCategorySource, SourceError};

/// Location of the category documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Base URL serving `{key}.json`
    Http(String),
    /// Directory holding `{key}.json`
    Directory(PathBuf),
}

impl SourceLocation {
    /// Treats `http://` and `https://` strings as URLs, anything else as a directory.
    pub fn parse(s: &str) -> SourceLocation {
        let trimmed = s.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceLocation::Http(trimmed.to_string())
        } else {
            SourceLocation::Directory(PathBuf::from(trimmed))
        }
    }
}

/// Configuration for the catalog cache
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Where to load category documents from
    pub source: SourceLocation,
    /// How long category entries stay fresh
    pub ttl: Duration,
    /// Per-request timeout for HTTP sources
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: SourceLocation::Directory(PathBuf::from("data")),
            ttl: DEFAULT_TTL,                         // 5 minutes
            request_timeout: Duration::from_secs(10), // 10 seconds
        }
    }
}

impl CatalogConfig {
    /// Builds the category source described by this configuration
    pub fn build_source(&self) -> Result<Arc<dyn CategorySource>, SourceError> {
        let source: Arc<dyn CategorySource> = match &self.source {
            SourceLocation::Http(base_url) => {
                Arc::new(HttpCategorySource::new(base_url.clone(), self.request_timeout)?)
            }
            SourceLocation::Directory(dir) => Arc::new(FileCategorySource::new(dir.clone())),
        };
        Ok(source)
    }

    /// Builds a cache over the configured source
    pub fn build_cache(&self) -> Result<ProductCache, SourceError> {
        Ok(ProductCache::with_ttl(self.build_source()?, self.ttl))
    }
}
