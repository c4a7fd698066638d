//! Reference content loading: translation list, metadata, and book text.
//!
//! A [`ContentSource`] knows how to fetch one resource. [`ContentLoader`]
//! sits in front of it and memoizes metadata and books by key for the
//! lifetime of the process. The cache is unbounded and never invalidated;
//! the whole corpus is small and static. A failed fetch leaves nothing in
//! the cache, so the next call retries.
//!
//! | Resource | Path | Cache key |
//! |----------|------|-----------|
//! | translation list | `translations.json` | `translations` |
//! | metadata | `{translation}/metadata.json` | `{translation}` |
//! | book | `{translation}/{book}.json` | `{translation}/{book}` |

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use lectio_core::error::LoadError;
use lectio_core::models::{BookData, Translation, TranslationMeta};

use crate::config::Config;

/// A place reference content can be fetched from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short label for logs, e.g. `fs:/srv/bibles`.
    fn describe(&self) -> String;

    async fn translations(&self) -> Result<Vec<Translation>, LoadError>;

    async fn metadata(&self, translation_id: &str) -> Result<TranslationMeta, LoadError>;

    async fn book(&self, translation_id: &str, book_id: &str) -> Result<BookData, LoadError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Filesystem source
// ═══════════════════════════════════════════════════════════════════════

/// Reads the JSON resources from a local directory.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T, String> {
        let path = self.root.join(relative);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        serde_json::from_slice(&bytes).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

#[async_trait]
impl ContentSource for FsSource {
    fn describe(&self) -> String {
        format!("fs:{}", self.root.display())
    }

    async fn translations(&self) -> Result<Vec<Translation>, LoadError> {
        self.read_json("translations.json")
            .await
            .map_err(LoadError::list)
    }

    async fn metadata(&self, translation_id: &str) -> Result<TranslationMeta, LoadError> {
        self.read_json(&format!("{}/metadata.json", translation_id))
            .await
            .map_err(|e| LoadError::metadata(translation_id, e))
    }

    async fn book(&self, translation_id: &str, book_id: &str) -> Result<BookData, LoadError> {
        self.read_json(&format!("{}/{}.json", translation_id, book_id))
            .await
            .map_err(|e| LoadError::book(translation_id, book_id, e))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HTTP source
// ═══════════════════════════════════════════════════════════════════════

/// Fetches the JSON resources from `{base_url}/bibles/...`.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T, String> {
        let url = format!("{}/bibles/{}", self.base_url, relative);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("{}: {}", url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("{}: HTTP {}", url, status));
        }

        resp.json::<T>()
            .await
            .map_err(|e| format!("{}: {}", url, e))
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    fn describe(&self) -> String {
        format!("http:{}", self.base_url)
    }

    async fn translations(&self) -> Result<Vec<Translation>, LoadError> {
        self.get_json("translations.json")
            .await
            .map_err(LoadError::list)
    }

    async fn metadata(&self, translation_id: &str) -> Result<TranslationMeta, LoadError> {
        self.get_json(&format!("{}/metadata.json", translation_id))
            .await
            .map_err(|e| LoadError::metadata(translation_id, e))
    }

    async fn book(&self, translation_id: &str, book_id: &str) -> Result<BookData, LoadError> {
        self.get_json(&format!("{}/{}.json", translation_id, book_id))
            .await
            .map_err(|e| LoadError::book(translation_id, book_id, e))
    }
}

/// Build the source named by `[content].source`.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn ContentSource>> {
    let content = &config.content;
    match content.source.as_str() {
        "fs" => {
            let root = content
                .root
                .clone()
                .ok_or_else(|| anyhow::anyhow!("content.root is not configured"))?;
            Ok(Arc::new(FsSource::new(root)))
        }
        "http" => {
            let base_url = content
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("content.base_url is not configured"))?;
            Ok(Arc::new(HttpSource::new(
                base_url,
                Duration::from_secs(content.timeout_secs),
            )?))
        }
        other => anyhow::bail!("Unknown content source: '{}'", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Memoizing loader
// ═══════════════════════════════════════════════════════════════════════

/// Memoizing front for a [`ContentSource`].
///
/// Concurrent first requests for the same key may both reach the source;
/// the later result overwrites an identical cached value.
pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    translations: RwLock<Option<Arc<Vec<Translation>>>>,
    metas: RwLock<HashMap<String, Arc<TranslationMeta>>>,
    books: RwLock<HashMap<String, Arc<BookData>>>,
}

fn book_key(translation_id: &str, book_id: &str) -> String {
    format!("{}/{}", translation_id, book_id)
}

impl ContentLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            translations: RwLock::new(None),
            metas: RwLock::new(HashMap::new()),
            books: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    pub async fn list_translations(&self) -> Result<Arc<Vec<Translation>>, LoadError> {
        let cached = self
            .translations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cached) = cached {
            tracing::debug!("translation list cache hit");
            return Ok(cached);
        }
        tracing::info!(source = %self.source.describe(), "fetching translation list");
        let list = Arc::new(self.source.translations().await?);
        *self
            .translations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(list.clone());
        Ok(list)
    }

    pub async fn load_meta(&self, translation_id: &str) -> Result<Arc<TranslationMeta>, LoadError> {
        let cached = self
            .metas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(translation_id)
            .cloned();
        if let Some(cached) = cached {
            tracing::debug!(translation_id, "metadata cache hit");
            return Ok(cached);
        }
        tracing::info!(translation_id, "fetching metadata");
        let meta = Arc::new(self.source.metadata(translation_id).await?);
        self.metas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(translation_id.to_string(), meta.clone());
        Ok(meta)
    }

    pub async fn load_book(
        &self,
        translation_id: &str,
        book_id: &str,
    ) -> Result<Arc<BookData>, LoadError> {
        let key = book_key(translation_id, book_id);
        let cached = self
            .books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(cached) = cached {
            tracing::debug!(%key, "book cache hit");
            return Ok(cached);
        }
        tracing::info!(%key, "fetching book");
        let book = Arc::new(self.source.book(translation_id, book_id).await?);
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, book.clone());
        Ok(book)
    }

    pub fn cached_metas(&self) -> usize {
        self.metas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn cached_books(&self) -> usize {
        self.books.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
