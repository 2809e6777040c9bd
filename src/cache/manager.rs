//! Cache manager for catalog documents
//!
//! Provides a `ProductCache` that keeps fetched documents in memory with a
//! stored-at timestamp and collapses concurrent fetches of one key into a
//! single call to the underlying `CategorySource`.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::data::{AllCategories, Category, CategoryDocument, CategorySource, ProductMatch, SourceError};

/// Time-to-live for category and all-categories entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache key of the all-categories aggregate
pub const ALL_CATEGORIES_KEY: &str = "all-categories";

/// Cache key for a category document
pub fn category_key(name: &str) -> String {
    format!("products-{}", name)
}

/// Cache key for a product lookup
pub fn product_key(id: &str) -> String {
    format!("product-{}", id)
}

/// Errors surfaced by the catalog cache
///
/// `Clone` so that one failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The source has no document for the category
    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    /// Network, HTTP status or I/O failure while fetching
    #[error("Failed to fetch category '{category}': {message}")]
    Transport { category: String, message: String },

    /// The document is missing required fields or cannot be decoded
    #[error("Category '{category}' has an invalid shape: {reason}")]
    InvalidDataShape { category: String, reason: String },

    /// No category contains the product id
    #[error("Product '{0}' not found in any category")]
    ProductNotFound(String),
}

impl CatalogError {
    /// Classifies a source failure for the given category
    pub fn from_source(category: &str, error: SourceError) -> Self {
        match error {
            SourceError::NotFound(_) | SourceError::Status { status: 404, .. } => {
                CatalogError::CategoryNotFound(category.to_string())
            }
            SourceError::Json(e) => CatalogError::InvalidDataShape {
                category: category.to_string(),
                reason: e.to_string(),
            },
            other => CatalogError::Transport {
                category: category.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Whether the error means the requested thing does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::CategoryNotFound(_) | CatalogError::ProductNotFound(_)
        )
    }

    /// Whether retrying the same call could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Transport { .. })
    }
}

/// A value stored in the cache
#[derive(Debug, Clone)]
enum CachedValue {
    Category(Arc<CategoryDocument>),
    AllCategories(Arc<AllCategories>),
    Product(Arc<ProductMatch>),
}

impl CachedValue {
    /// Product lookups stay until invalidated; everything else obeys the TTL.
    fn expires(&self) -> bool {
        !matches!(self, CachedValue::Product(_))
    }

    fn into_category(self, key: &str) -> Result<Arc<CategoryDocument>, CatalogError> {
        match self {
            CachedValue::Category(document) => Ok(document),
            _ => Err(kind_mismatch(key)),
        }
    }

    fn into_all_categories(self, key: &str) -> Result<Arc<AllCategories>, CatalogError> {
        match self {
            CachedValue::AllCategories(all) => Ok(all),
            _ => Err(kind_mismatch(key)),
        }
    }

    fn into_product(self, key: &str) -> Result<Arc<ProductMatch>, CatalogError> {
        match self {
            CachedValue::Product(found) => Ok(found),
            _ => Err(kind_mismatch(key)),
        }
    }
}

fn kind_mismatch(key: &str) -> CatalogError {
    CatalogError::InvalidDataShape {
        category: key.to_string(),
        reason: "cache entry holds a different kind of value".to_string(),
    }
}

/// A stored value and when it was stored
#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.value.expires() || self.stored_at.elapsed() < ttl
    }
}

/// Outcome of an in-flight fetch, shared by every caller waiting on it
type PendingFetch = Shared<BoxFuture<'static, Result<CachedValue, CatalogError>>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// At most one pending fetch per key
    in_flight: HashMap<String, PendingFetch>,
}

struct Inner {
    source: Arc<dyn CategorySource>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

/// Shared cache state as seen by pending fetches
///
/// Pending fetches live in `CacheState::in_flight` and hold a `CacheCore`,
/// so only `ProductCache` handles keep the cache alive from outside.
#[derive(Clone)]
struct CacheCore {
    inner: Arc<Inner>,
}

/// Owner of the core; dropping the last one releases abandoned fetches
struct Handle {
    core: CacheCore,
}

impl Drop for Handle {
    fn drop(&mut self) {
        let abandoned = std::mem::take(&mut self.core.lock_state().in_flight);
        if !abandoned.is_empty() {
            debug!(pending = abandoned.len(), "dropping abandoned fetches");
        }
        drop(abandoned);
    }
}

/// Catalog cache with per-key TTL and request coalescing
///
/// Cloning is cheap and every clone shares the same entries, so one cache
/// is constructed at startup and handed to whatever needs catalog data.
#[derive(Clone)]
pub struct ProductCache {
    handle: Arc<Handle>,
}

impl fmt::Debug for ProductCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core().lock_state();
        f.debug_struct("ProductCache")
            .field("ttl", &self.core().inner.ttl)
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl ProductCache {
    /// Creates a cache over the given source with the default 5 minute TTL
    pub fn new(source: Arc<dyn CategorySource>) -> Self {
        Self::with_ttl(source, DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL
    pub fn with_ttl(source: Arc<dyn CategorySource>, ttl: Duration) -> Self {
        let core = CacheCore {
            inner: Arc::new(Inner {
                source,
                ttl,
                state: Mutex::new(CacheState::default()),
            }),
        };
        Self {
            handle: Arc::new(Handle { core }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.core().inner.ttl
    }

    fn core(&self) -> &CacheCore {
        &self.handle.core
    }

    /// Fetches a category document by name
    ///
    /// # Behavior
    /// - Returns the cached document if it is younger than the TTL
    /// - Joins an in-flight fetch for the same category if there is one
    /// - Otherwise fetches from the source, validates and stores the result
    /// - Failures are never cached; every waiter receives the same error
    pub async fn fetch_category(&self, name: &str) -> Result<Arc<CategoryDocument>, CatalogError> {
        self.core().fetch_category(name).await
    }

    /// Fetches all three categories concurrently
    ///
    /// The aggregate is cached under its own key with the same TTL. Fails as
    /// a whole if any category fails.
    pub async fn fetch_all_categories(&self) -> Result<Arc<AllCategories>, CatalogError> {
        let value = self
            .core()
            .load(ALL_CATEGORIES_KEY.to_string(), |core| {
                async move {
                    let (vegetables, fruits, crops) = futures::try_join!(
                        core.fetch_category(Category::Vegetables.key()),
                        core.fetch_category(Category::Fruits.key()),
                        core.fetch_category(Category::Crops.key()),
                    )?;
                    Ok(CachedValue::AllCategories(Arc::new(AllCategories {
                        vegetables,
                        fruits,
                        crops,
                    })))
                }
                .boxed()
            })
            .await?;
        value.into_all_categories(ALL_CATEGORIES_KEY)
    }

    /// Finds a product by id
    ///
    /// Categories are searched in the fixed order vegetables, fruits, crops,
    /// featured list before product list, stopping at the first match. A
    /// found product is cached until invalidated.
    pub async fn fetch_product_by_id(&self, id: &str) -> Result<Arc<ProductMatch>, CatalogError> {
        let key = product_key(id);
        let product_id = id.to_string();
        let value = self
            .core()
            .load(key.clone(), move |core| {
                async move {
                    for category in Category::all() {
                        let document = core.fetch_category(category.key()).await?;
                        if let Some(product) = document.find_product(&product_id) {
                            debug!(product_id = %product_id, category = category.key(), "product found");
                            return Ok(CachedValue::Product(Arc::new(ProductMatch {
                                product: product.clone(),
                                category_name: document.category_name.clone(),
                            })));
                        }
                    }
                    Err(CatalogError::ProductNotFound(product_id))
                }
                .boxed()
            })
            .await?;
        value.into_product(&key)
    }

    /// Removes cache entries
    ///
    /// With `None`, every entry is dropped. With a substring, only entries
    /// whose key contains it are dropped. Returns the number removed.
    /// In-flight fetches are not cancelled.
    pub fn invalidate(&self, key_substring: Option<&str>) -> usize {
        let mut state = self.core().lock_state();
        let before = state.entries.len();
        match key_substring {
            None => state.entries.clear(),
            Some(fragment) => state.entries.retain(|key, _| !key.contains(fragment)),
        }
        let removed = before - state.entries.len();
        debug!(fragment = ?key_substring, removed, "cache invalidated");
        removed
    }

    /// Warms all three categories, logging and skipping any that fail
    ///
    /// Returns the number of categories that were warmed.
    pub async fn preload(&self) -> usize {
        let results = futures::future::join_all(Category::all().iter().map(|category| async move {
            (*category, self.fetch_category(category.key()).await)
        }))
        .await;

        let mut warmed = 0;
        for (category, result) in results {
            match result {
                Ok(_) => warmed += 1,
                Err(error) => {
                    warn!(category = category.key(), %error, "preload failed, continuing");
                }
            }
        }
        warmed
    }

    /// Keys currently stored, fresh or not, sorted
    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.core().lock_state().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether a fresh entry exists for the key
    pub fn is_fresh(&self, key: &str) -> bool {
        let ttl = self.ttl();
        self.core()
            .lock_state()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(ttl))
    }
}

impl CacheCore {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_category(&self, name: &str) -> Result<Arc<CategoryDocument>, CatalogError> {
        let key = category_key(name);
        let name = name.to_string();
        let value = self
            .load(key.clone(), move |core| {
                async move {
                    core.fetch_from_source(&name)
                        .await
                        .map(CachedValue::Category)
                }
                .boxed()
            })
            .await?;
        value.into_category(&key)
    }

    /// Returns a fresh cached value, joins a pending fetch, or starts one
    async fn load<F>(&self, key: String, fetch: F) -> Result<CachedValue, CatalogError>
    where
        F: FnOnce(CacheCore) -> BoxFuture<'static, Result<CachedValue, CatalogError>> + Send,
    {
        let pending = {
            let mut state = self.lock_state();

            if let Some(entry) = state.entries.get(&key) {
                if entry.is_fresh(self.inner.ttl) {
                    debug!(%key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }

            match state.in_flight.get(&key).cloned() {
                Some(pending) => {
                    debug!(%key, "joining in-flight fetch");
                    pending
                }
                None => {
                    let work = fetch(self.clone());
                    let core = self.clone();
                    let settle_key = key.clone();
                    let pending = async move {
                        let result = work.await;
                        core.settle(&settle_key, &result);
                        result
                    }
                    .boxed()
                    .shared();
                    state.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Records the outcome of a fetch and clears its in-flight marker
    fn settle(&self, key: &str, result: &Result<CachedValue, CatalogError>) {
        let mut state = self.lock_state();
        state.in_flight.remove(key);
        match result {
            Ok(value) => {
                state.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    },
                );
                debug!(%key, "cache entry stored");
            }
            Err(error) => {
                debug!(%key, %error, "fetch failed, nothing cached");
            }
        }
    }

    /// Fetches and validates one category document from the source
    async fn fetch_from_source(&self, name: &str) -> Result<Arc<CategoryDocument>, CatalogError> {
        info!(category = name, "fetching category");
        let raw = self
            .inner
            .source
            .fetch_document(name)
            .await
            .map_err(|e| CatalogError::from_source(name, e))?;

        let document = validate_document(name, raw)?;
        info!(category = name, products = document.products.len(), "category fetched");
        Ok(Arc::new(document))
    }
}

/// Checks the required fields and decodes the document
///
/// `categoryName` must be a non-empty string and `products` must be a list.
/// Anything else in the document decodes leniently.
fn validate_document(category: &str, raw: Value) -> Result<CategoryDocument, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidDataShape {
        category: category.to_string(),
        reason,
    };

    let has_name = raw
        .get("categoryName")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_name {
        return Err(invalid("categoryName is missing or empty".to_string()));
    }

    if !raw.get("products").is_some_and(Value::is_array) {
        return Err(invalid("products is missing or not a list".to_string()));
    }

    serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))
}
