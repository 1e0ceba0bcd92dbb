//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::key::CacheKey;
use super::storage::{CacheStorage, MemoryStorage};
use super::traits::{CacheEntry, CacheResult, Cacheable, Page};

/// Read-through cache for one resource kind.
///
/// Sits between the views and the remote client: fresh entries are served
/// directly, anything else goes to the injected fetcher and the result
/// replaces the stored entry. Expiry is only checked on read.
///
/// Identical calls that overlap are not deduplicated; both reach the fetcher
/// and the later write wins.
pub struct CacheLayer<T: Cacheable> {
  storage: Arc<dyn CacheStorage<T>>,
  clock: Arc<dyn Clock>,
  /// How long a stored entry is served without refetching
  ttl: Duration,
}

impl<T: Cacheable> CacheLayer<T> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage<T>>) -> Self {
    Self {
      storage,
      clock: Arc::new(SystemClock),
      ttl: Duration::minutes(5),
    }
  }

  /// In-memory cache with the default TTL.
  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryStorage::<T>::new()))
  }

  /// Set the time-to-live for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  #[allow(dead_code)]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// An entry is fresh while strictly younger than the TTL.
  fn is_fresh(&self, stored_at: DateTime<Utc>) -> bool {
    self.clock.now() - stored_at < self.ttl
  }

  fn fresh_entry(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    let entry = self.storage.get(key)?;
    if self.is_fresh(entry.stored_at) {
      Some(entry)
    } else {
      debug!(key = %key, stored_at = %entry.stored_at, "cache entry expired");
      None
    }
  }

  fn store(&self, key: &CacheKey, items: Vec<T>, total: u64) {
    self.storage.put(
      key,
      CacheEntry {
        items,
        total,
        stored_at: self.clock.now(),
      },
    );
  }

  /// Fetch a page of a collection with a cache-first strategy.
  ///
  /// 1. Fresh entry - return it without calling the fetcher
  /// 2. Missing or expired - call the fetcher exactly once
  /// 3. Success replaces the entry; failure leaves storage untouched
  pub async fn fetch_page<F, Fut, E>(
    &self,
    key: &CacheKey,
    fetcher: F,
  ) -> Result<CacheResult<Page<T>>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
  {
    if let Some(cached) = self.fresh_entry(key) {
      debug!(key = %key, "cache hit");
      return Ok(CacheResult::from_cache(
        Page::new(cached.items, cached.total),
        cached.stored_at,
      ));
    }

    debug!(key = %key, "cache miss");
    let page = fetcher().await?;
    self.store(key, page.items.clone(), page.total);
    debug!(key = %key, items = page.items.len(), total = page.total, "cache stored");

    Ok(CacheResult::from_network(page))
  }

  /// Fetch a single item with caching. Stored as a one-element entry.
  pub async fn fetch_one<F, Fut, E>(&self, key: &CacheKey, fetcher: F) -> Result<CacheResult<T>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if let Some(cached) = self.fresh_entry(key) {
      if let Some(item) = cached.items.into_iter().next() {
        debug!(key = %key, "cache hit");
        return Ok(CacheResult::from_cache(item, cached.stored_at));
      }
    }

    debug!(key = %key, "cache miss");
    let item = fetcher().await?;
    self.store(key, vec![item.clone()], 1);
    debug!(key = %key, "cache stored");

    Ok(CacheResult::from_network(item))
  }

  /// Stored entry for a key regardless of freshness.
  #[allow(dead_code)]
  pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    self.storage.get(key)
  }

  /// Discard every entry. Applies to all later calls immediately.
  pub fn invalidate_all(&self) {
    let dropped = self.storage.len();
    self.storage.clear();
    debug!(resource = T::resource_kind(), dropped, "cache invalidated");
  }

  pub fn len(&self) -> usize {
    self.storage.len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.storage.is_empty()
  }
}

impl<T: Cacheable> Clone for CacheLayer<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      ttl: self.ttl,
    }
  }
}
