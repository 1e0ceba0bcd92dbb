//! Cache storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::key::CacheKey;
use super::traits::{CacheEntry, Cacheable};

/// Trait for cache storage backends.
///
/// Implementations hold one resource kind. Every call is synchronous and
/// short, so a backend never holds a lock across an await point.
pub trait CacheStorage<T: Cacheable>: Send + Sync {
  /// Get the entry stored under a key, fresh or not.
  fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>>;

  /// Store an entry, replacing any previous one for the key.
  fn put(&self, key: &CacheKey, entry: CacheEntry<T>);

  /// Drop every entry.
  fn clear(&self);

  /// Number of stored entries.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl<T: Cacheable> CacheStorage<T> for NoopStorage {
  fn get(&self, _key: &CacheKey) -> Option<CacheEntry<T>> {
    None // Always miss
  }

  fn put(&self, _key: &CacheKey, _entry: CacheEntry<T>) {}

  fn clear(&self) {}

  fn len(&self) -> usize {
    0
  }
}

/// Process-memory storage. Unbounded; lives as long as its session.
pub struct MemoryStorage<T> {
  entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> MemoryStorage<T> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// A panic while holding the lock can't leave a half-written entry
  /// (puts are single inserts), so a poisoned map is still usable.
  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> Default for MemoryStorage<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> CacheStorage<T> for MemoryStorage<T> {
  fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    self.entries().get(key.as_str()).cloned()
  }

  fn put(&self, key: &CacheKey, entry: CacheEntry<T>) {
    self.entries().insert(key.as_str().to_string(), entry);
  }

  fn clear(&self) {
    self.entries().clear();
  }

  fn len(&self) -> usize {
    self.entries().len()
  }
}
