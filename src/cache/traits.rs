//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Trait for items that can be held by a resource cache.
///
/// The resource kind namespaces every cache key, so two kinds can never
/// read each other's entries.
pub trait Cacheable: Clone + Send + Sync + 'static {
  /// Resource kind name (e.g., "users", "products")
  fn resource_kind() -> &'static str;
}

/// One page of a remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
  /// Items in the order the remote service returned them
  pub items: Vec<T>,
  /// Size of the full collection for the query, independent of page size
  pub total: u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total: u64) -> Self {
    Self { items, total }
  }

  pub fn empty() -> Self {
    Self {
      items: Vec::new(),
      total: 0,
    }
  }
}

/// A stored query result. Entries are replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub items: Vec<T>,
  pub total: u64,
  pub stored_at: DateTime<Utc>,
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a fresh cache entry.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a result that was answered without consulting cache or network.
  pub fn bypassed(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Bypassed,
      cached_at: None,
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::CacheFresh
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, younger than the TTL
  CacheFresh,
  /// Neither cache nor network was consulted (e.g., a blank search)
  Bypassed,
}
