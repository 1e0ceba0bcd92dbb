//! Cache key derivation.

use sha2::{Digest, Sha256};
use std::fmt;

/// The shape of a query against a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
  /// Plain paginated listing
  List { limit: u32, offset: u32 },
  /// Free-text search; the term is used verbatim
  Search { term: String },
  /// Listing restricted to one category
  Filter {
    category: String,
    limit: u32,
    offset: u32,
  },
  /// Single item lookup
  ById { id: u64 },
}

impl QueryKind {
  /// Unambiguous encoding of the query. Strings are length-prefixed so
  /// separators inside a search term or category can't alias another query.
  fn canonical(&self) -> String {
    match self {
      Self::List { limit, offset } => format!("list|{}|{}", limit, offset),
      Self::Search { term } => format!("search|{}:{}", term.len(), term),
      Self::Filter {
        category,
        limit,
        offset,
      } => format!(
        "filter|{}:{}|{}|{}",
        category.len(),
        category,
        limit,
        offset
      ),
      Self::ById { id } => format!("by_id|{}", id),
    }
  }

  fn describe(&self) -> String {
    match self {
      Self::List { limit, offset } => format!("list limit={} offset={}", limit, offset),
      Self::Search { term } => format!("search {:?}", term),
      Self::Filter {
        category,
        limit,
        offset,
      } => format!(
        "category {:?} limit={} offset={}",
        category, limit, offset
      ),
      Self::ById { id } => format!("id {}", id),
    }
  }
}

/// Stable, fixed-length key for one (resource kind, query) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  hash: String,
  description: String,
}

impl CacheKey {
  pub fn new(resource_kind: &str, query: &QueryKind) -> Self {
    let input = format!(
      "{}:{}|{}",
      resource_kind.len(),
      resource_kind,
      query.canonical()
    );

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Self {
      hash,
      description: format!("{} {}", resource_kind, query.describe()),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.hash
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.description)
  }
}
