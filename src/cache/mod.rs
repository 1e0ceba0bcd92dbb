//! Generic read-through cache for paginated, searchable remote collections.
//!
//! This module knows nothing about HTTP. It provides:
//! - Keys derived from (resource kind, query shape, parameters)
//! - One cache per resource kind, with entries replaced wholesale
//! - Lazy TTL expiry checked on read
//! - Fetchers injected per call, so any async source can back a cache

pub mod clock;
mod key;
mod layer;
mod storage;
mod traits;

pub use key::{CacheKey, QueryKind};
pub use layer::CacheLayer;
pub use storage::NoopStorage;
pub use traits::{CacheResult, CacheSource, Cacheable, Page};
