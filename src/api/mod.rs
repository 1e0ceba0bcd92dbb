pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod error;
pub mod types;

pub use cached_client::ResourceCache;
pub use client::ApiClient;
pub use error::FetchError;
pub use types::{AuthUser, Product, User};
