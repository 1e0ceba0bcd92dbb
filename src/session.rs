//! The signed-in session and the caches that live and die with it.

use std::sync::Arc;
use tracing::info;

use crate::api::types::Resource;
use crate::api::{ApiClient, AuthUser, FetchError, Product, ResourceCache, User};
use crate::cache::{CacheLayer, NoopStorage};
use crate::config::CacheConfig;

/// Created at login, dropped at logout. Clones share the same caches, so
/// views get a handle instead of reaching for global state.
#[derive(Clone)]
pub struct Session {
  user: Arc<AuthUser>,
  users: ResourceCache<User>,
  products: ResourceCache<Product>,
}

impl Session {
  /// Authenticate and open a session with empty caches.
  pub async fn sign_in(
    api: &ApiClient,
    cache: &CacheConfig,
    username: &str,
    password: &str,
  ) -> Result<Self, FetchError> {
    let user = api.login(username, password).await?;
    info!(username = %user.username, "signed in");
    Ok(Self::open(api, cache, user))
  }

  /// Session for an already authenticated user.
  pub fn open(api: &ApiClient, cache: &CacheConfig, user: AuthUser) -> Self {
    let api = if user.access_token.is_empty() {
      api.clone()
    } else {
      api.with_token(user.access_token.as_str())
    };

    Self {
      user: Arc::new(user),
      users: ResourceCache::new(api.clone(), build_cache(cache)),
      products: ResourceCache::new(api, build_cache(cache)),
    }
  }

  pub fn user(&self) -> &AuthUser {
    &self.user
  }

  pub fn users(&self) -> &ResourceCache<User> {
    &self.users
  }

  pub fn products(&self) -> &ResourceCache<Product> {
    &self.products
  }

  /// Clear both resource caches.
  pub fn invalidate_all(&self) {
    self.users.invalidate_all();
    self.products.invalidate_all();
  }

  /// End the session. Caches are emptied even if another handle survives.
  pub fn close(self) {
    info!(username = %self.user.username, "signed out");
    self.invalidate_all();
  }
}

fn build_cache<T: Resource>(config: &CacheConfig) -> CacheLayer<T> {
  let layer = if config.enabled {
    CacheLayer::in_memory()
  } else {
    CacheLayer::new(Arc::new(NoopStorage))
  };
  layer.with_ttl(config.ttl())
}
