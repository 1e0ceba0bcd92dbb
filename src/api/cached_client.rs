//! Per-resource read-through caches over the remote collection service.

use tracing::{debug, info};

use crate::cache::{CacheKey, CacheLayer, CacheResult, Page, QueryKind};
use crate::pagination::PageParams;

use super::client::ApiClient;
use super::error::FetchError;
use super::types::{Product, Resource};

/// One resource kind's cache bound to the client that fills it.
///
/// Cloning is cheap and clones share the same entries.
#[derive(Clone)]
pub struct ResourceCache<T: Resource> {
  api: ApiClient,
  cache: CacheLayer<T>,
}

impl<T: Resource> ResourceCache<T> {
  pub fn new(api: ApiClient, cache: CacheLayer<T>) -> Self {
    Self { api, cache }
  }

  fn key(query: &QueryKind) -> CacheKey {
    CacheKey::new(T::resource_kind(), query)
  }

  /// One page of the plain listing.
  pub async fn fetch_list(&self, params: PageParams) -> Result<CacheResult<Page<T>>, FetchError> {
    let key = Self::key(&QueryKind::List {
      limit: params.limit,
      offset: params.offset,
    });

    self
      .cache
      .fetch_page(&key, || {
        let api = self.api.clone();
        async move { api.list::<T>(params.limit, params.offset).await }
      })
      .await
  }

  /// Free-text search. A blank query yields an empty result without
  /// touching the cache or the network; any other query is used verbatim.
  pub async fn search(&self, query: &str) -> Result<CacheResult<Page<T>>, FetchError> {
    if query.trim().is_empty() {
      debug!(resource = T::PATH, "blank search, skipping");
      return Ok(CacheResult::bypassed(Page::empty()));
    }

    let key = Self::key(&QueryKind::Search {
      term: query.to_string(),
    });

    self
      .cache
      .fetch_page(&key, || {
        let api = self.api.clone();
        let term = query.to_string();
        async move { api.search::<T>(&term).await }
      })
      .await
  }

  /// Single item by id. Absence comes back as [`FetchError::NotFound`]
  /// and is not cached.
  pub async fn get_by_id(&self, id: u64) -> Result<CacheResult<T>, FetchError> {
    let key = Self::key(&QueryKind::ById { id });

    self
      .cache
      .fetch_one(&key, || {
        let api = self.api.clone();
        async move { api.get::<T>(id).await }
      })
      .await
  }

  /// Drop every cached entry of this resource kind.
  pub fn invalidate_all(&self) {
    info!(resource = T::PATH, entries = self.cache.len(), "invalidating cache");
    self.cache.invalidate_all();
  }

  #[cfg(test)]
  pub fn cache(&self) -> &CacheLayer<T> {
    &self.cache
  }
}

impl ResourceCache<Product> {
  /// One page of the products in a category.
  pub async fn filter_by_category(
    &self,
    category: &str,
    params: PageParams,
  ) -> Result<CacheResult<Page<Product>>, FetchError> {
    let key = Self::key(&QueryKind::Filter {
      category: category.to_string(),
      limit: params.limit,
      offset: params.offset,
    });

    self
      .cache
      .fetch_page(&key, || {
        let api = self.api.clone();
        let category = category.to_string();
        async move {
          api
            .by_category(&category, params.limit, params.offset)
            .await
        }
      })
      .await
  }

  /// Category slugs (not cached - small and fetched once per view).
  pub async fn categories(&self) -> Result<Vec<String>, FetchError> {
    self.api.categories().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::User;
  use crate::cache::clock::ManualClock;
  use crate::cache::CacheSource;
  use chrono::Duration;
  use mockito::{Matcher, Mock, Server, ServerGuard};
  use std::sync::Arc;

  fn users_page(count: u64, total: u64) -> String {
    let users: Vec<_> = (1..=count)
      .map(|id| serde_json::json!({ "id": id, "firstName": format!("User{}", id) }))
      .collect();
    serde_json::json!({ "users": users, "total": total, "skip": 0, "limit": count }).to_string()
  }

  fn users_cache(server: &ServerGuard) -> (ResourceCache<User>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let api = ApiClient::new(&server.url()).unwrap();
    let cache = CacheLayer::in_memory().with_clock(clock.clone());
    (ResourceCache::new(api, cache), clock)
  }

  async fn mock_first_page(server: &mut ServerGuard, hits: usize) -> Mock {
    server
      .mock("GET", "/users")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("limit".into(), "10".into()),
        Matcher::UrlEncoded("skip".into(), "0".into()),
      ]))
      .with_status(200)
      .with_body(users_page(10, 208))
      .expect(hits)
      .create_async()
      .await
  }

  #[tokio::test]
  async fn test_fetch_list_twice_within_ttl_hits_network_once() {
    let mut server = Server::new_async().await;
    let mock = mock_first_page(&mut server, 1).await;
    let (users, clock) = users_cache(&server);

    let first = users.fetch_list(PageParams::default()).await.unwrap();
    clock.advance(Duration::minutes(4) + Duration::seconds(59));
    let second = users.fetch_list(PageParams::default()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.data.items.len(), 10);
    assert_eq!(first.data.total, 208);
    assert_eq!(first.data, second.data);
    assert_eq!(second.source, CacheSource::CacheFresh);
  }

  #[tokio::test]
  async fn test_fetch_list_after_ttl_refetches_once() {
    let mut server = Server::new_async().await;
    let mock = mock_first_page(&mut server, 2).await;
    let (users, clock) = users_cache(&server);
    let key = CacheKey::new("users", &QueryKind::List { limit: 10, offset: 0 });

    users.fetch_list(PageParams::default()).await.unwrap();
    let stored_at = users.cache().peek(&key).unwrap().stored_at;

    clock.advance(Duration::minutes(5));
    let refreshed = users.fetch_list(PageParams::default()).await.unwrap();
    // Fresh again, so no third request
    users.fetch_list(PageParams::default()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(refreshed.source, CacheSource::Network);
    assert!(users.cache().peek(&key).unwrap().stored_at > stored_at);
  }

  #[tokio::test]
  async fn test_blank_search_never_calls_remote() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", Matcher::Any)
      .expect(0)
      .create_async()
      .await;
    let (users, _clock) = users_cache(&server);

    for query in ["", "   ", "\t\n"] {
      let result = users.search(query).await.unwrap();
      assert!(result.data.items.is_empty());
      assert_eq!(result.data.total, 0);
      assert_eq!(result.source, CacheSource::Bypassed);
    }

    mock.assert_async().await;
    assert!(users.cache().is_empty());
  }

  #[tokio::test]
  async fn test_search_terms_are_cached_verbatim() {
    let mut server = Server::new_async().await;
    let lower = server
      .mock("GET", "/users/search")
      .match_query(Matcher::UrlEncoded("q".into(), "emily".into()))
      .with_status(200)
      .with_body(users_page(1, 1))
      .expect(1)
      .create_async()
      .await;
    let upper = server
      .mock("GET", "/users/search")
      .match_query(Matcher::UrlEncoded("q".into(), "Emily".into()))
      .with_status(200)
      .with_body(users_page(1, 1))
      .expect(1)
      .create_async()
      .await;
    let (users, _clock) = users_cache(&server);

    users.search("emily").await.unwrap();
    users.search("emily").await.unwrap();
    users.search("Emily").await.unwrap();

    lower.assert_async().await;
    upper.assert_async().await;
    assert_eq!(users.cache().len(), 2);
  }

  #[tokio::test]
  async fn test_get_by_id_not_found_writes_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/users/424242")
      .with_status(404)
      .with_body(r#"{"message":"User with id '424242' not found"}"#)
      .expect(2)
      .create_async()
      .await;
    let (users, _clock) = users_cache(&server);

    let err = users.get_by_id(424242).await.unwrap_err();
    assert_eq!(
      err,
      FetchError::NotFound {
        resource: "user",
        id: 424242
      }
    );
    assert!(users.cache().is_empty());

    // Absence is not remembered, so a retry goes back to the service
    assert!(matches!(
      users.get_by_id(424242).await,
      Err(FetchError::NotFound { .. })
    ));
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_get_by_id_is_cached_as_single_entry() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/users/1")
      .with_status(200)
      .with_body(r#"{"id":1,"firstName":"Emily","lastName":"Johnson"}"#)
      .expect(1)
      .create_async()
      .await;
    let (users, _clock) = users_cache(&server);

    let first = users.get_by_id(1).await.unwrap();
    let second = users.get_by_id(1).await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.data.full_name(), "Emily Johnson");
    assert_eq!(second.data, first.data);
    assert!(second.is_cached());

    let entry = users
      .cache()
      .peek(&CacheKey::new("users", &QueryKind::ById { id: 1 }))
      .unwrap();
    assert_eq!(entry.total, 1);
    assert_eq!(entry.items.len(), 1);
  }

  #[tokio::test]
  async fn test_invalidate_all_forces_exactly_one_fresh_call() {
    let mut server = Server::new_async().await;
    let mock = mock_first_page(&mut server, 2).await;
    let (users, _clock) = users_cache(&server);

    users.fetch_list(PageParams::default()).await.unwrap();
    users.invalidate_all();
    users.fetch_list(PageParams::default()).await.unwrap();
    users.fetch_list(PageParams::default()).await.unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_cache_clean_and_is_not_retried() {
    let mut server = Server::new_async().await;
    let failing = server
      .mock("GET", "/users")
      .match_query(Matcher::Any)
      .with_status(503)
      .expect(1)
      .create_async()
      .await;
    let (users, _clock) = users_cache(&server);

    let err = users.fetch_list(PageParams::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::BadResponse { status: 503, .. }));
    assert!(users.cache().is_empty());
    failing.assert_async().await;
    failing.remove_async().await;

    // The next caller action triggers a new attempt
    let recovered = mock_first_page(&mut server, 1).await;
    let page = users.fetch_list(PageParams::default()).await.unwrap();
    assert_eq!(page.data.total, 208);
    recovered.assert_async().await;
  }

  #[tokio::test]
  async fn test_filter_by_category_keys_include_category_and_page() {
    let mut server = Server::new_async().await;
    let body = serde_json::json!({
      "products": [{ "id": 1, "title": "Essence Mascara Lash Princess", "category": "beauty" }],
      "total": 5, "skip": 0, "limit": 10
    })
    .to_string();
    let beauty = server
      .mock("GET", "/products/category/beauty")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(&body)
      .expect(2)
      .create_async()
      .await;
    let groceries = server
      .mock("GET", "/products/category/groceries")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(&body)
      .expect(1)
      .create_async()
      .await;

    let api = ApiClient::new(&server.url()).unwrap();
    let products = ResourceCache::new(api, CacheLayer::<Product>::in_memory());

    let first_page = PageParams::new(10, 0);
    products.filter_by_category("beauty", first_page).await.unwrap();
    products.filter_by_category("beauty", first_page).await.unwrap();
    products
      .filter_by_category("beauty", PageParams::new(10, 10))
      .await
      .unwrap();
    let result = products
      .filter_by_category("groceries", first_page)
      .await
      .unwrap();

    beauty.assert_async().await;
    groceries.assert_async().await;
    assert_eq!(result.data.items[0].category, "beauty");
    assert_eq!(products.cache().len(), 3);
  }

  #[tokio::test]
  async fn test_resource_kinds_do_not_share_entries() {
    let mut server = Server::new_async().await;
    let users_mock = mock_first_page(&mut server, 1).await;
    let products_mock = server
      .mock("GET", "/products")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"products":[{"id":1}],"total":194,"skip":0,"limit":10}"#)
      .expect(1)
      .create_async()
      .await;

    let api = ApiClient::new(&server.url()).unwrap();
    let users = ResourceCache::new(api.clone(), CacheLayer::<User>::in_memory());
    let products = ResourceCache::new(api, CacheLayer::<Product>::in_memory());

    users.fetch_list(PageParams::default()).await.unwrap();
    let page = products.fetch_list(PageParams::default()).await.unwrap();

    users_mock.assert_async().await;
    products_mock.assert_async().await;
    assert_eq!(page.data.total, 194);
    assert_eq!(page.source, CacheSource::Network);
  }
}
