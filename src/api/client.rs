use crate::api::api_types::{ApiCollection, ApiErrorBody, ApiLoginRequest};
use crate::api::error::FetchError;
use crate::api::types::{AuthUser, Category, Product, Resource};
use crate::cache::Page;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const TOKEN_LIFETIME_MINS: u32 = 60;

/// HTTP client for the remote collection service
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self> {
    let base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("API base URL '{}' cannot have paths", base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("dashdeck/", env!("CARGO_PKG_VERSION")))
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token: None,
    })
  }

  /// Copy of this client that sends the bearer token with every request
  pub fn with_token(&self, token: impl Into<String>) -> Self {
    Self {
      token: Some(token.into()),
      ..self.clone()
    }
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Build `{base}/{segments...}`, percent-encoding each segment
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn paged(&self, segments: &[&str], limit: u32, skip: u32) -> Url {
    let mut url = self.endpoint(segments);
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string())
      .append_pair("skip", &skip.to_string());
    url
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
    debug!(%url, "GET");
    let mut request = self.http.get(url.clone());
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      warn!(%url, status = status.as_u16(), "request failed");
      return Err(FetchError::BadResponse {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    response
      .json::<T>()
      .await
      .map_err(|e| FetchError::Decode(e.to_string()))
  }

  async fn get_page<T: Resource>(&self, url: Url) -> Result<Page<T>, FetchError> {
    let body: ApiCollection = self.get_json(url).await?;
    debug!(
      resource = T::PATH,
      total = body.total,
      skip = body.skip,
      limit = body.limit,
      "collection page received"
    );
    body
      .into_page(T::PATH)
      .map_err(|e| FetchError::Decode(e.to_string()))
  }

  /// `GET /{resource}?limit=&skip=`
  pub async fn list<T: Resource>(&self, limit: u32, skip: u32) -> Result<Page<T>, FetchError> {
    self.get_page(self.paged(&[T::PATH], limit, skip)).await
  }

  /// `GET /{resource}/search?q=`
  pub async fn search<T: Resource>(&self, term: &str) -> Result<Page<T>, FetchError> {
    let mut url = self.endpoint(&[T::PATH, "search"]);
    url.query_pairs_mut().append_pair("q", term);
    self.get_page(url).await
  }

  /// `GET /products/category/{category}?limit=&skip=`
  pub async fn by_category(
    &self,
    category: &str,
    limit: u32,
    skip: u32,
  ) -> Result<Page<Product>, FetchError> {
    let url = self.paged(&[Product::PATH, "category", category], limit, skip);
    self.get_page(url).await
  }

  /// `GET /{resource}/{id}`; a 404 means the item doesn't exist
  pub async fn get<T: Resource>(&self, id: u64) -> Result<T, FetchError> {
    let url = self.endpoint(&[T::PATH, &id.to_string()]);
    match self.get_json(url).await {
      Err(FetchError::BadResponse { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
        Err(FetchError::NotFound {
          resource: T::LABEL,
          id,
        })
      }
      other => other,
    }
  }

  /// `GET /products/categories`, reduced to slugs
  pub async fn categories(&self) -> Result<Vec<String>, FetchError> {
    let url = self.endpoint(&[Product::PATH, "categories"]);
    let categories: Vec<Category> = self.get_json(url).await?;
    Ok(categories.into_iter().map(|c| c.slug).collect())
  }

  /// `POST /auth/login`
  pub async fn login(&self, username: &str, password: &str) -> Result<AuthUser, FetchError> {
    let url = self.endpoint(&["auth", "login"]);
    debug!(%url, username, "POST");

    let response = self
      .http
      .post(url.clone())
      .json(&ApiLoginRequest {
        username,
        password,
        expires_in_mins: TOKEN_LIFETIME_MINS,
      })
      .send()
      .await?;

    let status = response.status();
    if status.is_client_error() {
      let body: ApiErrorBody = response.json().await.unwrap_or_default();
      return Err(FetchError::Unauthorized(
        body.message.unwrap_or_else(|| "Login failed".to_string()),
      ));
    }
    if !status.is_success() {
      return Err(FetchError::BadResponse {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    response
      .json::<AuthUser>()
      .await
      .map_err(|e| FetchError::Decode(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::User;
  use mockito::{Matcher, Server};

  fn users_body() -> String {
    serde_json::json!({
      "users": [
        { "id": 1, "firstName": "Emily", "lastName": "Johnson" },
        { "id": 2, "firstName": "Michael", "lastName": "Williams" }
      ],
      "total": 208,
      "skip": 0,
      "limit": 2
    })
    .to_string()
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    assert!(ApiClient::new("not a url").is_err());
    assert!(ApiClient::new("mailto:someone@example.com").is_err());
  }

  #[test]
  fn test_endpoint_encodes_segments() {
    let client = ApiClient::new("https://dummyjson.com").unwrap();
    let url = client.endpoint(&["products", "category", "home decoration"]);
    assert_eq!(
      url.as_str(),
      "https://dummyjson.com/products/category/home%20decoration"
    );

    let nested = ApiClient::new("https://example.com/api/").unwrap();
    assert_eq!(
      nested.endpoint(&["users"]).as_str(),
      "https://example.com/api/users"
    );
  }

  #[tokio::test]
  async fn test_list_sends_limit_and_skip() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/users")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("limit".into(), "2".into()),
        Matcher::UrlEncoded("skip".into(), "0".into()),
      ]))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(users_body())
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    let page: Page<User> = client.list(2, 0).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].first_name, "Michael");
    assert_eq!(page.total, 208);
  }

  #[tokio::test]
  async fn test_search_encodes_query() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/users/search")
      .match_query(Matcher::UrlEncoded("q".into(), "john & co".into()))
      .with_status(200)
      .with_body(users_body())
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    let page: Page<User> = client.search("john & co").await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.total, 208);
  }

  #[tokio::test]
  async fn test_get_maps_404_to_not_found() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/users/9999")
      .with_status(404)
      .with_body(r#"{"message":"User with id '9999' not found"}"#)
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    let err = client.get::<User>(9999).await.unwrap_err();

    assert_eq!(
      err,
      FetchError::NotFound {
        resource: "user",
        id: 9999
      }
    );
  }

  #[tokio::test]
  async fn test_server_error_is_bad_response() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/users")
      .match_query(Matcher::Any)
      .with_status(500)
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    let err = client.list::<User>(10, 0).await.unwrap_err();

    assert!(matches!(err, FetchError::BadResponse { status: 500, .. }));
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/users")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body("<html>")
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    let err = client.list::<User>(10, 0).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
  }

  #[tokio::test]
  async fn test_categories_returns_slugs() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/products/categories")
      .with_status(200)
      .with_body(
        serde_json::json!([
          { "slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty" },
          { "slug": "fragrances", "name": "Fragrances", "url": "https://dummyjson.com/products/category/fragrances" }
        ])
        .to_string(),
      )
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();
    assert_eq!(
      client.categories().await.unwrap(),
      vec!["beauty".to_string(), "fragrances".to_string()]
    );
  }

  #[tokio::test]
  async fn test_token_is_sent_as_bearer() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/products/1")
      .match_header("authorization", "Bearer secret-token")
      .with_status(200)
      .with_body(r#"{"id":1,"title":"Essence Mascara Lash Princess"}"#)
      .create_async()
      .await;

    let client = ApiClient::new(&server.url())
      .unwrap()
      .with_token("secret-token");
    let product: Product = client.get(1).await.unwrap();

    mock.assert_async().await;
    assert_eq!(product.title, "Essence Mascara Lash Princess");
  }

  #[tokio::test]
  async fn test_login_success_and_rejection() {
    let mut server = Server::new_async().await;
    server
      .mock("POST", "/auth/login")
      .match_body(Matcher::PartialJson(serde_json::json!({
        "username": "emilys",
        "password": "emilyspass"
      })))
      .with_status(200)
      .with_body(r#"{"id":1,"username":"emilys","firstName":"Emily","accessToken":"tok"}"#)
      .create_async()
      .await;
    server
      .mock("POST", "/auth/login")
      .match_body(Matcher::PartialJson(serde_json::json!({ "password": "wrong" })))
      .with_status(400)
      .with_body(r#"{"message":"Invalid credentials"}"#)
      .create_async()
      .await;

    let client = ApiClient::new(&server.url()).unwrap();

    let user = client.login("emilys", "emilyspass").await.unwrap();
    assert_eq!(user.access_token, "tok");

    let err = client.login("emilys", "wrong").await.unwrap_err();
    assert_eq!(err, FetchError::Unauthorized("Invalid credentials".to_string()));
  }

  #[tokio::test]
  async fn test_unreachable_server_is_network_error() {
    // Port 9 (discard) is not expected to be listening locally
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let err = client.list::<User>(10, 0).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
  }
}
