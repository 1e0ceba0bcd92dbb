//! Errors surfaced at the cache boundary.

use thiserror::Error;

/// Why a remote fetch produced no data.
///
/// Returned as a value from every cached operation; a failed fetch never
/// changes what the cache holds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  /// The request could not complete (connect, timeout, reset)
  #[error("network error: {0}")]
  Network(String),

  /// The service answered with a non-success status
  #[error("unexpected response {status} from {url}")]
  BadResponse { status: u16, url: String },

  /// A single-item lookup for an id the service doesn't have
  #[error("{resource} {id} not found")]
  NotFound { resource: &'static str, id: u64 },

  /// Credentials were refused by the login endpoint
  #[error("{0}")]
  Unauthorized(String),

  /// The body didn't have the expected shape
  #[error("failed to decode response: {0}")]
  Decode(String),
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      return Self::Decode(err.to_string());
    }
    if let Some(status) = err.status() {
      return Self::BadResponse {
        status: status.as_u16(),
        url: err.url().map(|u| u.to_string()).unwrap_or_default(),
      };
    }
    Self::Network(err.to_string())
  }
}
