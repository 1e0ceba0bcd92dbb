//! Serde-deserializable types matching the remote service's wire format.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::Page;

// ============================================================================
// Collection endpoints (list, search, category)
// ============================================================================

/// `{ "<resource>": [...], "total": n, "skip": n, "limit": n }`
///
/// The array's field name depends on the resource, so it is collected with
/// everything else and pulled out by name.
#[derive(Debug, Deserialize)]
pub struct ApiCollection {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub skip: u64,
  #[serde(default)]
  pub limit: u64,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

impl ApiCollection {
  /// Extract the named item array as a page.
  pub fn into_page<T: DeserializeOwned>(mut self, field: &str) -> serde_json::Result<Page<T>> {
    let items = match self.rest.remove(field) {
      Some(value) => serde_json::from_value(value)?,
      None => Vec::new(),
    };
    Ok(Page::new(items, self.total))
  }
}

// ============================================================================
// Auth endpoint
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
  pub expires_in_mins: u32,
}

/// Error body, e.g. `{"message": "Invalid credentials"}`
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}
