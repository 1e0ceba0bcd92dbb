//! Domain types for the two browsable resources and the signed-in user.
//!
//! Only the fields the dashboard shows are kept; anything else in the
//! payload is ignored and missing fields fall back to their defaults.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::cache::Cacheable;

/// A user record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
  pub id: u64,
  pub first_name: String,
  pub last_name: String,
  pub maiden_name: Option<String>,
  pub age: u32,
  pub gender: String,
  pub email: String,
  pub phone: String,
  pub username: String,
  pub birth_date: String,
  pub image: String,
  pub blood_group: String,
  pub height: f64,
  pub weight: f64,
  pub eye_color: String,
  pub hair: Hair,
  pub domain: String,
  pub ip: String,
  pub address: Address,
  pub university: String,
  pub company: Option<Company>,
}

impl User {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Hair {
  pub color: String,
  #[serde(rename = "type")]
  pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
  pub address: String,
  pub city: String,
  pub state: String,
  pub postal_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Company {
  pub name: String,
  pub department: String,
  pub title: String,
}

/// A product record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
  pub id: u64,
  pub title: String,
  pub description: String,
  pub category: String,
  pub price: f64,
  pub discount_percentage: f64,
  pub rating: f64,
  pub stock: u32,
  pub tags: Vec<String>,
  pub brand: Option<String>,
  pub sku: String,
  pub weight: f64,
  pub dimensions: Dimensions,
  pub warranty_information: String,
  pub shipping_information: String,
  pub availability_status: String,
  pub reviews: Vec<Review>,
  pub return_policy: String,
  pub minimum_order_quantity: u32,
  pub thumbnail: String,
  pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Dimensions {
  pub width: f64,
  pub height: f64,
  pub depth: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Review {
  pub rating: u8,
  pub comment: String,
  pub date: String,
  pub reviewer_name: String,
  pub reviewer_email: String,
}

/// Product category descriptor from `/products/categories`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Category {
  pub slug: String,
  pub name: String,
  pub url: String,
}

/// The account returned by a successful login. Serialized back out when
/// the login is remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthUser {
  pub id: u64,
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub gender: String,
  pub image: String,
  #[serde(alias = "token")]
  pub access_token: String,
}

impl AuthUser {
  pub fn display_name(&self) -> String {
    let name = format!("{} {}", self.first_name, self.last_name);
    let name = name.trim();
    if name.is_empty() {
      self.username.clone()
    } else {
      name.to_string()
    }
  }
}

/// A collection exposed by the remote service.
///
/// The path doubles as the name of the array field in list responses
/// (`GET /users` answers `{"users": [...], "total": ..}`).
pub trait Resource: Cacheable + DeserializeOwned {
  const PATH: &'static str;
  /// Singular label for messages
  const LABEL: &'static str;
}

impl Cacheable for User {
  fn resource_kind() -> &'static str {
    "users"
  }
}

impl Resource for User {
  const PATH: &'static str = "users";
  const LABEL: &'static str = "user";
}

impl Cacheable for Product {
  fn resource_kind() -> &'static str {
    "products"
  }
}

impl Resource for Product {
  const PATH: &'static str = "products";
  const LABEL: &'static str = "product";
}
