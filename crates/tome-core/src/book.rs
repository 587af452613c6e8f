//! Book records and validation of the JSON payloads that create or modify
//! them.
//!
//! Write payloads are validated field by field so that a client gets every
//! problem at once, in the `{ formErrors, fieldErrors }` shape the storefront
//! admin console already understands.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{Error, Result};

/// Category assigned when a new book does not name one.
pub const DEFAULT_CATEGORY: &str = "Fiction";

const MAX_TITLE_LEN: usize = 255;
const MAX_AUTHOR_LEN: usize = 255;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_COVER_URL_LEN: usize = 500;

// ─── Book ────────────────────────────────────────────────────────────────────

/// A catalog item as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  /// Store-assigned; never changes after creation.
  pub id:             Uuid,
  pub title:          String,
  pub author:         String,
  pub description:    Option<String>,
  /// Always finite and non-negative.
  pub price:          f64,
  pub category:       String,
  pub cover_url:      Option<String>,
  pub published_year: Option<i32>,
  pub pages:          Option<u32>,
  pub in_stock:       bool,
  pub created_at:     DateTime<Utc>,
  /// Never earlier than `created_at`.
  pub updated_at:     DateTime<Utc>,
}

/// Parse a book id taken from a URL path.
pub fn parse_book_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw).map_err(|_| Error::InvalidBookId(raw.to_owned()))
}

// ─── NewBook ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::create_book`].
/// `id`, `created_at` and `updated_at` are always set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
  pub title:          String,
  pub author:         String,
  pub description:    Option<String>,
  pub price:          f64,
  pub category:       String,
  pub cover_url:      Option<String>,
  pub published_year: Option<i32>,
  pub pages:          Option<u32>,
  pub in_stock:       bool,
}

impl NewBook {
  /// Convenience constructor with every optional field at its default.
  pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
    Self {
      title:          title.into(),
      author:         author.into(),
      description:    None,
      price:          0.0,
      category:       DEFAULT_CATEGORY.to_owned(),
      cover_url:      None,
      published_year: None,
      pages:          None,
      in_stock:       true,
    }
  }

  /// Validate a `POST /books` body. `title` and `author` are required.
  pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
    let (patch, mut errors) = read_fields(body);

    if errors.form_errors.is_empty() {
      for (key, present) in
        [("title", patch.title.is_some()), ("author", patch.author.is_some())]
      {
        if !present && !errors.field_errors.contains_key(key) {
          errors.field(key, "required");
        }
      }
    }

    let (Some(title), Some(author)) = (patch.title, patch.author) else {
      return Err(errors);
    };
    errors.into_result()?;

    Ok(Self {
      title,
      author,
      description:    patch.description.flatten(),
      price:          patch.price.unwrap_or(0.0),
      category:       patch
        .category
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
      cover_url:      patch.cover_url.flatten(),
      published_year: patch.published_year.flatten(),
      pages:          patch.pages.flatten(),
      in_stock:       patch.in_stock.unwrap_or(true),
    })
  }
}

// ─── BookPatch ───────────────────────────────────────────────────────────────

/// A partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
  pub title:          Option<String>,
  pub author:         Option<String>,
  pub description:    Option<Option<String>>,
  pub price:          Option<f64>,
  pub category:       Option<String>,
  pub cover_url:      Option<Option<String>>,
  pub published_year: Option<Option<i32>>,
  pub pages:          Option<Option<u32>>,
  pub in_stock:       Option<bool>,
}

impl BookPatch {
  /// Validate a `PUT /books/:id` body. Every field is optional.
  pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
    let (patch, errors) = read_fields(body);
    errors.into_result()?;
    Ok(patch)
  }
}

// ─── Validation errors ───────────────────────────────────────────────────────

/// Field-level validation failures for a write payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("validation failed")]
pub struct ValidationErrors {
  /// Problems with the payload as a whole (e.g. not a JSON object).
  pub form_errors:  Vec<String>,
  pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
  /// A payload-level error with no field attached.
  pub fn form(message: impl Into<String>) -> Self {
    Self { form_errors: vec![message.into()], ..Self::default() }
  }

  pub fn is_empty(&self) -> bool {
    self.form_errors.is_empty() && self.field_errors.is_empty()
  }

  fn field(&mut self, key: &str, message: impl Into<String>) {
    self
      .field_errors
      .entry(key.to_owned())
      .or_default()
      .push(message.into());
  }

  fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

// ─── Field readers ───────────────────────────────────────────────────────────

fn read_fields(body: &Value) -> (BookPatch, ValidationErrors) {
  let mut patch = BookPatch::default();
  let mut errors = ValidationErrors::default();

  let Some(object) = body.as_object() else {
    errors.form_errors.push("expected a JSON object".to_owned());
    return (patch, errors);
  };

  for (key, value) in object {
    let e = &mut errors;
    match key.as_str() {
      "title" => patch.title = text(key, value, MAX_TITLE_LEN, e),
      "author" => patch.author = text(key, value, MAX_AUTHOR_LEN, e),
      "description" => patch.description = nullable_text(key, value, None, e),
      "price" => patch.price = price(key, value, e),
      "category" => patch.category = text(key, value, MAX_CATEGORY_LEN, e),
      "coverUrl" => {
        patch.cover_url = nullable_text(key, value, Some(MAX_COVER_URL_LEN), e)
      }
      "publishedYear" => patch.published_year = published_year(key, value, e),
      "pages" => patch.pages = pages(key, value, e),
      "inStock" => match value.as_bool() {
        Some(b) => patch.in_stock = Some(b),
        None => e.field(key, "expected a boolean"),
      },
      "id" | "createdAt" | "updatedAt" => {
        e.field(key, "is assigned by the server")
      }
      _ => e.field(key, "unknown field"),
    }
  }

  (patch, errors)
}

/// A required, non-blank string of bounded length.
fn text(
  key: &str,
  value: &Value,
  max: usize,
  errors: &mut ValidationErrors,
) -> Option<String> {
  match value.as_str() {
    None => errors.field(key, "expected a string"),
    Some(s) if s.trim().is_empty() => errors.field(key, "must not be empty"),
    Some(s) if s.chars().count() > max => {
      errors.field(key, format!("must be at most {max} characters"))
    }
    Some(s) => return Some(s.to_owned()),
  }
  None
}

/// A string that may be `null`. Blank strings are stored as absent.
fn nullable_text(
  key: &str,
  value: &Value,
  max: Option<usize>,
  errors: &mut ValidationErrors,
) -> Option<Option<String>> {
  if value.is_null() {
    return Some(None);
  }
  match (value.as_str(), max) {
    (None, _) => errors.field(key, "expected a string or null"),
    (Some(s), Some(max)) if s.chars().count() > max => {
      errors.field(key, format!("must be at most {max} characters"))
    }
    (Some(s), _) if s.trim().is_empty() => return Some(None),
    (Some(s), _) => return Some(Some(s.to_owned())),
  }
  None
}

fn price(
  key: &str,
  value: &Value,
  errors: &mut ValidationErrors,
) -> Option<f64> {
  match value.as_f64() {
    None => errors.field(key, "expected a number"),
    Some(p) if !p.is_finite() || p < 0.0 => {
      errors.field(key, "must be greater than or equal to 0")
    }
    Some(p) => return Some(p),
  }
  None
}

fn published_year(
  key: &str,
  value: &Value,
  errors: &mut ValidationErrors,
) -> Option<Option<i32>> {
  if value.is_null() {
    return Some(None);
  }
  match value.as_i64().map(i32::try_from) {
    Some(Ok(year)) => return Some(Some(year)),
    Some(Err(_)) => errors.field(key, "is out of range"),
    None => errors.field(key, "expected an integer or null"),
  }
  None
}

fn pages(
  key: &str,
  value: &Value,
  errors: &mut ValidationErrors,
) -> Option<Option<u32>> {
  if value.is_null() {
    return Some(None);
  }
  match value.as_i64() {
    None => errors.field(key, "expected an integer or null"),
    Some(n) if n <= 0 => errors.field(key, "must be greater than 0"),
    Some(n) => match u32::try_from(n) {
      Ok(n) => return Some(Some(n)),
      Err(_) => errors.field(key, "is out of range"),
    },
  }
  None
}
