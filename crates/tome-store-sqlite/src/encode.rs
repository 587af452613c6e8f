//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use tome_core::{
  book::{Book, BookPatch},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Books ───────────────────────────────────────────────────────────────────

/// Column list matching [`read_book`].
pub const BOOK_COLUMNS: &str = "id, title, author, description, price, \
  category, cover_url, published_year, pages, in_stock, created_at, updated_at";

/// Raw values read directly from a `books` row.
pub struct RawBook {
  pub id:             String,
  pub title:          String,
  pub author:         String,
  pub description:    Option<String>,
  pub price:          f64,
  pub category:       String,
  pub cover_url:      Option<String>,
  pub published_year: Option<i32>,
  pub pages:          Option<u32>,
  pub in_stock:       bool,
  pub created_at:     String,
  pub updated_at:     String,
}

pub fn read_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBook> {
  Ok(RawBook {
    id:             row.get(0)?,
    title:          row.get(1)?,
    author:         row.get(2)?,
    description:    row.get(3)?,
    price:          row.get(4)?,
    category:       row.get(5)?,
    cover_url:      row.get(6)?,
    published_year: row.get(7)?,
    pages:          row.get(8)?,
    in_stock:       row.get(9)?,
    created_at:     row.get(10)?,
    updated_at:     row.get(11)?,
  })
}

impl RawBook {
  pub fn into_book(self) -> Result<Book> {
    Ok(Book {
      id:             decode_uuid(&self.id)?,
      title:          self.title,
      author:         self.author,
      description:    self.description,
      price:          self.price,
      category:       self.category,
      cover_url:      self.cover_url,
      published_year: self.published_year,
      pages:          self.pages,
      in_stock:       self.in_stock,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// The `column = value` assignments a patch makes, in column order. Fields the
/// patch leaves alone are absent; cleared nullable fields become `NULL`.
pub fn patch_assignments(patch: BookPatch) -> Vec<(&'static str, Value)> {
  let BookPatch {
    title,
    author,
    description,
    price,
    category,
    cover_url,
    published_year,
    pages,
    in_stock,
  } = patch;

  [
    ("title", title.map(Value::from)),
    ("author", author.map(Value::from)),
    ("description", description.map(Value::from)),
    ("price", price.map(Value::from)),
    ("category", category.map(Value::from)),
    ("cover_url", cover_url.map(Value::from)),
    ("published_year", published_year.map(Value::from)),
    ("pages", pages.map(Value::from)),
    ("in_stock", in_stock.map(Value::from)),
  ]
  .into_iter()
  .filter_map(|(column, value)| Some((column, value?)))
  .collect()
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Column list matching [`read_user`].
pub const USER_COLUMNS: &str = "id, email, first_name, last_name, \
  profile_image_url, is_admin, created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                String,
  pub email:             Option<String>,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub profile_image_url: Option<String>,
  pub is_admin:          bool,
  pub created_at:        String,
  pub updated_at:        String,
}

pub fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    id:                row.get(0)?,
    email:             row.get(1)?,
    first_name:        row.get(2)?,
    last_name:         row.get(3)?,
    profile_image_url: row.get(4)?,
    is_admin:          row.get(5)?,
    created_at:        row.get(6)?,
    updated_at:        row.get(7)?,
  })
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:                self.id,
      email:             self.email,
      first_name:        self.first_name,
      last_name:         self.last_name,
      profile_image_url: self.profile_image_url,
      is_admin:          self.is_admin,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = base + Duration::microseconds(1500);
    let a = encode_dt(base);
    let b = encode_dt(later);
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn patch_assignments_skip_untouched_fields() {
    let patch = BookPatch {
      price: Some(9.5),
      cover_url: Some(None),
      pages: Some(Some(418)),
      ..BookPatch::default()
    };
    assert_eq!(
      patch_assignments(patch),
      [
        ("price", Value::Real(9.5)),
        ("cover_url", Value::Null),
        ("pages", Value::Integer(418)),
      ]
    );
    assert!(patch_assignments(BookPatch::default()).is_empty());
  }
}
