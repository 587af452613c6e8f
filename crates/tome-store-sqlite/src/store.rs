//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use tome_core::{
  book::{Book, BookPatch, NewBook},
  store::CatalogStore,
  user::{User, UserProfile},
};

use crate::{
  Result,
  encode::{
    BOOK_COLUMNS, RawBook, RawUser, USER_COLUMNS, encode_dt, encode_uuid,
    patch_assignments, read_book, read_user,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Current time at the precision the timestamp columns can hold, so that a
  /// returned record compares equal to the same record read back later.
  fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

  /// Insert a fully-built [`Book`] into the `books` table.
  async fn insert_book(&self, book: &Book) -> Result<()> {
    let id_str      = encode_uuid(book.id);
    let title       = book.title.clone();
    let author      = book.author.clone();
    let description = book.description.clone();
    let price       = book.price;
    let category    = book.category.clone();
    let cover_url   = book.cover_url.clone();
    let year        = book.published_year;
    let pages       = book.pages;
    let in_stock    = book.in_stock;
    let created_str = encode_dt(book.created_at);
    let updated_str = encode_dt(book.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO books (
             id, title, author, description, price, category,
             cover_url, published_year, pages, in_stock, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            title,
            author,
            description,
            price,
            category,
            cover_url,
            year,
            pages,
            in_stock,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_user<'a>(&'a self, id: &'a str) -> Result<Option<User>> {
    let id = id.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
              rusqlite::params![id],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn upsert_user(&self, profile: UserProfile) -> Result<User> {
    let now_str = encode_dt(Self::now());

    // `is_admin` and `created_at` are only ever written by the INSERT arm.
    let raw: RawUser = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO users (
               id, email, first_name, last_name, profile_image_url,
               is_admin, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT (id) DO UPDATE SET
               email             = excluded.email,
               first_name        = excluded.first_name,
               last_name         = excluded.last_name,
               profile_image_url = excluded.profile_image_url,
               updated_at        = MAX(users.created_at, excluded.updated_at)
             RETURNING {USER_COLUMNS}"
          ),
          rusqlite::params![
            profile.id,
            profile.email,
            profile.first_name,
            profile.last_name,
            profile.profile_image_url,
            now_str,
          ],
          read_user,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn set_admin<'a>(
    &'a self,
    id: &'a str,
    is_admin: bool,
  ) -> Result<Option<User>> {
    let id      = id.to_owned();
    let now_str = encode_dt(Self::now());

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE users
                 SET is_admin = ?2, updated_at = MAX(created_at, ?3)
                 WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
              ),
              rusqlite::params![id, is_admin, now_str],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn list_books(&self) -> Result<Vec<Book>> {
    let raws: Vec<RawBook> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], read_book)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBook::into_book).collect()
  }

  async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBook> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
              rusqlite::params![id_str],
              read_book,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBook::into_book).transpose()
  }

  async fn create_book(&self, input: NewBook) -> Result<Book> {
    let now = Self::now();
    let book = Book {
      id:             Uuid::new_v4(),
      title:          input.title,
      author:         input.author,
      description:    input.description,
      price:          input.price,
      category:       input.category,
      cover_url:      input.cover_url,
      published_year: input.published_year,
      pages:          input.pages,
      in_stock:       input.in_stock,
      created_at:     now,
      updated_at:     now,
    };

    self.insert_book(&book).await?;
    Ok(book)
  }

  async fn update_book(&self, id: Uuid, patch: BookPatch) -> Result<Option<Book>> {
    let assignments = patch_assignments(patch);
    let now_idx     = assignments.len() + 1;
    let id_idx      = assignments.len() + 2;

    let mut set: Vec<String> = assignments
      .iter()
      .enumerate()
      .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
      .collect();
    set.push(format!("updated_at = MAX(created_at, ?{now_idx})"));
    let sql = format!(
      "UPDATE books SET {} WHERE id = ?{id_idx} RETURNING {BOOK_COLUMNS}",
      set.join(", ")
    );

    let mut values: Vec<Value> =
      assignments.into_iter().map(|(_, value)| value).collect();
    values.push(Value::Text(encode_dt(Self::now())));
    values.push(Value::Text(encode_uuid(id)));

    // Merged in one statement so concurrent patches to different fields
    // both land.
    let raw: Option<RawBook> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(values), read_book)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBook::into_book).transpose()
  }

  async fn delete_book(&self, id: Uuid) -> Result<Option<Book>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBook> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("DELETE FROM books WHERE id = ?1 RETURNING {BOOK_COLUMNS}"),
              rusqlite::params![id_str],
              read_book,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBook::into_book).transpose()
  }
}
