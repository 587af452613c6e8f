//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tome-store-sqlite`).
//! The HTTP layer and the auth gate depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  book::{Book, BookPatch, NewBook},
  user::{User, UserProfile},
};

/// Abstraction over the record store holding users and books.
///
/// Every operation is atomic for the single record it touches; nothing here
/// spans records.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Retrieve a user by subject id. Returns `None` if not found.
  fn get_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Insert a user with `is_admin = false`, or refresh the profile fields
  /// and `updated_at` of an existing one. Never modifies `is_admin` or
  /// `created_at` of an existing record.
  fn upsert_user(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Grant or revoke administrative privilege. Returns `None` if the user
  /// does not exist.
  fn set_admin<'a>(
    &'a self,
    id: &'a str,
    is_admin: bool,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Books ─────────────────────────────────────────────────────────────

  /// List every book, newest first.
  fn list_books(
    &self,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  /// Retrieve a book by id. Returns `None` if not found.
  fn get_book(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + '_;

  /// Persist a new book. The store assigns `id`, `created_at` and
  /// `updated_at`.
  fn create_book(
    &self,
    input: NewBook,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Merge `patch` into an existing book and refresh `updated_at`.
  /// Returns `None` if the book does not exist.
  fn update_book(
    &self,
    id: Uuid,
    patch: BookPatch,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + '_;

  /// Remove a book, returning the removed record, or `None` if it did not
  /// exist.
  fn delete_book(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + '_;
}
