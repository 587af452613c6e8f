//! Handlers for `/books` endpoints.
//!
//! | Method   | Path          | Guard | Notes |
//! |----------|---------------|-------|-------|
//! | `GET`    | `/books`      | none  | Newest first |
//! | `GET`    | `/books/:id`  | none  | 404 if not found |
//! | `POST`   | `/books`      | admin | 201 with the created record |
//! | `PUT`    | `/books/:id`  | admin | Partial update; 404 if not found |
//! | `DELETE` | `/books/:id`  | admin | 204; 404 if not found |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::Value;
use tome_core::{
  book::{Book, BookPatch, NewBook, parse_book_id},
  identity::TokenVerifier,
  store::CatalogStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, gate::AdminUser};

/// A path id that is not a UUID cannot name a stored book.
fn book_id(raw: &str) -> Result<Uuid, ApiError> {
  parse_book_id(raw).map_err(|_| book_not_found())
}

fn book_not_found() -> ApiError { ApiError::NotFound("Book not found".into()) }

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /books`
pub async fn list<S, V>(
  State(state): State<ApiState<S, V>>,
) -> Result<Json<Vec<Book>>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let books = state.store.list_books().await.map_err(ApiError::upstream)?;
  Ok(Json(books))
}

/// `GET /books/:id`
pub async fn get_one<S, V>(
  State(state): State<ApiState<S, V>>,
  Path(id): Path<String>,
) -> Result<Json<Book>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let id = book_id(&id)?;
  state
    .store
    .get_book(id)
    .await
    .map_err(ApiError::upstream)?
    .map(Json)
    .ok_or_else(book_not_found)
}

// ─── Write ────────────────────────────────────────────────────────────────────

/// `POST /books`
pub async fn create<S, V>(
  State(state): State<ApiState<S, V>>,
  AdminUser(admin): AdminUser,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let Json(body) = body?;
  let input = NewBook::from_json(&body)?;

  let book = state
    .store
    .create_book(input)
    .await
    .map_err(ApiError::upstream)?;
  tracing::info!(book_id = %book.id, admin = %admin.id, "book created");

  Ok((StatusCode::CREATED, Json(book)))
}

/// `PUT /books/:id`
///
/// Only the supplied fields change; `null` clears a nullable field.
pub async fn update<S, V>(
  State(state): State<ApiState<S, V>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Book>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let id = book_id(&id)?;
  if state
    .store
    .get_book(id)
    .await
    .map_err(ApiError::upstream)?
    .is_none()
  {
    return Err(book_not_found());
  }

  let Json(body) = body?;
  let patch = BookPatch::from_json(&body)?;

  let book = state
    .store
    .update_book(id, patch)
    .await
    .map_err(ApiError::upstream)?
    .ok_or_else(book_not_found)?;
  tracing::info!(book_id = %book.id, admin = %admin.id, "book updated");

  Ok(Json(book))
}

/// `DELETE /books/:id`
pub async fn delete<S, V>(
  State(state): State<ApiState<S, V>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let id = book_id(&id)?;
  let removed = state
    .store
    .delete_book(id)
    .await
    .map_err(ApiError::upstream)?
    .ok_or_else(book_not_found)?;
  tracing::info!(book_id = %removed.id, admin = %admin.id, "book deleted");

  Ok(StatusCode::NO_CONTENT)
}
