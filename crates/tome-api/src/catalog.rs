//! Catalog browsing and admin statistics.
//!
//! `GET /catalog` runs the same filter/sort pipeline the storefront uses, so
//! a client can ask for a page instead of filtering the full list itself.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use tome_core::{
  catalog::{self, CatalogPage, CatalogQuery, CatalogStats, PriceBracket, SortKey},
  identity::TokenVerifier,
  store::CatalogStore,
};

use crate::{ApiState, error::ApiError, gate::AdminUser};

/// Query string of `GET /catalog`. Unknown `price` or `sort` values fall back
/// to their defaults rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
  pub text:     Option<String>,
  pub category: Option<String>,
  pub price:    Option<String>,
  pub sort:     Option<String>,
}

impl From<BrowseParams> for CatalogQuery {
  fn from(params: BrowseParams) -> Self {
    Self {
      text:     params.text,
      category: params.category,
      price:    params
        .price
        .as_deref()
        .map(PriceBracket::parse_lenient)
        .unwrap_or_default(),
      sort:     params
        .sort
        .as_deref()
        .map(SortKey::parse_lenient)
        .unwrap_or_default(),
    }
  }
}

/// `GET /catalog[?text=&category=&price=&sort=]`
pub async fn browse<S, V>(
  State(state): State<ApiState<S, V>>,
  Query(params): Query<BrowseParams>,
) -> Result<Json<CatalogPage>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let books = state.store.list_books().await.map_err(ApiError::upstream)?;
  Ok(Json(catalog::query(&books, &params.into())))
}

/// `GET /admin/stats`
pub async fn stats<S, V>(
  State(state): State<ApiState<S, V>>,
  AdminUser(_): AdminUser,
) -> Result<Json<CatalogStats>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let books = state.store.list_books().await.map_err(ApiError::upstream)?;
  Ok(Json(CatalogStats::compute(&books)))
}
