//! JSON REST API for the Enchanted Tome catalog.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`], with bearer
//! tokens checked by any [`TokenVerifier`]. TLS, static assets and request
//! tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tome_api::api_router(store.clone(), verifier.clone()))
//! ```

pub mod account;
pub mod books;
pub mod catalog;
pub mod error;
pub mod gate;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tome_core::{identity::TokenVerifier, store::CatalogStore};

pub use error::ApiError;

/// Shared state handed to every handler and extractor.
pub struct ApiState<S, V> {
  pub store:    Arc<S>,
  pub verifier: Arc<V>,
}

// Not derived: the derive would demand `S: Clone` and `V: Clone`.
impl<S, V> Clone for ApiState<S, V> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      verifier: Arc::clone(&self.verifier),
    }
  }
}

/// Build a fully-materialised API router for `store` and `verifier`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, V>(store: Arc<S>, verifier: Arc<V>) -> Router<()>
where
  S: CatalogStore + 'static,
  V: TokenVerifier + 'static,
{
  Router::new()
    // Account
    .route("/auth/user", get(account::current_user::<S, V>))
    .route("/admin/make-admin", post(account::make_admin::<S, V>))
    // Books
    .route("/books", get(books::list::<S, V>).post(books::create::<S, V>))
    .route(
      "/books/{id}",
      get(books::get_one::<S, V>)
        .put(books::update::<S, V>)
        .delete(books::delete::<S, V>),
    )
    // Catalog
    .route("/catalog", get(catalog::browse::<S, V>))
    .route("/admin/stats", get(catalog::stats::<S, V>))
    .with_state(ApiState { store, verifier })
}
