//! Server assembly for the Enchanted Tome catalog.
//!
//! Wires the JSON API from `tome-api` under `/api`, optionally serves the
//! storefront's built assets for every other path, and holds the pieces the
//! `tome` binary needs: configuration, the JWKS token verifier and the sample
//! catalog.

pub mod jwks;
pub mod seed;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use tome_core::{identity::TokenVerifier, store::CatalogStore};
use tower_http::{
  services::{ServeDir, ServeFile},
  trace::TraceLayer,
};

/// Where Firebase publishes the keys that sign its ID tokens.
pub const FIREBASE_JWKS_URI: &str = "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TOME_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Built storefront assets. Unset means the server answers `/api` only.
  #[serde(default)]
  pub static_dir:        Option<PathBuf>,
  #[serde(default)]
  pub seed_sample_books: bool,
  #[serde(default = "default_jwks_uri")]
  pub auth_jwks_uri:     String,
  /// Defaults to the Firebase issuer for [`Self::auth_audience`].
  #[serde(default)]
  pub auth_issuer:       Option<String>,
  /// The identity provider project id. Required to serve.
  #[serde(default)]
  pub auth_audience:     Option<String>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 5000 }

fn default_store_path() -> PathBuf { "tome.db".into() }

fn default_jwks_uri() -> String { FIREBASE_JWKS_URI.into() }

impl ServerConfig {
  /// The expected `iss` claim, if an audience is configured.
  pub fn issuer(&self) -> Option<String> {
    self.auth_issuer.clone().or_else(|| {
      self
        .auth_audience
        .as_deref()
        .map(|project| format!("https://securetoken.google.com/{project}"))
    })
  }

  /// `store_path` with a leading `~/` expanded to the home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, V>(
  store: Arc<S>,
  verifier: Arc<V>,
  static_dir: Option<&Path>,
) -> Router
where
  S: CatalogStore + 'static,
  V: TokenVerifier + 'static,
{
  let mut app = Router::new().nest("/api", tome_api::api_router(store, verifier));

  if let Some(dir) = static_dir {
    // Client-side routes resolve to the SPA shell.
    let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
    app = app.fallback_service(spa);
  }

  app.layer(TraceLayer::new_for_http())
}
