//! [`JwksVerifier`]: bearer-token verification against a published JWKS.
//!
//! Tokens are RS256 JWTs whose `kid` header names a key in the provider's key
//! set. Issuer, audience and expiry are checked on every token. Keys are
//! cached and refetched when a token names a `kid` the cache does not know,
//! which is how provider key rotation shows up.

use std::{
  collections::HashMap,
  time::{Duration, Instant},
};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tome_core::identity::{Identity, TokenVerifier};

/// Minimum gap between key-set refetches triggered by an unknown `kid`.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum JwksError {
  #[error("failed to fetch key set: {0}")]
  Fetch(#[from] reqwest::Error),

  #[error("key set contains no usable RSA keys")]
  NoUsableKeys,

  #[error("token header has no kid")]
  MissingKeyId,

  #[error("no key for kid {0:?}")]
  UnknownKey(String),

  #[error("invalid token: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("token has an empty subject")]
  EmptySubject,
}

#[derive(Debug, Deserialize)]
struct KeySet {
  keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
  kid: String,
  kty: String,
  n:   Option<String>,
  e:   Option<String>,
}

/// The claims read from a verified token. `exp`, `iss` and `aud` are checked
/// by [`Validation`] and not needed afterwards.
#[derive(Debug, Deserialize)]
struct Claims {
  sub:     String,
  #[serde(default)]
  email:   Option<String>,
  #[serde(default)]
  name:    Option<String>,
  #[serde(default)]
  picture: Option<String>,
}

impl From<Claims> for Identity {
  fn from(claims: Claims) -> Self {
    Self {
      subject_id:   claims.sub,
      email:        claims.email,
      display_name: claims.name,
      picture_url:  claims.picture,
    }
  }
}

// ─── Verifier ────────────────────────────────────────────────────────────────

pub struct JwksVerifier {
  http:         reqwest::Client,
  jwks_uri:     String,
  validation:   Validation,
  keys:         RwLock<HashMap<String, DecodingKey>>,
  last_refresh: Mutex<Option<Instant>>,
}

impl JwksVerifier {
  /// A verifier with an empty key cache. Call [`Self::refresh`] before
  /// serving; an unreachable provider at startup should be fatal.
  pub fn new(jwks_uri: impl Into<String>, issuer: &str, audience: &str) -> Self {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);

    Self {
      http: reqwest::Client::new(),
      jwks_uri: jwks_uri.into(),
      validation,
      keys: RwLock::new(HashMap::new()),
      last_refresh: Mutex::new(None),
    }
  }

  /// Refetch the key set and replace the cache. Returns the number of keys
  /// loaded.
  pub async fn refresh(&self) -> Result<usize, JwksError> {
    let mut last_refresh = self.last_refresh.lock().await;
    *last_refresh = Some(Instant::now());
    self.fetch_keys().await
  }

  /// Callers hold the `last_refresh` lock.
  async fn fetch_keys(&self) -> Result<usize, JwksError> {
    tracing::info!(uri = %self.jwks_uri, "fetching JWKS");

    let set: KeySet = self
      .http
      .get(&self.jwks_uri)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let mut fresh = HashMap::new();
    for jwk in set.keys {
      let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else { continue };
      if jwk.kty != "RSA" {
        continue;
      }
      match DecodingKey::from_rsa_components(n, e) {
        Ok(key) => {
          fresh.insert(jwk.kid, key);
        }
        Err(e) => tracing::warn!(kid = %jwk.kid, error = %e, "skipping unparseable JWK"),
      }
    }
    if fresh.is_empty() {
      return Err(JwksError::NoUsableKeys);
    }

    let count = fresh.len();
    *self.keys.write().await = fresh;
    tracing::info!(count, "loaded JWKS keys");
    Ok(count)
  }

  async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
    self.keys.read().await.get(kid).cloned()
  }

  /// Look up `kid`, refetching once if it is unknown and the throttle allows.
  /// The throttle check, the fetch and the timestamp happen under one lock,
  /// so concurrent lookups share a single fetch.
  async fn key_for(&self, kid: &str) -> Result<DecodingKey, JwksError> {
    if let Some(key) = self.cached_key(kid).await {
      return Ok(key);
    }

    let mut last_refresh = self.last_refresh.lock().await;
    // A lookup that held the lock before us may have loaded the key.
    if let Some(key) = self.cached_key(kid).await {
      return Ok(key);
    }
    if last_refresh.is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL) {
      return Err(JwksError::UnknownKey(kid.to_owned()));
    }

    *last_refresh = Some(Instant::now());
    if let Err(e) = self.fetch_keys().await {
      tracing::warn!(error = %e, "JWKS refresh failed; keeping cached keys");
    }
    drop(last_refresh);

    self
      .cached_key(kid)
      .await
      .ok_or_else(|| JwksError::UnknownKey(kid.to_owned()))
  }
}

impl TokenVerifier for JwksVerifier {
  type Error = JwksError;

  async fn verify<'a>(&'a self, token: &'a str) -> Result<Identity, JwksError> {
    let kid = decode_header(token)?.kid.ok_or(JwksError::MissingKeyId)?;
    let key = self.key_for(&kid).await?;

    let claims = decode::<Claims>(token, &key, &self.validation)?.claims;
    if claims.sub.is_empty() {
      return Err(JwksError::EmptySubject);
    }
    Ok(claims.into())
  }
}
