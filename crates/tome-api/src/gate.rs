//! The auth gate: bearer-token verification, user upsert and role checks.
//!
//! Per request the gate moves through `NoToken → TokenPresent → {Verified,
//! Rejected}`, and a verified identity may then be role-checked. Rejection
//! never surfaces as an error by itself; it only means the request is
//! anonymous. The guards decide whether anonymity is acceptable.
//!
//! Handlers declare their requirement through the [`Authenticated`] and
//! [`AdminUser`] extractors.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use tome_core::{
  identity::{Identity, TokenVerifier},
  store::CatalogStore,
  user::User,
};

use crate::{ApiState, error::ApiError};

/// The identity resolved for one request; `None` means anonymous.
///
/// Resolved at most once per request and cached in the request extensions.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity(pub Option<Identity>);

/// The token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Verify the request's bearer token and upsert the matching user.
///
/// Every failure (no token, bad token, store error during the upsert)
/// degrades to an anonymous request.
pub async fn authenticate<S, V>(
  store: &S,
  verifier: &V,
  headers: &HeaderMap,
) -> RequestIdentity
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let Some(token) = bearer_token(headers) else {
    return RequestIdentity(None);
  };

  let identity = match verifier.verify(token).await {
    Ok(identity) => identity,
    Err(e) => {
      tracing::debug!(error = %e, "bearer token rejected");
      return RequestIdentity(None);
    }
  };

  if let Err(e) = store.upsert_user(identity.profile()).await {
    tracing::error!(
      error = %e,
      subject = %identity.subject_id,
      "failed to upsert user after verification"
    );
    return RequestIdentity(None);
  }

  RequestIdentity(Some(identity))
}

/// Reject anonymous requests with 401.
pub fn require_authenticated(
  request: &RequestIdentity,
) -> Result<&Identity, ApiError> {
  request.0.as_ref().ok_or(ApiError::Unauthorized)
}

/// Reject anonymous requests with 401 and non-admins with 403.
///
/// The role is read from the store on every call, so a revocation applies to
/// the very next request.
pub async fn require_admin<S>(
  store: &S,
  request: &RequestIdentity,
) -> Result<User, ApiError>
where
  S: CatalogStore,
{
  let identity = require_authenticated(request)?;
  let user = store
    .get_user(&identity.subject_id)
    .await
    .map_err(ApiError::upstream)?
    .ok_or(ApiError::Unauthorized)?;

  if !user.is_admin {
    tracing::debug!(subject = %user.id, "admin route refused");
    return Err(ApiError::Forbidden);
  }
  Ok(user)
}

async fn resolve<S, V>(parts: &mut Parts, state: &ApiState<S, V>) -> RequestIdentity
where
  S: CatalogStore,
  V: TokenVerifier,
{
  if let Some(cached) = parts.extensions.get::<RequestIdentity>() {
    return cached.clone();
  }
  let resolved =
    authenticate(state.store.as_ref(), state.verifier.as_ref(), &parts.headers)
      .await;
  parts.extensions.insert(resolved.clone());
  resolved
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a valid token.
pub struct Authenticated(pub Identity);

impl<S, V> FromRequestParts<ApiState<S, V>> for Authenticated
where
  S: CatalogStore + 'static,
  V: TokenVerifier + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, V>,
  ) -> Result<Self, Self::Rejection> {
    let request = resolve(parts, state).await;
    require_authenticated(&request).cloned().map(Authenticated)
  }
}

/// Present in a handler means the caller is a current admin.
pub struct AdminUser(pub User);

impl<S, V> FromRequestParts<ApiState<S, V>> for AdminUser
where
  S: CatalogStore + 'static,
  V: TokenVerifier + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, V>,
  ) -> Result<Self, Self::Rejection> {
    let request = resolve(parts, state).await;
    require_admin(state.store.as_ref(), &request).await.map(AdminUser)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn bearer_token_is_extracted() {
    assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
  }

  #[test]
  fn other_schemes_and_blank_tokens_are_ignored() {
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer   ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }

  #[test]
  fn anonymous_request_is_unauthorized() {
    assert!(matches!(
      require_authenticated(&RequestIdentity(None)),
      Err(ApiError::Unauthorized)
    ));
  }
}
