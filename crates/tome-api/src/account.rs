//! Handlers for the caller's own account.
//!
//! | Method | Path                 | Guard         |
//! |--------|----------------------|---------------|
//! | `GET`  | `/auth/user`         | authenticated |
//! | `POST` | `/admin/make-admin`  | authenticated |

use axum::{Json, extract::State};
use tome_core::{identity::TokenVerifier, store::CatalogStore, user::User};

use crate::{ApiState, error::ApiError, gate::Authenticated};

/// `GET /auth/user`
///
/// The gate has already upserted the caller, so the record reflects the
/// claims of the token just presented.
pub async fn current_user<S, V>(
  State(state): State<ApiState<S, V>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<User>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  state
    .store
    .get_user(&identity.subject_id)
    .await
    .map_err(ApiError::upstream)?
    .map(Json)
    .ok_or(ApiError::Unauthorized)
}

/// `POST /admin/make-admin`
///
/// Grants the admin flag to the caller's own record.
pub async fn make_admin<S, V>(
  State(state): State<ApiState<S, V>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<User>, ApiError>
where
  S: CatalogStore,
  V: TokenVerifier,
{
  let user = state
    .store
    .set_admin(&identity.subject_id, true)
    .await
    .map_err(ApiError::upstream)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  tracing::info!(subject = %user.id, "admin privilege granted");

  Ok(Json(user))
}
