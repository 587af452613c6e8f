//! Users: authenticated identities as remembered by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user record, keyed by the identity provider's subject claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  /// Provider-issued subject id; never supplied by a client.
  pub id:                String,
  pub email:             Option<String>,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub profile_image_url: Option<String>,
  /// Only changed by an explicit administrative action, never by an upsert.
  pub is_admin:          bool,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// Input to [`crate::store::CatalogStore::upsert_user`]: the profile fields
/// refreshed from verified token claims on every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
  pub id:                String,
  pub email:             Option<String>,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub profile_image_url: Option<String>,
}
