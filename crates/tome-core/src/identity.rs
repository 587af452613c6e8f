//! Verified identities and the `TokenVerifier` trust root.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::user::UserProfile;

/// The decoded claims of a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// The provider's `sub` claim; becomes [`crate::user::User::id`].
  pub subject_id:   String,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub picture_url:  Option<String>,
}

impl Identity {
  pub fn new(subject_id: impl Into<String>) -> Self {
    Self {
      subject_id:   subject_id.into(),
      email:        None,
      display_name: None,
      picture_url:  None,
    }
  }

  /// The profile fields written by the upsert that follows verification.
  ///
  /// The display name is split on its first space: `"Mary Wollstonecraft
  /// Shelley"` becomes first name `Mary`, last name `Wollstonecraft Shelley`.
  pub fn profile(&self) -> UserProfile {
    let name = self.display_name.as_deref().map(str::trim).unwrap_or_default();
    let (first, last) = name.split_once(' ').unwrap_or((name, ""));

    UserProfile {
      id:                self.subject_id.clone(),
      email:             non_blank(self.email.as_deref()),
      first_name:        non_blank(Some(first)),
      last_name:         non_blank(Some(last.trim())),
      profile_image_url: non_blank(self.picture_url.as_deref()),
    }
  }
}

fn non_blank(s: Option<&str>) -> Option<String> {
  s.filter(|s| !s.trim().is_empty()).map(str::to_owned)
}

/// Verifies bearer tokens against the identity provider's key set.
///
/// Implementations must check signature, expiry, issuer and audience. Any
/// failure is reported as `Err`; callers decide how to degrade.
pub trait TokenVerifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + 'a;
}
