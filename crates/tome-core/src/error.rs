//! Error types for `tome-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid book id: {0:?}")]
  InvalidBookId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
