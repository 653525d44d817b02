//! Error types for `vault-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("value {0:?} is not an integer")]
  NotAnInteger(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
