//! Error type for `vault-etl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("input file not found: {}", .0.display())]
  MissingFile(PathBuf),

  #[error("CSV directory does not exist: {}", .0.display())]
  MissingCsvDir(PathBuf),

  #[error("failed to read {}: {source}", .path.display())]
  Csv {
    path:   PathBuf,
    source: csv::Error,
  },

  #[error("{file} is missing required columns: {}", .columns.join(", "))]
  MissingColumns {
    file:    String,
    columns: Vec<String>,
  },

  #[error("{file} row {row}, column {column}: {source}")]
  Value {
    file:   String,
    row:    usize,
    column: String,
    source: vault_core::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
