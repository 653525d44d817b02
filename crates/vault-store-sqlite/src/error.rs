//! Error type for `vault-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vault_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("{table}.{column} is not a hash-key column")]
  NotAKeyColumn {
    table:  &'static str,
    column: String,
  },

  #[error("schema is missing tables: {}", .0.join(", "))]
  MissingTables(Vec<String>),

  /// Link input rows without the precomputed hash-key columns.
  #[error("{table}: input rows are missing required columns: {}", .columns.join(", "))]
  MissingColumns {
    table:   &'static str,
    columns: Vec<&'static str>,
  },

  #[error("{table}: row {row} has no business key in column {column:?}")]
  MissingBusinessKey {
    table:  &'static str,
    row:    usize,
    column: String,
  },

  #[error("{table}: row {row}: {source}")]
  RowValue {
    table:  &'static str,
    row:    usize,
    source: vault_core::Error,
  },

  #[error("{table}: insert of row {row} failed: {source}")]
  RowInsert {
    table:  &'static str,
    row:    usize,
    source: rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
