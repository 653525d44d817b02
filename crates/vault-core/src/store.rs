//! The `VaultStore` trait.
//!
//! Implemented by storage backends (e.g. `vault-store-sqlite`). The ETL
//! orchestrator in `vault-etl` is written against this trait only.

use serde::Serialize;

use crate::{Row, Table};

/// Result of emptying one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TruncateOutcome {
  Emptied { rows_removed: u64 },
  /// The table does not exist in the backing store.
  Missing,
}

/// Write access to a provisioned vault.
///
/// Loads are batch operations: every row of a call shares one `load_date`,
/// and a call either inserts all of its rows or none of them.
pub trait VaultStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Remove every row of `table`. A missing table is reported, not an error.
  fn truncate(&mut self, table: &'static Table) -> Result<TruncateOutcome, Self::Error>;

  /// Insert `rows` into `table` and return the number inserted.
  ///
  /// For hubs and satellites the hash key is derived from the
  /// `business_key` column of each row; links expect their hash keys to be
  /// present already. `source` is stamped on tables with a record source
  /// column.
  fn load(
    &mut self,
    table: &'static Table,
    rows: &[Row],
    business_key: &str,
    source: &str,
  ) -> Result<usize, Self::Error>;

  fn count_rows(&self, table: &'static Table) -> Result<u64, Self::Error>;
}
