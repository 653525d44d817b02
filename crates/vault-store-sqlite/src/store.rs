//! [`SqliteVault`]: the SQLite implementation of [`VaultStore`].

use std::{collections::BTreeSet, path::Path};

use rusqlite::Connection;
use tracing::info;
use vault_core::{CATALOG, HashKey, Row, Table, TruncateOutcome, VaultStore};

use crate::{
  Error, Result,
  encode::decode_key,
  functions, loader,
  schema::{LIST_TABLES, PRAGMAS, create_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A data vault backed by a single SQLite database.
///
/// Owns its connection; dropping the vault closes it.
pub struct SqliteVault {
  conn: Connection,
}

impl SqliteVault {
  /// Open (or create) the database at `path`. Does not touch the schema;
  /// call [`provision`](Self::provision) to build it.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory database, useful for testing.
  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(PRAGMAS)?;
    functions::register(&conn)?;
    Ok(Self { conn })
  }

  /// Drop every table in the database and recreate the full catalog, then
  /// verify it. Destructive: all prior data is lost.
  pub fn provision(&mut self) -> Result<()> {
    // Foreign keys cannot be toggled inside a transaction, and dropping
    // referenced tables in arbitrary order needs them off.
    self.conn.pragma_update(None, "foreign_keys", false)?;
    let rebuilt = self.rebuild();
    let restored = self.conn.pragma_update(None, "foreign_keys", true);
    rebuilt?;
    restored?;

    functions::register(&self.conn)?;
    self.verify()?;
    info!(tables = CATALOG.len(), "schema provisioned");
    Ok(())
  }

  fn rebuild(&mut self) -> Result<()> {
    let tx = self.conn.transaction()?;
    let existing = list_tables(&tx)?;
    for name in &existing {
      tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{name}\""))?;
    }
    if !existing.is_empty() {
      info!(dropped = existing.len(), "dropped existing tables");
    }
    for table in CATALOG {
      tx.execute_batch(&create_table(table))?;
    }
    tx.commit()?;
    Ok(())
  }

  /// Check that every catalog table exists.
  pub fn verify(&self) -> Result<()> {
    let present = self.table_names()?;
    let missing: Vec<String> = CATALOG
      .iter()
      .filter(|t| !present.contains(t.name))
      .map(|t| t.name.to_owned())
      .collect();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::MissingTables(missing))
    }
  }

  /// Names of all user tables currently in the database.
  pub fn table_names(&self) -> Result<BTreeSet<String>> {
    Ok(list_tables(&self.conn)?.into_iter().collect())
  }

  /// All hash keys stored in `table.column`, in no particular order.
  pub fn hash_keys(&self, table: &'static Table, column: &str) -> Result<Vec<HashKey>> {
    let column = table
      .keys()
      .find(|c| c.name == column)
      .ok_or_else(|| Error::NotAKeyColumn { table: table.name, column: column.to_owned() })?;
    let mut stmt = self
      .conn
      .prepare(&format!("SELECT {} FROM {}", column.name, table.name))?;
    let blobs = stmt
      .query_map([], |r| r.get::<_, Vec<u8>>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(blobs.iter().filter_map(|b| decode_key(b)).collect())
  }

  /// The underlying connection, for ad-hoc read queries.
  pub fn connection(&self) -> &Connection { &self.conn }

  /// Close the connection, surfacing any error SQLite reports on close.
  pub fn close(self) -> Result<()> {
    self.conn.close().map_err(|(_, e)| Error::Database(e))
  }
}

fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(LIST_TABLES)?;
  let names = stmt
    .query_map([], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
  matches!(err, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("no such table"))
}

// ─── VaultStore impl ─────────────────────────────────────────────────────────

impl VaultStore for SqliteVault {
  type Error = Error;

  fn truncate(&mut self, table: &'static Table) -> Result<TruncateOutcome> {
    match self.conn.execute(&format!("DELETE FROM {}", table.name), []) {
      Ok(n) => Ok(TruncateOutcome::Emptied { rows_removed: n as u64 }),
      Err(e) if is_missing_table(&e) => Ok(TruncateOutcome::Missing),
      Err(e) => Err(e.into()),
    }
  }

  fn load(
    &mut self,
    table: &'static Table,
    rows: &[Row],
    business_key: &str,
    source: &str,
  ) -> Result<usize> {
    loader::load(&mut self.conn, table, rows, business_key, source)
  }

  fn count_rows(&self, table: &'static Table) -> Result<u64> {
    let n: i64 = self
      .conn
      .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |r| r.get(0))?;
    Ok(n as u64)
  }
}
