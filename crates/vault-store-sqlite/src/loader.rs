//! Row construction and transactional inserts behind
//! [`VaultStore::load`](vault_core::VaultStore::load).
//!
//! Every row is hashed, validated, and coerced before the first statement
//! runs. Inserts then execute one row at a time on a cached prepared
//! statement inside a single transaction, so the first failing row aborts the
//! whole table load.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};
use tracing::{debug, error, info};
use vault_core::{ColumnRole, HashKey, Row, Table, TableKind, Value};

use crate::{
  Error, Result,
  encode::{encode_attribute, encode_key, encode_load_date, encode_text},
};

const PROGRESS_EVERY: usize = 10_000;

/// A validated row: the columns it populates and their values.
#[derive(Debug)]
struct Insert {
  columns: Vec<&'static str>,
  values:  Vec<SqlValue>,
}

impl Insert {
  fn sql(&self, table: &Table) -> String {
    let placeholders = (1..=self.columns.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    format!(
      "INSERT INTO {} ({}) VALUES ({placeholders})",
      table.name,
      self.columns.join(", ")
    )
  }
}

pub fn load(
  conn: &mut Connection,
  table: &'static Table,
  rows: &[Row],
  business_key: &str,
  source: &str,
) -> Result<usize> {
  if rows.is_empty() {
    debug!(table = table.name, "nothing to load");
    return Ok(0);
  }
  if table.kind == TableKind::Link {
    check_link_keys(table, rows)?;
  }

  let load_date = Utc::now();
  let inserts = rows
    .iter()
    .enumerate()
    .map(|(index, row)| build(table, index, row, business_key, source, load_date))
    .collect::<Result<Vec<_>>>()?;

  let tx = conn.transaction()?;
  for (index, insert) in inserts.iter().enumerate() {
    let result = tx
      .prepare_cached(&insert.sql(table))
      .and_then(|mut stmt| stmt.execute(params_from_iter(insert.values.iter())));
    if let Err(source) = result {
      error!(
        table = table.name,
        row = index,
        values = ?rows[index],
        error = %source,
        "row insert failed, rolling back table load"
      );
      return Err(Error::RowInsert { table: table.name, row: index, source });
    }
    if (index + 1) % PROGRESS_EVERY == 0 {
      info!(table = table.name, rows = index + 1, "loading");
    }
  }
  tx.commit()?;

  info!(table = table.name, rows = inserts.len(), "table loaded");
  Ok(inserts.len())
}

/// Every hash-key column of a link must hold a key in every row.
fn check_link_keys(table: &'static Table, rows: &[Row]) -> Result<()> {
  let missing: Vec<&'static str> = table
    .keys()
    .filter(|c| rows.iter().any(|row| link_key(row, c.name).is_none()))
    .map(|c| c.name)
    .collect();
  if missing.is_empty() {
    return Ok(());
  }
  error!(table = table.name, columns = ?missing, "link input is missing hash-key columns");
  Err(Error::MissingColumns { table: table.name, columns: missing })
}

fn link_key(row: &Row, column: &str) -> Option<HashKey> {
  row.get(column).and_then(Value::as_key)
}

fn business_key_of(
  table: &'static Table,
  index: usize,
  row: &Row,
  column: &str,
) -> Result<i64> {
  let missing = || Error::MissingBusinessKey {
    table: table.name,
    row: index,
    column: column.to_owned(),
  };
  row
    .get(column)
    .ok_or_else(missing)?
    .to_integer()
    .map_err(|source| Error::RowValue { table: table.name, row: index, source })?
    .ok_or_else(missing)
}

fn build(
  table: &'static Table,
  index: usize,
  row: &Row,
  business_key: &str,
  source: &str,
  load_date: DateTime<Utc>,
) -> Result<Insert> {
  let business_key = match table.kind {
    TableKind::Link => None,
    TableKind::Hub | TableKind::Satellite => {
      Some(business_key_of(table, index, row, business_key)?)
    }
  };

  let mut insert = Insert {
    columns: Vec::with_capacity(table.columns.len()),
    values:  Vec::with_capacity(table.columns.len()),
  };
  for column in table.columns {
    let value = match (column.role, business_key) {
      (ColumnRole::Key, Some(bk)) => encode_key(HashKey::of(bk)),
      (ColumnRole::Key, None) => match link_key(row, column.name) {
        Some(key) => encode_key(key),
        None => {
          return Err(Error::MissingColumns {
            table:   table.name,
            columns: vec![column.name],
          });
        }
      },
      (ColumnRole::BusinessKey, Some(bk)) => SqlValue::Integer(bk),
      (ColumnRole::BusinessKey, None) => continue,
      (ColumnRole::LoadDate, _) => encode_load_date(load_date),
      (ColumnRole::Source, _) => encode_text(column, source),
      (ColumnRole::Attribute, _) => {
        let Some(value) = row.get(column.name) else { continue };
        let encoded = encode_attribute(column, value)
          .map_err(|source| Error::RowValue { table: table.name, row: index, source })?;
        match encoded {
          Some(value) => value,
          None => continue,
        }
      }
    };
    insert.columns.push(column.name);
    insert.values.push(value);
  }
  Ok(insert)
}
