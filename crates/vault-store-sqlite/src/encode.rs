//! Conversions from loader input to SQLite values.
//!
//! Hash keys are stored as 32-byte blobs, `load_date` as RFC 3339 text, and
//! timestamp attributes as ISO 8601 text with millisecond precision.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use vault_core::{
  Column, ColumnType, HashKey, Value,
  value::{TIMESTAMP_FORMAT, truncate_chars},
};

pub fn encode_key(key: HashKey) -> SqlValue { SqlValue::Blob(key.as_bytes().to_vec()) }

pub fn decode_key(bytes: &[u8]) -> Option<HashKey> { HashKey::from_slice(bytes) }

pub fn encode_load_date(at: DateTime<Utc>) -> SqlValue { SqlValue::Text(at.to_rfc3339()) }

/// Trimmed and cut to the column's declared maximum, if any.
pub fn encode_text(column: &Column, s: &str) -> SqlValue {
  let s = s.trim();
  SqlValue::Text(match column.max_len() {
    Some(max) => truncate_chars(s, max),
    None => s.to_owned(),
  })
}

/// Coerce an attribute to its column type. `None` means the column is left
/// out of the insert.
pub fn encode_attribute(
  column: &Column,
  value: &Value,
) -> vault_core::Result<Option<SqlValue>> {
  if value.is_null() {
    return Ok(None);
  }
  Ok(match column.ty {
    ColumnType::Integer => value.to_integer()?.map(SqlValue::Integer),
    ColumnType::Text | ColumnType::Varchar(_) => {
      value.to_text().map(|s| encode_text(column, &s))
    }
    ColumnType::Timestamp => value
      .to_timestamp()
      .map(|ts| SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string())),
    ColumnType::HashKey => value.as_key().map(encode_key),
  })
}

#[cfg(test)]
mod tests {
  use vault_core::schema::{SAT_POST, SAT_USER};

  use super::*;

  fn column(table: &'static vault_core::Table, name: &str) -> &'static Column {
    table.column(name).unwrap()
  }

  #[test]
  fn varchar_is_trimmed_and_truncated() {
    let location = column(&SAT_USER, "location");
    let long = format!("  {}  ", "x".repeat(150));
    assert_eq!(
      encode_attribute(location, &Value::from(long)).unwrap(),
      Some(SqlValue::Text("x".repeat(100)))
    );
  }

  #[test]
  fn integers_accept_numeric_text() {
    let score = column(&SAT_POST, "score");
    assert_eq!(
      encode_attribute(score, &Value::from("7.0")).unwrap(),
      Some(SqlValue::Integer(7))
    );
    assert_eq!(encode_attribute(score, &Value::from("")).unwrap(), None);
    assert!(encode_attribute(score, &Value::from("lots")).is_err());
  }

  #[test]
  fn unparseable_timestamps_are_omitted() {
    let created = column(&SAT_POST, "creationdate");
    assert_eq!(encode_attribute(created, &Value::from("soon")).unwrap(), None);
    assert_eq!(
      encode_attribute(created, &Value::from("2011-01-02 03:04:05")).unwrap(),
      Some(SqlValue::Text("2011-01-02T03:04:05.000".to_owned()))
    );
  }

  #[test]
  fn nulls_are_omitted() {
    let body = column(&SAT_POST, "body");
    assert_eq!(encode_attribute(body, &Value::Null).unwrap(), None);
  }

  #[test]
  fn key_blob_round_trips() {
    let key = HashKey::of(99);
    let SqlValue::Blob(bytes) = encode_key(key) else { panic!("expected blob") };
    assert_eq!(decode_key(&bytes), Some(key));
  }
}
