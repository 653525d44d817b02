//! Loader input: loosely typed cells keyed by column name.
//!
//! CSV cells arrive as text; the target column's declared type decides how a
//! value is coerced when a row is written (see [`Value::to_integer`],
//! [`Value::to_text`], [`Value::to_timestamp`]).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{Error, HashKey, Result};

/// One input row, keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Timestamp(NaiveDateTime),
  Key(HashKey),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_key(&self) -> Option<HashKey> {
    match self {
      Self::Key(key) => Some(*key),
      _ => None,
    }
  }

  /// Integer view of the cell. Reals are truncated and numeric text is parsed;
  /// `Null` and blank text are `None`.
  pub fn to_integer(&self) -> Result<Option<i64>> {
    match self {
      Self::Null => Ok(None),
      Self::Integer(i) => Ok(Some(*i)),
      Self::Real(f) => real_to_integer(*f)
        .map(Some)
        .ok_or_else(|| Error::NotAnInteger(f.to_string())),
      Self::Text(s) => parse_integer(s),
      Self::Timestamp(ts) => Err(Error::NotAnInteger(ts.to_string())),
      Self::Key(key) => Err(Error::NotAnInteger(key.to_hex())),
    }
  }

  /// Text view of the cell; `None` for `Null`.
  pub fn to_text(&self) -> Option<String> {
    match self {
      Self::Null => None,
      Self::Integer(i) => Some(i.to_string()),
      Self::Real(f) => Some(f.to_string()),
      Self::Text(s) => Some(s.clone()),
      Self::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
      Self::Key(key) => Some(key.to_hex()),
    }
  }

  /// Timestamp view of the cell. Unparseable text is `None` and does not
  /// fail the row.
  pub fn to_timestamp(&self) -> Option<NaiveDateTime> {
    match self {
      Self::Timestamp(ts) => Some(*ts),
      Self::Text(s) => parse_timestamp(s),
      _ => None,
    }
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self { Self::Integer(value) }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}

impl From<String> for Value {
  fn from(value: String) -> Self { Self::Text(value) }
}

impl From<HashKey> for Value {
  fn from(value: HashKey) -> Self { Self::Key(value) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(value: Option<T>) -> Self { value.map_or(Self::Null, Into::into) }
}

/// Format used when a timestamp attribute is written as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the date formats found in Stack Exchange dumps.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  DATETIME_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
    .or_else(|| {
      NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Parse an integer cell, accepting float renderings such as `"12.0"`.
pub fn parse_integer(s: &str) -> Result<Option<i64>> {
  let s = s.trim();
  if s.is_empty() {
    return Ok(None);
  }
  if let Ok(i) = s.parse::<i64>() {
    return Ok(Some(i));
  }
  s.parse::<f64>()
    .ok()
    .and_then(real_to_integer)
    .map(Some)
    .ok_or_else(|| Error::NotAnInteger(s.to_owned()))
}

/// Truncate `f` toward zero, or `None` when the result does not fit in `i64`.
/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn real_to_integer(f: f64) -> Option<i64> {
  let t = f.trunc();
  (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Keep at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String { s.chars().take(max).collect() }
