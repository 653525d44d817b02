//! SQL functions registered on every store connection.

use rusqlite::{Connection, functions::FunctionFlags, types::ValueRef};
use vault_core::HashKey;

/// Register `sha256(x)`.
///
/// `NULL` maps to `NULL`. Integers are hashed by their decimal rendering,
/// reals by SQLite's own text form (`1.0` stays `"1.0"`), and text or blobs
/// by their bytes. So `sha256(x) = sha256(CAST(x AS TEXT))` for any value, and
/// `sha256(k)` equals `HashKey::of(k)` for any integer or text business key.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "sha256",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let key = match ctx.get_raw(0) {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(HashKey::of(i)),
        ValueRef::Real(f) => Some(HashKey::of(real_text(f))),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(HashKey::digest(bytes)),
      };
      Ok(key.map(|k| k.as_bytes().to_vec()))
    },
  )
}

/// Render a real as SQLite's `CAST(x AS TEXT)` does: 15 significant digits,
/// exponent form outside `1e-4..1e15`, and always a decimal point.
fn real_text(f: f64) -> String {
  if f.is_infinite() {
    return if f > 0.0 { "Inf" } else { "-Inf" }.to_owned();
  }
  let sci = format!("{f:.14e}");
  let Some((mantissa, exp)) = sci.split_once('e') else { return f.to_string() };
  let exp: i32 = exp.parse().unwrap_or_default();
  if (-4..15).contains(&exp) {
    let decimals = (14 - exp) as usize;
    with_point(&format!("{f:.decimals$}"))
  } else {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{sign}{:02}", with_point(mantissa), exp.abs())
  }
}

/// Drop trailing fractional zeros, keeping at least one digit after the point.
fn with_point(digits: &str) -> String {
  let trimmed = digits.trim_end_matches('0');
  if trimmed.ends_with('.') { format!("{trimmed}0") } else { trimmed.to_owned() }
}
