//! Relationship resolution.
//!
//! A candidate relationship is a pair of business keys in the target link's
//! participant order. Pairs with a missing or zero key, or with a key absent
//! from the referenced entity's valid-id set, never reach the loader.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;
use vault_core::{HashKey, Row, Table, Value};

/// Candidate pair as read from the input: `(left, right)`.
pub type Candidate = (Option<i64>, Option<i64>);

/// How one relationship's candidates were filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStats {
  pub table:      &'static str,
  pub candidates: usize,
  pub kept:       usize,
  /// Missing keys and referential gaps.
  pub dropped:    usize,
  /// Repeats of an already kept pair.
  pub duplicates: usize,
}

/// Filtering rules for one link table.
#[derive(Debug, Clone, Copy)]
pub struct Relation<'a> {
  pub table:  &'static Table,
  /// Valid left keys; `None` accepts any present key.
  pub left:   Option<&'a HashSet<i64>>,
  pub right:  Option<&'a HashSet<i64>>,
  pub dedupe: bool,
}

impl<'a> Relation<'a> {
  pub fn new(table: &'static Table) -> Self {
    Self { table, left: None, right: None, dedupe: false }
  }

  pub fn left_in(self, valid: &'a HashSet<i64>) -> Self { Self { left: Some(valid), ..self } }

  pub fn right_in(self, valid: &'a HashSet<i64>) -> Self { Self { right: Some(valid), ..self } }

  pub fn deduplicated(self) -> Self { Self { dedupe: true, ..self } }

  /// Keep the pairs whose keys both resolve.
  pub fn resolve(
    &self,
    candidates: impl IntoIterator<Item = Candidate>,
  ) -> (Vec<(i64, i64)>, LinkStats) {
    let mut stats = LinkStats {
      table:      self.table.name,
      candidates: 0,
      kept:       0,
      dropped:    0,
      duplicates: 0,
    };
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for (left, right) in candidates {
      stats.candidates += 1;
      let resolved = resolves(left, self.left).zip(resolves(right, self.right));
      let Some(pair) = resolved else {
        stats.dropped += 1;
        continue;
      };
      if self.dedupe && !seen.insert(pair) {
        stats.duplicates += 1;
        continue;
      }
      pairs.push(pair);
    }
    stats.kept = pairs.len();

    info!(
      table = stats.table,
      candidates = stats.candidates,
      kept = stats.kept,
      dropped = stats.dropped,
      duplicates = stats.duplicates,
      "resolved relationships"
    );
    (pairs, stats)
  }
}

fn resolves(key: Option<i64>, valid: Option<&HashSet<i64>>) -> Option<i64> {
  let key = key.filter(|&k| k != 0)?;
  match valid {
    Some(valid) if !valid.contains(&key) => None,
    _ => Some(key),
  }
}

/// Build loader rows for `table` from resolved pairs.
///
/// The link's own key, when it has one, hashes `"{left}_{right}"`; each
/// participant column holds the hash of its business key.
pub fn link_rows(table: &'static Table, pairs: &[(i64, i64)]) -> Vec<Row> {
  let link_key = table.link_key().map(|c| c.name);
  let participants: Vec<&'static str> = table.participants().map(|c| c.name).collect();

  pairs
    .iter()
    .map(|&(left, right)| {
      let mut row = Row::new();
      if let Some(name) = link_key {
        row.insert(name.to_owned(), Value::Key(HashKey::composite(&[left, right])));
      }
      for (name, id) in participants.iter().zip([left, right]) {
        row.insert((*name).to_owned(), Value::Key(HashKey::of(id)));
      }
      row
    })
    .collect()
}
