//! Per-run state shared by every ETL step.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use tracing::{info, warn};
use uuid::Uuid;
use vault_core::{Entity, Row, Table, TruncateOutcome, VaultStore};

use crate::{
  Error, Frame, PipelineReport, Result,
  relation::{Candidate, Relation, link_rows},
};

/// Owns the store handle, the input directory, and the report for one
/// pipeline run. Independent runs share nothing.
pub struct PipelineContext<S> {
  store:   S,
  csv_dir: PathBuf,
  run_id:  Uuid,
  report:  PipelineReport,
}

impl<S: VaultStore> PipelineContext<S> {
  pub fn new(store: S, csv_dir: impl Into<PathBuf>) -> Self {
    let run_id = Uuid::new_v4();
    Self {
      store,
      csv_dir: csv_dir.into(),
      run_id,
      report: PipelineReport::new(run_id),
    }
  }

  pub fn run_id(&self) -> Uuid { self.run_id }

  pub fn csv_dir(&self) -> &Path { &self.csv_dir }

  pub fn into_parts(self) -> (S, PipelineReport) { (self.store, self.report) }

  // ── Input ─────────────────────────────────────────────────────────────

  /// Read `file` from the input directory.
  pub fn read(&self, file: &str) -> Result<Frame> {
    let frame = Frame::read(&self.csv_dir.join(file))?;
    info!(file, rows = frame.len(), "read input file");
    Ok(frame)
  }

  /// Business keys present in `entity`'s own file. Read fresh on every call
  /// so each relationship is checked against the file itself.
  pub fn valid_ids(&self, entity: Entity) -> Result<HashSet<i64>> {
    self.read(entity.source_file())?.ids()
  }

  // ── Store ─────────────────────────────────────────────────────────────

  pub fn load(
    &mut self,
    table: &'static Table,
    rows: &[Row],
    business_key: &str,
    source: &str,
  ) -> Result<usize> {
    let loaded = self
      .store
      .load(table, rows, business_key, source)
      .map_err(Error::store)?;
    self.report.record_load(table.name, loaded);
    Ok(loaded)
  }

  /// Resolve `candidates` under `relation` and load the surviving links.
  pub fn load_link(
    &mut self,
    relation: Relation<'_>,
    candidates: impl IntoIterator<Item = Candidate>,
    source: &str,
  ) -> Result<usize> {
    let (pairs, stats) = relation.resolve(candidates);
    self.report.links.push(stats);
    if pairs.is_empty() {
      warn!(table = relation.table.name, "no valid relationships to load");
    }
    let rows = link_rows(relation.table, &pairs);
    self.load(relation.table, &rows, "", source)
  }

  pub fn truncate(&mut self, table: &'static Table) -> Result<TruncateOutcome> {
    let outcome = self.store.truncate(table).map_err(Error::store)?;
    self.report.record_truncate(table.name, outcome);
    Ok(outcome)
  }

  /// Count `table`'s rows and record the result.
  pub fn count(&mut self, table: &'static Table) -> Result<u64> {
    let rows = self.store.count_rows(table).map_err(Error::store)?;
    self.report.counts.insert(table.name, rows);
    Ok(rows)
  }
}
