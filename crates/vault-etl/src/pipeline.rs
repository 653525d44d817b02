//! The full-reload pipeline.
//!
//! `Truncate → LoadTags → LoadUsers → LoadPosts → LoadComments → LoadBadges →
//! LoadVotes → LoadPostLinks → VerifyCounts → Done`. A stage runs only after
//! the previous one succeeded; the first failure ends the run.

use std::{collections::BTreeMap, path::PathBuf, time::Instant};

use serde::Serialize;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;
use vault_core::{CATALOG, TruncateOutcome, VaultStore};

use crate::{LinkStats, PipelineContext, Result, entities};

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Truncate,
  LoadTags,
  LoadUsers,
  LoadPosts,
  LoadComments,
  LoadBadges,
  LoadVotes,
  LoadPostLinks,
  VerifyCounts,
  Done,
}

impl Stage {
  pub fn next(self) -> Option<Self> {
    Some(match self {
      Self::Truncate => Self::LoadTags,
      Self::LoadTags => Self::LoadUsers,
      Self::LoadUsers => Self::LoadPosts,
      Self::LoadPosts => Self::LoadComments,
      Self::LoadComments => Self::LoadBadges,
      Self::LoadBadges => Self::LoadVotes,
      Self::LoadVotes => Self::LoadPostLinks,
      Self::LoadPostLinks => Self::VerifyCounts,
      Self::VerifyCounts => Self::Done,
      Self::Done => return None,
    })
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Truncate => "truncate",
      Self::LoadTags => "load_tags",
      Self::LoadUsers => "load_users",
      Self::LoadPosts => "load_posts",
      Self::LoadComments => "load_comments",
      Self::LoadBadges => "load_badges",
      Self::LoadVotes => "load_votes",
      Self::LoadPostLinks => "load_post_links",
      Self::VerifyCounts => "verify_counts",
      Self::Done => "done",
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TruncatedTable {
  pub table:   &'static str,
  #[serde(flatten)]
  pub outcome: TruncateOutcome,
}

/// What one run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  pub run_id:    Uuid,
  pub truncated: Vec<TruncatedTable>,
  /// Rows inserted per table.
  pub loaded:    BTreeMap<&'static str, usize>,
  pub links:     Vec<LinkStats>,
  /// Row counts observed after loading.
  pub counts:    BTreeMap<&'static str, u64>,
  pub elapsed:   std::time::Duration,
}

impl PipelineReport {
  pub fn new(run_id: Uuid) -> Self {
    Self {
      run_id,
      truncated: Vec::new(),
      loaded: BTreeMap::new(),
      links: Vec::new(),
      counts: BTreeMap::new(),
      elapsed: std::time::Duration::ZERO,
    }
  }

  pub fn loaded(&self, table: &str) -> Option<usize> { self.loaded.get(table).copied() }

  pub fn link(&self, table: &str) -> Option<&LinkStats> {
    self.links.iter().find(|s| s.table == table)
  }

  pub fn count(&self, table: &str) -> Option<u64> { self.counts.get(table).copied() }

  pub(crate) fn record_load(&mut self, table: &'static str, rows: usize) {
    *self.loaded.entry(table).or_default() += rows;
  }

  pub(crate) fn record_truncate(&mut self, table: &'static str, outcome: TruncateOutcome) {
    self.truncated.push(TruncatedTable { table, outcome });
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// A completed run: its report and the store, still open.
pub struct PipelineOutcome<S> {
  pub report: PipelineReport,
  pub store:  S,
}

pub struct Pipeline<S> {
  ctx: PipelineContext<S>,
}

impl<S: VaultStore> Pipeline<S> {
  pub fn new(store: S, csv_dir: impl Into<PathBuf>) -> Self {
    Self { ctx: PipelineContext::new(store, csv_dir) }
  }

  /// Run every stage in order. On failure the store is dropped, closing its
  /// connection, and the error is returned.
  pub fn run(mut self) -> Result<PipelineOutcome<S>> {
    let span = info_span!("pipeline", run_id = %self.ctx.run_id());
    let _entered = span.enter();
    let started = Instant::now();
    info!(csv_dir = %self.ctx.csv_dir().display(), "starting pipeline");

    let mut stage = Stage::Truncate;
    loop {
      info!(stage = stage.name(), "stage started");
      if let Err(err) = self.step(stage) {
        error!(stage = stage.name(), error = %err, "pipeline failed, closing store");
        return Err(err);
      }
      match stage.next() {
        Some(next) => stage = next,
        None => break,
      }
    }

    let (store, mut report) = self.ctx.into_parts();
    report.elapsed = started.elapsed();
    info!(elapsed_ms = report.elapsed.as_millis() as u64, "all ETL stages completed");
    Ok(PipelineOutcome { report, store })
  }

  fn step(&mut self, stage: Stage) -> Result<()> {
    let ctx = &mut self.ctx;
    match stage {
      Stage::Truncate => truncate_all(ctx),
      Stage::LoadTags => entities::load_tags(ctx),
      Stage::LoadUsers => entities::load_users(ctx),
      Stage::LoadPosts => entities::load_posts(ctx),
      Stage::LoadComments => entities::load_comments(ctx),
      Stage::LoadBadges => entities::load_badges(ctx),
      Stage::LoadVotes => entities::load_votes(ctx),
      Stage::LoadPostLinks => entities::load_post_links(ctx),
      Stage::VerifyCounts => {
        verify_counts(ctx);
        Ok(())
      }
      Stage::Done => Ok(()),
    }
  }
}

/// Empty every catalog table, dependents first. Missing tables are skipped.
fn truncate_all<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  for table in CATALOG.iter().rev() {
    match ctx.truncate(table)? {
      TruncateOutcome::Emptied { rows_removed } => {
        info!(table = table.name, rows_removed, "truncated table");
      }
      TruncateOutcome::Missing => {
        warn!(table = table.name, "table does not exist, skipping");
      }
    }
  }
  Ok(())
}

/// Log every table's row count. Never fails the run.
fn verify_counts<S: VaultStore>(ctx: &mut PipelineContext<S>) {
  for table in CATALOG {
    match ctx.count(table) {
      Ok(rows) => info!(table = table.name, rows, "row count"),
      Err(err) => warn!(table = table.name, error = %err, "row count failed"),
    }
  }
}
