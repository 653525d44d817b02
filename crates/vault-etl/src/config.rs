//! Loader configuration.
//!
//! Deserialized by the `vault-load` binary from an optional TOML file layered
//! under `VAULT_*` environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
  /// Directory holding `users.csv`, `posts.csv`, and the other dump files.
  pub csv_dir:       PathBuf,
  pub database_path: PathBuf,
  /// Drop and recreate the schema before loading.
  #[serde(default = "default_provision")]
  pub provision:     bool,
}

fn default_provision() -> bool { true }

impl LoaderConfig {
  /// Reject configurations that would fail only after tables were touched.
  pub fn validate(&self) -> Result<()> {
    if !self.csv_dir.is_dir() {
      return Err(Error::MissingCsvDir(self.csv_dir.clone()));
    }
    Ok(())
  }
}
