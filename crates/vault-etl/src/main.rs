//! vault-load binary.
//!
//! Reads `vault.toml` (or the path given with `--config`) layered under
//! `VAULT_*` environment variables, provisions the SQLite vault, and runs the
//! full reload pipeline over the configured CSV directory.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vault_etl::{LoaderConfig, Pipeline};
use vault_store_sqlite::SqliteVault;

#[derive(Parser)]
#[command(author, version, about = "Load Stack Exchange CSV dumps into a data vault")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vault.toml")]
  config: PathBuf,

  /// Write the run report as JSON to this path.
  #[arg(long)]
  report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Configuration problems abort before any table is touched.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VAULT"))
    .build()
    .context("failed to read config file")?;

  let loader_cfg: LoaderConfig = settings
    .try_deserialize()
    .context("failed to deserialise LoaderConfig")?;
  loader_cfg.validate().context("invalid loader configuration")?;

  let mut vault = SqliteVault::open(&loader_cfg.database_path).with_context(|| {
    format!("failed to open database at {:?}", loader_cfg.database_path)
  })?;
  if loader_cfg.provision {
    vault.provision().context("failed to provision schema")?;
  } else {
    vault.verify().context("schema verification failed")?;
  }

  let outcome = Pipeline::new(vault, &loader_cfg.csv_dir)
    .run()
    .context("ETL pipeline failed")?;

  if let Some(path) = cli.report {
    let json = serde_json::to_string_pretty(&outcome.report)?;
    std::fs::write(&path, json)
      .with_context(|| format!("failed to write report to {path:?}"))?;
  }

  outcome.store.close().context("failed to close database")?;
  tracing::info!(run_id = %outcome.report.run_id, "ETL process completed successfully");
  Ok(())
}
