//! JSON analytics API over a loaded data vault.
//!
//! Exposes an axum [`Router`] backed by a read-only [`Analytics`] handle.
//! Every endpoint answers `GET` with a JSON body; failures carry
//! `{"error": "..."}`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/analytics", vault_api::analytics_router(Arc::new(analytics)))
//! ```

pub mod analytics;
pub mod error;
pub mod limit;
pub mod overview;
pub mod tags;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;

pub use analytics::Analytics;
pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `vault.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  pub database_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the analytics router for `analytics`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn analytics_router(analytics: Arc<Analytics>) -> Router<()> {
  Router::new()
    .route("/summary", get(overview::summary))
    // Tags
    .route("/tags/popular", get(tags::popular))
    .route("/tags/inactive", get(tags::inactive))
    .route("/tags/engagement", get(tags::engagement))
    // Users
    .route("/users/activity", get(users::activity))
    .route("/users/fastest-commenters", get(users::fastest_commenters))
    .route("/users/longest-comments", get(users::longest_comments))
    // Posts
    .route("/posts/views-per-question", get(overview::views_per_question))
    .route("/posts/views-per-answer", get(overview::views_per_answer))
    .route("/ratios/comments-to-score", get(overview::comments_to_score))
    .with_state(analytics)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn server_config_defaults_host_and_port() {
    let cfg: ServerConfig =
      serde_json::from_str(r#"{ "database_path": "vault.db" }"#).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.database_path, PathBuf::from("vault.db"));
  }
}
