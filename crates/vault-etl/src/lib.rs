//! Stack Exchange CSV dumps to data vault.
//!
//! Reads one CSV per entity, loads each entity's hub and satellite, resolves
//! cross-entity relationships against the referenced entity's own file, and
//! loads the link tables. [`Pipeline`] sequences the whole run over any
//! [`VaultStore`](vault_core::VaultStore).

pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod relation;

pub use config::LoaderConfig;
pub use context::PipelineContext;
pub use error::{Error, Result};
pub use frame::Frame;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineReport, Stage};
pub use relation::LinkStats;
