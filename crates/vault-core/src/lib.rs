//! Core types for the Stack Exchange data vault.
//!
//! Hash-key derivation, the declarative hub/link/satellite catalog, loader
//! input rows, and the [`VaultStore`](store::VaultStore) seam that storage
//! backends implement. Nothing here touches a database or HTTP.

pub mod entity;
pub mod error;
pub mod hash;
pub mod schema;
pub mod store;
pub mod value;

pub use entity::Entity;
pub use error::{Error, Result};
pub use hash::HashKey;
pub use schema::{Column, ColumnRole, ColumnType, Table, TableKind, CATALOG};
pub use store::{TruncateOutcome, VaultStore};
pub use value::{Row, Value};
