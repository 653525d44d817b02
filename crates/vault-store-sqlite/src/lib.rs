//! SQLite backend for the data vault.
//!
//! Provisions the hub/link/satellite tables from the `vault-core` catalog,
//! registers a `sha256` SQL function with the same derivation as
//! [`HashKey::of`](vault_core::HashKey::of), and implements
//! [`VaultStore`](vault_core::VaultStore) with one transaction per table load.

mod encode;
mod functions;
mod loader;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteVault;

#[cfg(test)]
mod tests;
