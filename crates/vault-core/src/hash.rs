//! Deterministic surrogate keys.
//!
//! A hash key is the SHA-256 digest of a business key's canonical string form
//! (its `Display` output). Link keys hash the participating business keys
//! joined with `_`, in the order the link table names its participants.
//! Tables written by earlier runs stay joinable only while this derivation is
//! unchanged.

use std::fmt;

use sha2::{Digest, Sha256};

/// Length of every hash key, in bytes.
pub const HASH_KEY_LEN: usize = 32;

const COMPOSITE_SEPARATOR: &str = "_";

/// A 32-byte SHA-256 digest used as a hub, link, or satellite key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashKey([u8; HASH_KEY_LEN]);

impl HashKey {
  /// Hash the canonical string form of `value`.
  pub fn of(value: impl fmt::Display) -> Self {
    Self::digest(value.to_string().as_bytes())
  }

  /// `None` stays `None`: a missing business key means "no relationship",
  /// never a shared default key.
  pub fn of_opt<T: fmt::Display>(value: Option<T>) -> Option<Self> {
    value.map(Self::of)
  }

  /// Hash `parts` joined with `_`, in the given order.
  pub fn composite<T: fmt::Display>(parts: &[T]) -> Self {
    let joined = parts
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(COMPOSITE_SEPARATOR);
    Self::digest(joined.as_bytes())
  }

  /// Hash raw bytes.
  pub fn digest(bytes: &[u8]) -> Self { Self(Sha256::digest(bytes).into()) }

  /// Rebuild a key from a stored 32-byte blob.
  pub fn from_slice(bytes: &[u8]) -> Option<Self> {
    <[u8; HASH_KEY_LEN]>::try_from(bytes).ok().map(Self)
  }

  pub fn as_bytes(&self) -> &[u8; HASH_KEY_LEN] { &self.0 }

  pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl fmt::Display for HashKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

impl fmt::Debug for HashKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "HashKey({})", self.to_hex())
  }
}
