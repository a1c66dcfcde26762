//! Deterministic storage keys for identifiers.
//!
//! A shell identifier is arbitrary text (URIs with slashes, colons, ...), so
//! it is never used as a file name directly. Its SHA-256 digest, rendered as
//! 64 lowercase hex characters, is. Collisions are not detected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Filesystem-safe, fixed-length name derived from an identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageKey(pub String);

impl StorageKey {
    /// Digest of the UTF-8 bytes of `id`.
    pub fn for_id(id: &str) -> Self {
        let hash = Sha256::digest(id.as_bytes());
        Self(format!("{hash:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `name` has the shape of a storage key (64 lowercase hex chars).
    pub fn is_key_shaped(name: &str) -> bool {
        name.len() == 64 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
