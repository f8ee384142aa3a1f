//! SHA-256 hashing for content addressing and record uids.

use sha2::{Digest, Sha256};

use crate::{CyaneaError, Result};

/// Calculate the SHA-256 hash of in-memory data.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Derive a short, stable uid from a namespace and a key.
///
/// The uid is the first `len` hex characters of `SHA-256(namespace || 0x00 || key)`.
/// `len` must be between 1 and 64.
pub fn short_uid(namespace: &str, key: &str, len: usize) -> Result<String> {
    if len == 0 || len > 64 {
        return Err(CyaneaError::InvalidInput(format!(
            "uid length must be in 1..=64, got {len}"
        )));
    }
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(len);
    Ok(digest)
}
