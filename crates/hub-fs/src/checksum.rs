//! SHA-512 content hashing
//!
//! The hash of a resource's source text is the only change-detection token
//! the sync engine uses. It is persisted in the manifest as 128 lowercase hex
//! characters with no prefix, so it stays comparable with manifests written
//! by earlier tooling.

use sha2::{Digest, Sha512};

/// Compute the SHA-512 hash of string content as lowercase hex.
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
