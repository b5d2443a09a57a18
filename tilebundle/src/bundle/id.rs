//! Deterministic bundle identity.

use sha2::{Digest, Sha256};

/// Sorts and deduplicates a requested index set.
pub fn normalize_indices(indices: &[u32]) -> Vec<u32> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Hex SHA-256 of `"{version}:{i1,i2,...}"` over normalized indices.
///
/// Any ordering or repetition of the same index set yields the same id.
pub fn bundle_id(version: &str, indices: &[u32]) -> String {
    let normalized = normalize_indices(indices);
    bundle_id_normalized(version, &normalized)
}

/// Like [`bundle_id`] for indices already sorted and deduplicated.
pub(crate) fn bundle_id_normalized(version: &str, normalized: &[u32]) -> String {
    let joined = normalized
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha256::new();
    hasher.update(version.as_bytes());
    hasher.update(b":");
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}
