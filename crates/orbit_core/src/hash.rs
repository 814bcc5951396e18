//! Canonical-JSON + SHA-256 hashing, shared by the route matrix's
//! rebuild-on-change check and inventory's stack-key derivation.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serializes `value` with sorted map keys (via `serde_json`'s default
/// `BTreeMap`-friendly ordering for structs) and returns its SHA-256 hex
/// digest. Two values that serialize to the same bytes hash identically
/// regardless of field-insertion order, which is the only property either
/// caller relies on.
#[must_use]
pub fn canonical_hash<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_values_hash_identically() {
        let a = vec![1, 2, 3];
        let b = vec![1, 2, 3];
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn different_values_hash_differently() {
        assert_ne!(canonical_hash(&vec![1, 2, 3]), canonical_hash(&vec![1, 2, 4]));
    }
}
