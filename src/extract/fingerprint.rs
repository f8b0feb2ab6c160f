//! Stable content fingerprints.
//!
//! The fingerprint must be a pure function of semantic content: unrelated
//! re-renders of identical content hash identically, and any change to the
//! item set or availability-relevant text changes the digest.

use super::MenuItem;
use sha2::{Digest, Sha256};

/// Collapse all whitespace runs to single spaces and trim.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute the fingerprint for a snapshot.
///
/// When items were named, the digest covers the availability flag and the
/// case-folded, sorted item-name set — ordering artifacts and cosmetic page
/// text cannot perturb it. Without named items it falls back to the
/// normalized page content.
pub fn compute(available: bool, items: &[MenuItem], content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(if available { b"available\n" as &[u8] } else { b"unavailable\n" });

    if items.is_empty() {
        hasher.update(normalize_text(content).to_lowercase().as_bytes());
    } else {
        let mut names: Vec<String> = items
            .iter()
            .map(|i| normalize_text(&i.name).to_lowercase())
            .collect();
        names.sort_unstable();
        names.dedup();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(b"\n");
        }
    }

    format!("{:x}", hasher.finalize())
}
