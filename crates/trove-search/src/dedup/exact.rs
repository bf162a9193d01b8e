//! Exact-duplicate tier: content-hash bucketing.
//!
//! Two documents are exact duplicates when their normalized content hashes
//! to the same value. Normalization is deliberately light: trim, collapse
//! whitespace runs, and lowercase the title. Body case is preserved, so a
//! retyped body with different capitalization is a near-duplicate question,
//! not an exact one.

use crate::dedup::{DuplicateGroup, DuplicateKind};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use trove_core::model::Document;

/// Length of the hash prefix carried on exact groups, enough to eyeball a
/// bucket without printing the full digest.
const HASH_PREFIX_LEN: usize = 12;

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized SHA-256 content hash, as lowercase hex.
#[must_use]
pub fn content_hash(doc: &Document) -> String {
    let title = collapse_whitespace(&doc.title).to_lowercase();
    let body = collapse_whitespace(&doc.body);

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Bucket `documents` by content hash and return every bucket with two or
/// more members as an exact-duplicate group.
///
/// Group members are sorted and de-duplicated by id, so the result is
/// independent of input order.
#[must_use]
pub fn detect_exact(documents: &[Document]) -> Vec<DuplicateGroup> {
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for doc in documents {
        buckets
            .entry(content_hash(doc))
            .or_default()
            .push(doc.id.clone());
    }

    buckets
        .into_iter()
        .filter_map(|(hash, mut members)| {
            members.sort();
            members.dedup();
            if members.len() < 2 {
                return None;
            }
            Some(DuplicateGroup {
                kind: DuplicateKind::Exact,
                count: members.len(),
                members,
                hash_prefix: Some(hash.chars().take(HASH_PREFIX_LEN).collect()),
                avg_similarity: None,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
