//! Weighted Reciprocal Rank Fusion (RRF).
//!
//! For each document present in either hit list:
//!
//! ```text
//! rrf = keyword_weight  / (k + keyword_rank)     [0 if absent]
//!     + semantic_weight / (k + semantic_rank)    [0 if absent]
//! ```
//!
//! `k` is a fixed damping constant, default exactly 60. A document present
//! in both lists collects both terms, so it outranks single-list documents
//! of equal rank whenever both weights are positive. The merge is
//! commutative: swapping the lists together with their weights leaves every
//! per-document score unchanged.

use crate::adapters::SearchHit;
use crate::weights::QueryWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trove_core::model::DocSnapshot;

/// Default RRF damping constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// One fused, JSON-serializable search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub doc_id: String,
    pub rrf_score: f32,
    /// 1-based rank in the keyword list, if present there.
    pub keyword_rank: Option<usize>,
    /// 1-based rank in the semantic list, if present there.
    pub semantic_rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DocSnapshot>,
    /// Full chunk-group size when this result was produced by aggregation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    /// Top-scoring chunks retained as evidence by aggregation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_chunks: Vec<ChunkEvidence>,
}

/// One retained chunk backing an aggregated document result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEvidence {
    pub chunk_id: String,
    pub score: f32,
}

#[derive(Default)]
struct MergeEntry {
    keyword_rank: Option<usize>,
    semantic_rank: Option<usize>,
    keyword_payload: Option<DocSnapshot>,
    semantic_payload: Option<DocSnapshot>,
}

/// Merge the two hit lists with weighted RRF, best score first.
///
/// Ties break on `doc_id` so ordering is stable. When a document appears in
/// both lists, the semantic hit's payload (typically richer) wins.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rrf_merge(
    keyword_hits: &[SearchHit],
    semantic_hits: &[SearchHit],
    weights: QueryWeights,
    k: u32,
) -> Vec<FusedResult> {
    let mut entries: BTreeMap<&str, MergeEntry> = BTreeMap::new();

    for hit in keyword_hits {
        let entry = entries.entry(hit.doc_id.as_str()).or_default();
        if entry.keyword_rank.is_none() {
            entry.keyword_rank = Some(hit.rank);
            entry.keyword_payload = hit.payload.clone();
        }
    }
    for hit in semantic_hits {
        let entry = entries.entry(hit.doc_id.as_str()).or_default();
        if entry.semantic_rank.is_none() {
            entry.semantic_rank = Some(hit.rank);
            entry.semantic_payload = hit.payload.clone();
        }
    }

    let damping = k as f32;
    let mut fused: Vec<FusedResult> = entries
        .into_iter()
        .map(|(doc_id, entry)| {
            let keyword_term = entry
                .keyword_rank
                .map_or(0.0, |rank| weights.keyword / (damping + rank as f32));
            let semantic_term = entry
                .semantic_rank
                .map_or(0.0, |rank| weights.semantic / (damping + rank as f32));

            FusedResult {
                doc_id: doc_id.to_string(),
                rrf_score: keyword_term + semantic_term,
                keyword_rank: entry.keyword_rank,
                semantic_rank: entry.semantic_rank,
                payload: entry.semantic_payload.or(entry.keyword_payload),
                chunk_count: None,
                top_chunks: Vec::new(),
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    fused
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
