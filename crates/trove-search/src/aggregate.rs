//! Folding of chunk-level hits into parent-document results.
//!
//! Long documents are indexed as chunks with ids of the form
//! `{parent}:{index}`. When several chunks of one document surface in a
//! result list, showing them all crowds out other documents; this stage
//! replaces each chunk group with a single result for the parent, carrying
//! the best chunk's score and the top chunks as evidence.

use crate::fusion::scoring::{ChunkEvidence, FusedResult};
use std::collections::BTreeMap;
use trove_core::model::{ChunkRef, SourceType};

/// Fold chunk results into per-parent results, keeping up to `keep` chunks
/// per parent as evidence.
///
/// A result counts as a chunk only when its payload says so; an id that
/// merely looks like `{parent}:{index}` is left alone. The aggregated
/// result takes the best chunk's score, ranks, and payload, so a parent
/// never outranks the evidence it stands on. Output is re-sorted best
/// first with `doc_id` tie-breaks.
#[must_use]
pub fn aggregate_chunks(results: Vec<FusedResult>, keep: usize) -> Vec<FusedResult> {
    let mut passthrough: Vec<FusedResult> = Vec::new();
    let mut groups: BTreeMap<String, Vec<FusedResult>> = BTreeMap::new();

    for result in results {
        let is_chunk = result
            .payload
            .as_ref()
            .is_some_and(|p| p.source_type == SourceType::DocumentChunk);
        if is_chunk {
            let parent = ChunkRef::parse(&result.doc_id).parent_id;
            groups.entry(parent).or_default().push(result);
        } else {
            passthrough.push(result);
        }
    }

    let mut folded: Vec<FusedResult> = passthrough;
    for (parent_id, mut group) in groups {
        group.sort_by(|a, b| {
            b.rrf_score
                .partial_cmp(&a.rrf_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        let top_chunks: Vec<ChunkEvidence> = group
            .iter()
            .take(keep)
            .map(|chunk| ChunkEvidence {
                chunk_id: chunk.doc_id.clone(),
                score: chunk.rrf_score,
            })
            .collect();

        let count = group.len();
        if let Some(best) = group.into_iter().next() {
            folded.push(FusedResult {
                doc_id: parent_id,
                rrf_score: best.rrf_score,
                keyword_rank: best.keyword_rank,
                semantic_rank: best.semantic_rank,
                payload: best.payload,
                chunk_count: Some(count),
                top_chunks,
            });
        }
    }

    folded.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    folded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
