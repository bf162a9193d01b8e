//! Near-duplicate tier: embedding similarity and connected components.
//!
//! Every document gets an embedding (served from the vector index when one
//! is cached, computed and cached back otherwise), all pairs are compared
//! by cosine similarity, and pairs at or above the threshold become edges
//! in a similarity graph. Each connected component of two or more
//! documents is one near-duplicate group, so similarity is transitive at
//! the group level even when the end members of a chain fall below the
//! threshold pairwise.

use crate::dedup::{DuplicateGroup, DuplicateKind};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};
use trove_core::backend::{cosine_similarity, EmbeddingService, VectorIndex};
use trove_core::error::DetectError;
use trove_core::model::{DocSnapshot, Document};

/// Outcome of one near-duplicate pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NearDuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    /// Documents skipped because no usable embedding could be obtained.
    pub failed: usize,
}

/// Detect near-duplicate groups among `documents` at `threshold`.
///
/// Documents whose ids appear in `exclude` are skipped, as are repeated
/// ids. Embedding failures skip the affected document and are tallied in
/// the report; the only hard error is a threshold outside `[0, 1]`.
pub fn detect_near(
    documents: &[Document],
    threshold: f32,
    exclude: &HashSet<String>,
    embedder: &dyn EmbeddingService,
    index: &dyn VectorIndex,
) -> Result<NearDuplicateReport, DetectError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DetectError::ThresholdOutOfRange(threshold));
    }

    let mut failed = 0usize;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ids: Vec<&str> = Vec::new();
    let mut vectors: Vec<Vec<f32>> = Vec::new();

    for doc in documents {
        if exclude.contains(&doc.id) || !seen.insert(&doc.id) {
            continue;
        }
        match cached_embedding(doc, embedder, index) {
            Some(vector) => {
                ids.push(&doc.id);
                vectors.push(vector);
            }
            None => failed += 1,
        }
    }

    let n = ids.len();
    let mut union_find: UnionFind<usize> = UnionFind::new(n);
    let mut edges: Vec<(usize, usize, f32)> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(similarity) = cosine_similarity(&vectors[i], &vectors[j])
                && similarity >= threshold
            {
                union_find.union(i, j);
                edges.push((i, j, similarity));
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        components.entry(union_find.find_mut(i)).or_default().push(i);
    }

    let mut groups = Vec::new();
    for (root, indices) in components {
        if indices.len() < 2 {
            continue;
        }
        let mut members: Vec<String> = indices.iter().map(|&i| ids[i].to_string()).collect();
        members.sort();

        // Average over the above-threshold edges inside this component
        // only; sub-threshold chained pairs do not dilute it.
        let component_edges: Vec<f32> = edges
            .iter()
            .filter(|(i, _, _)| union_find.find_mut(*i) == root)
            .map(|(_, _, similarity)| *similarity)
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let avg_similarity =
            component_edges.iter().sum::<f32>() / component_edges.len().max(1) as f32;

        groups.push(DuplicateGroup {
            kind: DuplicateKind::Semantic,
            count: members.len(),
            members,
            hash_prefix: None,
            avg_similarity: Some(avg_similarity),
        });
    }

    Ok(NearDuplicateReport { groups, failed })
}

/// Embedding for one document, served from the index cache when present.
///
/// A cache miss encodes `"{title} {body}"` and writes the vector back with
/// the document's snapshot as payload. Any failure (backend error, wrong
/// dimension) yields `None`.
fn cached_embedding(
    doc: &Document,
    embedder: &dyn EmbeddingService,
    index: &dyn VectorIndex,
) -> Option<Vec<f32>> {
    match index.get(&doc.id) {
        Ok(Some(stored)) if stored.vector.len() == embedder.dim() => {
            return Some(stored.vector);
        }
        Ok(Some(stored)) => {
            debug!(
                "cached vector for {} has dimension {}, expected {}; re-encoding",
                doc.id,
                stored.vector.len(),
                embedder.dim()
            );
        }
        Ok(None) => {}
        Err(err) => {
            debug!("vector cache lookup failed for {}: {err}", doc.id);
        }
    }

    let text = format!("{} {}", doc.title, doc.body);
    let vector = match embedder.encode(text.trim()) {
        Ok(vector) => vector,
        Err(err) => {
            warn!("embedding failed for {}: {err}", doc.id);
            return None;
        }
    };
    if vector.len() != embedder.dim() {
        warn!(
            "embedding for {} has dimension {}, expected {}",
            doc.id,
            vector.len(),
            embedder.dim()
        );
        return None;
    }

    if let Err(err) = index.upsert(&doc.id, &vector, Some(DocSnapshot::from_document(doc))) {
        debug!("vector cache write failed for {}: {err}", doc.id);
    }
    Some(vector)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
