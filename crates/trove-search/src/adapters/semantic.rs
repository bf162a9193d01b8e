//! Dense retrieval over the injected embedding service and vector index.

use crate::adapters::{SearchHit, SearchSource};
use tracing::warn;
use trove_core::backend::{EmbeddingService, SearchFilters, VectorIndex};

/// Default oversampling factor: the index is asked for `limit × K`
/// neighbours so later pipeline stages (aggregation, diversity capping)
/// still have enough candidates after folding.
pub const DEFAULT_OVERSAMPLE: usize = 2;

/// Adapter from the vector index's hit shape to rank-ordered [`SearchHit`]s.
///
/// Failure policy: if the embedding service or the index is unreachable, or
/// the query embedding comes back with the wrong dimension, the adapter
/// returns an empty list. It never raises, so keyword retrieval proceeds
/// unaffected.
pub struct SemanticSearchAdapter<'a> {
    embedder: &'a dyn EmbeddingService,
    index: &'a dyn VectorIndex,
    oversample: usize,
}

impl<'a> SemanticSearchAdapter<'a> {
    #[must_use]
    pub const fn new(embedder: &'a dyn EmbeddingService, index: &'a dyn VectorIndex) -> Self {
        Self {
            embedder,
            index,
            oversample: DEFAULT_OVERSAMPLE,
        }
    }

    /// Override the oversampling factor (raised to 4 by the pipeline when
    /// chunk aggregation is active).
    #[must_use]
    pub const fn with_oversample(mut self, factor: usize) -> Self {
        self.oversample = factor;
        self
    }

    /// Encode the query and return the top `limit × oversample` neighbours,
    /// ranked by the index's return order with cosine-derived scores
    /// clamped to `[0, 1]`.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize, filters: &SearchFilters) -> Vec<SearchHit> {
        if limit == 0 {
            return Vec::new();
        }

        let vector = match self.embedder.encode(query) {
            Ok(vector) => vector,
            Err(err) => {
                warn!("semantic search degraded to empty: {err}");
                return Vec::new();
            }
        };
        if vector.len() != self.embedder.dim() {
            warn!(
                "semantic search degraded to empty: query embedding dimension {} != {}",
                vector.len(),
                self.embedder.dim()
            );
            return Vec::new();
        }

        let fetch = limit.saturating_mul(self.oversample.max(1));
        let hits = match self.index.search(&vector, fetch, filters) {
            Ok(hits) => hits,
            Err(err) => {
                warn!("semantic search degraded to empty: {err}");
                return Vec::new();
            }
        };

        hits.into_iter()
            .enumerate()
            .map(|(idx, hit)| SearchHit {
                doc_id: hit.id,
                rank: idx + 1,
                score: hit.score.clamp(0.0, 1.0),
                source: SearchSource::Semantic,
                payload: hit.payload,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use trove_core::backend::{MemoryEmbedder, MemoryVectorIndex};
    use trove_core::model::{DocSnapshot, SourceType};

    fn snap(quality: f32) -> DocSnapshot {
        DocSnapshot {
            source_type: SourceType::Note,
            title: "t".into(),
            excerpt: None,
            quality_score: Some(quality),
        }
    }

    fn seed(embedder: &MemoryEmbedder) -> MemoryVectorIndex {
        let index = MemoryVectorIndex::new();
        for (id, text) in [
            ("n1", "water damage in the basement"),
            ("n2", "water intrusion near the window"),
            ("n3", "birthday party invitations"),
        ] {
            let vector = embedder.encode(text).expect("encode");
            index.upsert(id, &vector, Some(snap(1.0))).expect("upsert");
        }
        index
    }

    #[test]
    fn hits_are_ranked_by_index_order() {
        let embedder = MemoryEmbedder::default();
        let index = seed(&embedder);
        let adapter = SemanticSearchAdapter::new(&embedder, &index);

        let hits = adapter.search("water in the basement", 3, &SearchFilters::default());
        assert!(!hits.is_empty());
        for (idx, hit) in hits.iter().enumerate() {
            assert_eq!(hit.rank, idx + 1);
            assert_eq!(hit.source, SearchSource::Semantic);
            assert!((0.0..=1.0).contains(&hit.score));
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn oversampling_widens_the_fetch() {
        let embedder = MemoryEmbedder::default();
        let index = seed(&embedder);
        let adapter = SemanticSearchAdapter::new(&embedder, &index).with_oversample(4);

        // limit 1 × oversample 4 covers the whole 3-doc corpus.
        let hits = adapter.search("water", 1, &SearchFilters::default());
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn unreachable_index_degrades_to_empty() {
        let embedder = MemoryEmbedder::default();
        let index = seed(&embedder);
        index.set_unavailable(true);
        let adapter = SemanticSearchAdapter::new(&embedder, &index);
        assert!(adapter.search("water", 3, &SearchFilters::default()).is_empty());
    }

    #[test]
    fn failing_embedder_degrades_to_empty() {
        let embedder = MemoryEmbedder::default();
        let index = seed(&embedder);
        embedder.fail_when_contains("water");
        let adapter = SemanticSearchAdapter::new(&embedder, &index);
        assert!(adapter.search("water", 3, &SearchFilters::default()).is_empty());
    }

    #[test]
    fn min_quality_filter_is_pushed_down() {
        let embedder = MemoryEmbedder::default();
        let index = MemoryVectorIndex::new();
        let v = embedder.encode("water").expect("encode");
        index.upsert("good", &v, Some(snap(0.9))).expect("upsert");
        index.upsert("bad", &v, Some(snap(0.2))).expect("upsert");

        let adapter = SemanticSearchAdapter::new(&embedder, &index);
        let filters = SearchFilters {
            min_quality: Some(0.5),
            ..SearchFilters::default()
        };
        let hits = adapter.search("water", 10, &filters);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "good");
    }

    #[test]
    fn zero_limit_returns_empty() {
        let embedder = MemoryEmbedder::default();
        let index = seed(&embedder);
        let adapter = SemanticSearchAdapter::new(&embedder, &index);
        assert!(adapter.search("water", 0, &SearchFilters::default()).is_empty());
    }
}
