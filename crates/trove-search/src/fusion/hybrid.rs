//! Hybrid retrieval pipeline over injected collaborators.
//!
//! One `search` call runs five stages in order: query-adaptive weighting,
//! keyword and semantic retrieval, weighted RRF fusion, chunk aggregation,
//! and per-source diversity capping, followed by payload enrichment from the
//! content store. Every backend failure along the way degrades the affected
//! stage instead of failing the call.

use crate::adapters::{KeywordSearchAdapter, SemanticSearchAdapter};
use crate::aggregate::aggregate_chunks;
use crate::diversity::enforce_diversity;
use crate::fusion::scoring::{rrf_merge, FusedResult};
use crate::weights::query_weights;
use tracing::{debug, warn};
use trove_core::backend::{
    ContentStore, EmbeddingService, SearchFilters, TextSearch, VectorIndex, FETCH_BATCH,
};
use trove_core::config::RetrievalConfig;
use trove_core::model::DocSnapshot;

/// Hard ceiling on the requested result count.
const MAX_LIMIT: usize = 1000;

/// The hybrid retriever, generic over its four backend contracts.
pub struct HybridRetriever<'a> {
    text: &'a dyn TextSearch,
    embedder: &'a dyn EmbeddingService,
    index: &'a dyn VectorIndex,
    store: &'a dyn ContentStore,
    config: RetrievalConfig,
}

impl<'a> HybridRetriever<'a> {
    #[must_use]
    pub fn new(
        text: &'a dyn TextSearch,
        embedder: &'a dyn EmbeddingService,
        index: &'a dyn VectorIndex,
        store: &'a dyn ContentStore,
    ) -> Self {
        Self {
            text,
            embedder,
            index,
            store,
            config: RetrievalConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full pipeline and return up to `limit` fused results, best
    /// first.
    ///
    /// # Parameters
    /// - `query`: free-text query; weighting adapts to its shape.
    /// - `limit`: maximum results, clamped to 1000. Zero returns nothing.
    /// - `filters`: pushed down to both retrieval paths; the configured
    ///   minimum quality is additionally pushed down on the semantic path
    ///   when the caller did not set one.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize, filters: &SearchFilters) -> Vec<FusedResult> {
        let limit = limit.min(MAX_LIMIT);
        if limit == 0 {
            return Vec::new();
        }

        let weights = query_weights(query);
        debug!(
            "query weights: keyword={:.2} semantic={:.2}",
            weights.keyword, weights.semantic
        );

        let oversample = if self.config.aggregate_chunks {
            self.config.chunk_oversample
        } else {
            self.config.oversample
        };

        let mut semantic_filters = filters.clone();
        if semantic_filters.min_quality.is_none() {
            semantic_filters.min_quality = self.config.min_quality;
        }

        let keyword_hits = KeywordSearchAdapter::new(self.text).search(query, limit, filters);
        let semantic_hits = SemanticSearchAdapter::new(self.embedder, self.index)
            .with_oversample(oversample)
            .search(query, limit, &semantic_filters);

        let mut fused = rrf_merge(&keyword_hits, &semantic_hits, weights, self.config.rrf_k);

        if self.config.aggregate_chunks {
            fused = aggregate_chunks(fused, self.config.top_chunks);
        }
        fused = enforce_diversity(fused, self.config.max_per_source);
        fused.truncate(limit);

        self.enrich(&mut fused);
        fused
    }

    /// Fill in missing payloads from the content store, batched to the
    /// store's id-list cap. A store failure leaves the remaining results
    /// unenriched rather than failing the search.
    fn enrich(&self, results: &mut [FusedResult]) {
        let missing: Vec<String> = results
            .iter()
            .filter(|r| r.payload.is_none())
            .map(|r| r.doc_id.clone())
            .collect();
        if missing.is_empty() {
            return;
        }

        let mut snapshots = std::collections::BTreeMap::new();
        for batch in missing.chunks(FETCH_BATCH) {
            match self.store.fetch(batch) {
                Ok(docs) => {
                    for doc in docs {
                        snapshots.insert(doc.id.clone(), DocSnapshot::from_document(&doc));
                    }
                }
                Err(err) => {
                    warn!("payload enrichment skipped: {err}");
                    break;
                }
            }
        }

        for result in results.iter_mut() {
            if result.payload.is_none()
                && let Some(snap) = snapshots.get(&result.doc_id)
            {
                result.payload = Some(snap.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use trove_core::backend::{
        MemoryContentStore, MemoryEmbedder, MemoryTextSearch, MemoryVectorIndex,
    };
    use trove_core::model::{Document, SourceType};

    struct Fixture {
        text: MemoryTextSearch,
        embedder: MemoryEmbedder,
        index: MemoryVectorIndex,
        store: MemoryContentStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                text: MemoryTextSearch::new(),
                embedder: MemoryEmbedder::default(),
                index: MemoryVectorIndex::new(),
                store: MemoryContentStore::new(),
            }
        }

        fn add(&self, id: &str, source_type: SourceType, title: &str, body: &str) {
            let doc = Document {
                id: id.into(),
                source_type,
                title: title.into(),
                body: body.into(),
                ..Document::default()
            };
            self.text.insert(doc.clone());
            self.store.insert(doc.clone());
            if let Ok(vector) = self.embedder.encode(&format!("{title} {body}")) {
                self.index
                    .upsert(id, &vector, Some(DocSnapshot::from_document(&doc)))
                    .expect("upsert");
            }
        }

        fn retriever(&self) -> HybridRetriever<'_> {
            HybridRetriever::new(&self.text, &self.embedder, &self.index, &self.store)
        }
    }

    #[test]
    fn end_to_end_returns_ranked_results() {
        let fx = Fixture::new();
        fx.add("e1", SourceType::Email, "water intrusion report", "the basement wall shows water intrusion");
        fx.add("e2", SourceType::Email, "lease renewal", "terms for the coming year");
        fx.add("n1", SourceType::Note, "water heater", "water heater maintenance log");

        let results = fx
            .retriever()
            .search("water intrusion", 10, &SearchFilters::default());
        assert!(!results.is_empty());
        assert_eq!(results[0].doc_id, "e1");
        for pair in results.windows(2) {
            assert!(pair[0].rrf_score >= pair[1].rrf_score);
        }
    }

    #[test]
    fn zero_limit_short_circuits() {
        let fx = Fixture::new();
        fx.add("e1", SourceType::Email, "anything", "at all");
        assert!(fx
            .retriever()
            .search("anything", 0, &SearchFilters::default())
            .is_empty());
    }

    #[test]
    fn semantic_outage_leaves_keyword_results() {
        let fx = Fixture::new();
        fx.add("e1", SourceType::Email, "water intrusion", "report");
        fx.index.set_unavailable(true);

        let results = fx
            .retriever()
            .search("water intrusion", 10, &SearchFilters::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].keyword_rank, Some(1));
        assert_eq!(results[0].semantic_rank, None);
    }

    #[test]
    fn keyword_outage_leaves_semantic_results() {
        let fx = Fixture::new();
        fx.add("e1", SourceType::Email, "water intrusion", "report");
        fx.text.set_unavailable(true);

        let results = fx
            .retriever()
            .search("water intrusion report", 10, &SearchFilters::default());
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.keyword_rank.is_none()));
    }

    #[test]
    fn total_outage_returns_empty_not_error() {
        let fx = Fixture::new();
        fx.add("e1", SourceType::Email, "water", "report");
        fx.text.set_unavailable(true);
        fx.index.set_unavailable(true);
        assert!(fx
            .retriever()
            .search("water", 10, &SearchFilters::default())
            .is_empty());
    }

    #[test]
    fn chunks_fold_into_their_parent() {
        let fx = Fixture::new();
        fx.add("doc-7:0", SourceType::DocumentChunk, "handbook part 1", "overtime policy for staff");
        fx.add("doc-7:1", SourceType::DocumentChunk, "handbook part 2", "overtime approval workflow");
        fx.add("doc-7:2", SourceType::DocumentChunk, "handbook part 3", "overtime pay rates");

        let results = fx
            .retriever()
            .search("overtime policy", 10, &SearchFilters::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, "doc-7");
        assert_eq!(results[0].chunk_count, Some(3));
        assert!(!results[0].top_chunks.is_empty());
    }

    #[test]
    fn diversity_cap_limits_each_source_type() {
        let fx = Fixture::new();
        for i in 0..6 {
            fx.add(
                &format!("e{i}"),
                SourceType::Email,
                "water intrusion update",
                "water intrusion in the basement",
            );
        }
        fx.add("n1", SourceType::Note, "water intrusion note", "water intrusion");

        let config = RetrievalConfig {
            max_per_source: 2,
            aggregate_chunks: false,
            ..RetrievalConfig::default()
        };
        let results = fx
            .retriever()
            .with_config(config)
            .search("water intrusion", 20, &SearchFilters::default());

        let emails = results
            .iter()
            .filter(|r| {
                r.payload.as_ref().map(|p| p.source_type) == Some(SourceType::Email)
            })
            .count();
        assert!(emails <= 2);
        assert!(results.iter().any(|r| r.doc_id == "n1"));
    }

    #[test]
    fn configured_min_quality_reaches_the_semantic_path_only() {
        let fx = Fixture::new();
        let low = Document {
            id: "low".into(),
            source_type: SourceType::Note,
            title: "water intrusion".into(),
            body: "water intrusion".into(),
            quality_score: 0.1,
            ..Document::default()
        };
        fx.text.insert(low.clone());
        fx.store.insert(low.clone());
        let vector = fx.embedder.encode("water intrusion").expect("encode");
        fx.index
            .upsert("low", &vector, Some(DocSnapshot::from_document(&low)))
            .expect("upsert");

        let config = RetrievalConfig {
            min_quality: Some(0.5),
            ..RetrievalConfig::default()
        };
        let results = fx
            .retriever()
            .with_config(config)
            .search("water intrusion", 10, &SearchFilters::default());

        // The keyword path still surfaces the low-quality document.
        let low_hit = results.iter().find(|r| r.doc_id == "low").expect("kept");
        assert!(low_hit.keyword_rank.is_some());
        assert!(low_hit.semantic_rank.is_none());
    }

    #[test]
    fn enrichment_fills_missing_payloads_from_the_store() {
        let fx = Fixture::new();
        // Present in the vector index without a payload, and in the store.
        let doc = Document {
            id: "bare".into(),
            source_type: SourceType::Pdf,
            title: "inspection report".into(),
            body: "inspection findings".into(),
            ..Document::default()
        };
        fx.store.insert(doc);
        let vector = fx.embedder.encode("inspection report findings").expect("encode");
        fx.index.upsert("bare", &vector, None).expect("upsert");

        let results = fx
            .retriever()
            .search("inspection report", 10, &SearchFilters::default());
        let hit = results.iter().find(|r| r.doc_id == "bare").expect("hit");
        let payload = hit.payload.as_ref().expect("enriched");
        assert_eq!(payload.title, "inspection report");
        assert_eq!(payload.source_type, SourceType::Pdf);
    }

    #[test]
    fn enrichment_survives_a_store_outage() {
        let fx = Fixture::new();
        let vector = fx.embedder.encode("orphan vector").expect("encode");
        fx.index.upsert("ghost", &vector, None).expect("upsert");
        fx.store.set_unavailable(true);

        let results = fx
            .retriever()
            .search("orphan vector", 10, &SearchFilters::default());
        let hit = results.iter().find(|r| r.doc_id == "ghost").expect("hit");
        assert!(hit.payload.is_none());
    }
}
