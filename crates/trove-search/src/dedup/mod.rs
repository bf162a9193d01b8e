//! Two-tier duplicate detection over the document corpus.
//!
//! The exact tier ([`exact`]) buckets documents by normalized content
//! hash. The near tier ([`near`]) compares embeddings pairwise and groups
//! connected components of above-threshold pairs. [`resolve`] turns groups
//! into a keep/remove proposal. [`DuplicateDetector`] runs both tiers over
//! a corpus slice as one batch scan.

pub mod exact;
pub mod near;
pub mod resolve;

pub use exact::{content_hash, detect_exact};
pub use near::{detect_near, NearDuplicateReport};
pub use resolve::{resolve, RemovedDoc, Resolution, ResolutionStrategy};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use trove_core::backend::{ContentStore, EmbeddingService, VectorIndex};
use trove_core::config::DedupConfig;
use trove_core::error::DetectError;
use trove_core::model::Document;

/// Which tier produced a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKind {
    Exact,
    Semantic,
}

/// One group of mutually duplicate documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub kind: DuplicateKind,
    /// Member ids, sorted.
    pub members: Vec<String>,
    pub count: usize,
    /// Leading hex of the shared content hash; exact groups only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_prefix: Option<String>,
    /// Mean similarity of the qualifying pairs; near groups only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_similarity: Option<f32>,
}

/// Outcome of a full two-tier scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupReport {
    pub exact: Vec<DuplicateGroup>,
    pub semantic: Vec<DuplicateGroup>,
    /// Documents the near tier had to skip for lack of an embedding.
    pub failed: usize,
}

/// Batch duplicate scanner over injected backends.
pub struct DuplicateDetector<'a> {
    embedder: &'a dyn EmbeddingService,
    index: &'a dyn VectorIndex,
    store: &'a dyn ContentStore,
    config: DedupConfig,
}

impl<'a> DuplicateDetector<'a> {
    #[must_use]
    pub fn new(
        embedder: &'a dyn EmbeddingService,
        index: &'a dyn VectorIndex,
        store: &'a dyn ContentStore,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            config: DedupConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DedupConfig) -> Self {
        self.config = config;
        self
    }

    /// Scan the documents behind `ids` with both tiers.
    ///
    /// Exact groups are computed first; their members are excluded from the
    /// near tier so a document never appears in groups of both kinds. Ids
    /// the content store cannot produce are skipped.
    ///
    /// # Errors
    /// Returns [`DetectError::ThresholdOutOfRange`] when the configured
    /// near threshold falls outside `[0, 1]`; backend failures degrade
    /// instead.
    pub fn scan(&self, ids: &[String]) -> Result<DedupReport, DetectError> {
        let documents = self.fetch_documents(ids);
        let exact = detect_exact(&documents);

        let exclude: HashSet<String> = exact
            .iter()
            .flat_map(|group| group.members.iter().cloned())
            .collect();

        let near = detect_near(
            &documents,
            self.config.near_threshold,
            &exclude,
            self.embedder,
            self.index,
        )?;

        info!(
            "duplicate scan over {} documents: {} exact groups, {} near groups, {} skipped",
            documents.len(),
            exact.len(),
            near.groups.len(),
            near.failed
        );

        Ok(DedupReport {
            exact,
            semantic: near.groups,
            failed: near.failed,
        })
    }

    /// Pick survivors for `groups` under `strategy`.
    #[must_use]
    pub fn resolve(&self, groups: &[DuplicateGroup], strategy: ResolutionStrategy) -> Resolution {
        resolve(groups, strategy, self.store)
    }

    /// Fetch documents in batches of the configured size. A failing batch
    /// is skipped with a warning; the scan proceeds on whatever loaded.
    fn fetch_documents(&self, ids: &[String]) -> Vec<Document> {
        let batch_size = self.config.fetch_batch.max(1);
        let mut documents = Vec::with_capacity(ids.len());
        for batch in ids.chunks(batch_size) {
            match self.store.fetch(batch) {
                Ok(mut docs) => documents.append(&mut docs),
                Err(err) => {
                    warn!("document batch fetch failed, skipping {} ids: {err}", batch.len());
                }
            }
        }
        documents
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use trove_core::backend::{MemoryContentStore, MemoryEmbedder, MemoryVectorIndex};
    use trove_core::model::SourceType;

    fn doc(id: &str, title: &str, body: &str) -> Document {
        Document {
            id: id.into(),
            source_type: SourceType::Email,
            title: title.into(),
            body: body.into(),
            ..Document::default()
        }
    }

    struct Fixture {
        embedder: MemoryEmbedder,
        index: MemoryVectorIndex,
        store: MemoryContentStore,
    }

    impl Fixture {
        fn new(docs: Vec<Document>) -> Self {
            let store = MemoryContentStore::new();
            for d in docs {
                store.insert(d);
            }
            Self {
                embedder: MemoryEmbedder::default(),
                index: MemoryVectorIndex::new(),
                store,
            }
        }

        fn detector(&self) -> DuplicateDetector<'_> {
            DuplicateDetector::new(&self.embedder, &self.index, &self.store)
        }
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn scan_separates_exact_and_near_tiers() {
        let fx = Fixture::new(vec![
            doc("a", "Invoice 1042", "Please remit payment."),
            doc("b", "Invoice 1042", "Please remit payment."),
            doc(
                "c",
                "Invoice 1042 reminder",
                "Please remit the outstanding payment before the end of the month.",
            ),
            doc(
                "d",
                "Invoice 1042 reminder",
                "Please remit the outstanding payment before the end of this month.",
            ),
            doc("e", "Birthday party", "Bring a gift."),
        ]);

        let report = fx
            .detector()
            .with_config(DedupConfig {
                near_threshold: 0.8,
                ..DedupConfig::default()
            })
            .scan(&ids(&["a", "b", "c", "d", "e"]))
            .expect("threshold in range");

        assert_eq!(report.exact.len(), 1);
        assert_eq!(report.exact[0].members, ["a", "b"]);
        assert_eq!(report.semantic.len(), 1);
        assert_eq!(report.semantic[0].members, ["c", "d"]);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn exact_members_never_reappear_in_near_groups() {
        let fx = Fixture::new(vec![
            doc("a", "same", "text"),
            doc("b", "same", "text"),
        ]);
        let report = fx.detector().scan(&ids(&["a", "b"])).expect("in range");
        assert_eq!(report.exact.len(), 1);
        assert!(report.semantic.is_empty());
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let fx = Fixture::new(vec![doc("a", "only", "one")]);
        let report = fx
            .detector()
            .scan(&ids(&["a", "missing"]))
            .expect("in range");
        assert!(report.exact.is_empty());
        assert!(report.semantic.is_empty());
    }

    #[test]
    fn store_outage_degrades_to_an_empty_report() {
        let fx = Fixture::new(vec![doc("a", "t", "b")]);
        fx.store.set_unavailable(true);
        let report = fx.detector().scan(&ids(&["a"])).expect("in range");
        assert!(report.exact.is_empty());
        assert!(report.semantic.is_empty());
    }

    #[test]
    fn bad_threshold_fails_fast() {
        let fx = Fixture::new(vec![]);
        let err = fx
            .detector()
            .with_config(DedupConfig {
                near_threshold: 1.2,
                ..DedupConfig::default()
            })
            .scan(&[])
            .unwrap_err();
        assert!(matches!(err, DetectError::ThresholdOutOfRange(_)));
    }

    #[test]
    fn fetch_respects_the_configured_batch_size() {
        let docs: Vec<Document> = (0..5).map(|i| doc(&format!("d{i}"), "t", "b")).collect();
        let fx = Fixture::new(docs);
        let all: Vec<String> = (0..5).map(|i| format!("d{i}")).collect();

        let detector = fx.detector().with_config(DedupConfig {
            fetch_batch: 2,
            ..DedupConfig::default()
        });
        let _ = detector.scan(&all).expect("in range");
        // 5 ids at batch size 2 means 3 round-trips.
        assert_eq!(fx.store.fetch_calls(), 3);
    }

    #[test]
    fn resolve_delegates_with_the_detectors_store() {
        let fx = Fixture::new(vec![doc("a", "same", "text"), doc("b", "same", "text")]);
        let report = fx.detector().scan(&ids(&["a", "b"])).expect("in range");
        let resolution = fx
            .detector()
            .resolve(&report.exact, ResolutionStrategy::First);
        assert_eq!(resolution.kept, ["a"]);
        assert_eq!(resolution.removed.len(), 1);
    }
}
