//! In-memory collaborator implementations.
//!
//! These back the test suites and small demos. They are deliberately naive
//! (linear scans, token-hash embeddings) but honor the contracts exactly,
//! including the pushdown-filter rules and the degrade switches used to
//! exercise backend-unavailable paths.

use crate::backend::{
    cosine_similarity, ContentStore, EmbeddingService, SearchFilters, StoredVector, TextHit,
    TextSearch, VectorHit, VectorIndex,
};
use crate::error::BackendError;
use crate::model::{DocSnapshot, Document};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

const DEFAULT_DIM: usize = 32;

fn lock_err() -> BackendError {
    BackendError::Store("poisoned lock".to_string())
}

// ---------------------------------------------------------------------------
// MemoryTextSearch
// ---------------------------------------------------------------------------

/// Token-overlap lexical search over an in-memory document list.
#[derive(Default)]
pub struct MemoryTextSearch {
    docs: Mutex<Vec<Document>>,
    unavailable: AtomicBool,
}

impl MemoryTextSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: Document) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.push(doc);
        }
    }

    /// Simulate an outage; subsequent searches return `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl TextSearch for MemoryTextSearch {
    fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<TextHit>, BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("text store offline".to_string()));
        }

        let docs = self.docs.lock().map_err(|_| lock_err())?;
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let mut scored: Vec<(usize, &Document)> = docs
            .iter()
            .filter(|doc| filters.matches(doc))
            .filter_map(|doc| {
                let score = lexical_score(&tokens, doc);
                (score > 0).then_some((score, doc))
            })
            .collect();

        // Title matches outrank body matches; ties break on id for a stable,
        // strictly rank-ordered result list.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(_, doc)| TextHit {
                id: doc.id.clone(),
                source_id: doc.parent_id.clone().unwrap_or_else(|| doc.id.clone()),
                source_type: doc.source_type,
                title: doc.title.clone(),
                body: doc.body.clone(),
            })
            .collect())
    }
}

fn lexical_score(tokens: &[String], doc: &Document) -> usize {
    let title = doc.title.to_lowercase();
    let body = doc.body.to_lowercase();
    tokens
        .iter()
        .map(|token| {
            title.matches(token.as_str()).count() * 2 + body.matches(token.as_str()).count()
        })
        .sum()
}

// ---------------------------------------------------------------------------
// MemoryEmbedder
// ---------------------------------------------------------------------------

/// Deterministic token-hash embedder.
///
/// Tokens are hashed into `dim` buckets and the counts L2-normalized, so
/// texts sharing vocabulary get high cosine similarity. Good enough to
/// exercise ranking and clustering logic without a model.
pub struct MemoryEmbedder {
    dim: usize,
    /// When set, any text containing this substring fails to encode.
    fail_marker: Mutex<Option<String>>,
}

impl Default for MemoryEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl MemoryEmbedder {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            fail_marker: Mutex::new(None),
        }
    }

    /// Make encoding fail for any text containing `marker`.
    pub fn fail_when_contains(&self, marker: &str) {
        if let Ok(mut slot) = self.fail_marker.lock() {
            *slot = Some(marker.to_string());
        }
    }
}

impl EmbeddingService for MemoryEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        if let Ok(slot) = self.fail_marker.lock()
            && let Some(marker) = slot.as_deref()
            && text.contains(marker)
        {
            return Err(BackendError::Unavailable(
                "embedding service offline".to_string(),
            ));
        }

        let mut vector = vec![0.0_f32; self.dim];
        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hasher.finish() as usize) % self.dim;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        } else {
            // Empty text still gets a unit vector so cosine stays defined.
            vector[0] = 1.0;
        }

        Ok(vector)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

// ---------------------------------------------------------------------------
// MemoryVectorIndex
// ---------------------------------------------------------------------------

/// Exhaustive cosine KNN over an in-memory vector map.
#[derive(Default)]
pub struct MemoryVectorIndex {
    entries: Mutex<BTreeMap<String, StoredVector>>,
    unavailable: AtomicBool,
}

impl MemoryVectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage; every trait method returns `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("vector index offline".to_string()));
        }
        Ok(())
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorHit>, BackendError> {
        self.check_available()?;
        let entries = self.entries.lock().map_err(|_| lock_err())?;

        let mut hits: Vec<VectorHit> = entries
            .iter()
            .filter(|(_, stored)| {
                stored
                    .payload
                    .as_ref()
                    .is_none_or(|snap| filters.matches_snapshot(snap))
            })
            .filter_map(|(id, stored)| {
                let cosine = cosine_similarity(vector, &stored.vector)?;
                // Native cosine mapped to [0, 1] for consistent scoring.
                let score = ((cosine + 1.0) * 0.5).clamp(0.0, 1.0);
                Some(VectorHit {
                    id: id.clone(),
                    score,
                    payload: stored.payload.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);

        Ok(hits)
    }

    fn count(&self) -> Result<usize, BackendError> {
        self.check_available()?;
        Ok(self.entries.lock().map_err(|_| lock_err())?.len())
    }

    fn get(&self, id: &str) -> Result<Option<StoredVector>, BackendError> {
        self.check_available()?;
        Ok(self.entries.lock().map_err(|_| lock_err())?.get(id).cloned())
    }

    fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        payload: Option<DocSnapshot>,
    ) -> Result<(), BackendError> {
        self.check_available()?;
        self.entries.lock().map_err(|_| lock_err())?.insert(
            id.to_string(),
            StoredVector {
                vector: vector.to_vec(),
                payload,
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryContentStore
// ---------------------------------------------------------------------------

/// Id-keyed in-memory document store.
#[derive(Default)]
pub struct MemoryContentStore {
    docs: Mutex<BTreeMap<String, Document>>,
    fetch_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: Document) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(doc.id.clone(), doc);
        }
    }

    /// Simulate an outage; `get` and `fetch` return `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `fetch` round-trips served so far. Lets tests assert that
    /// callers respect the batch-size contract.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl ContentStore for MemoryContentStore {
    fn get(&self, id: &str) -> Result<Option<Document>, BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("content store offline".into()));
        }
        Ok(self.docs.lock().map_err(|_| lock_err())?.get(id).cloned())
    }

    fn fetch(&self, ids: &[String]) -> Result<Vec<Document>, BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("content store offline".into()));
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let docs = self.docs.lock().map_err(|_| lock_err())?;
        Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
