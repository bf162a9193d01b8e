//! Collaborator contracts for the text store, embedding service, vector
//! index, and content store.
//!
//! The retrieval core never talks to a concrete backend; it is handed these
//! traits as explicitly constructed instances. Real deployments wire in a
//! relational text store and a vector-index service; the test suites use the
//! in-memory implementations in [`memory`].

pub mod memory;

pub use memory::{MemoryContentStore, MemoryEmbedder, MemoryTextSearch, MemoryVectorIndex};

use crate::error::BackendError;
use crate::model::{DocSnapshot, Document, SourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Downstream stores cap id-list round-trips; callers batch lookups to at
/// most this many ids per request.
pub const FETCH_BATCH: usize = 500;

/// Cosine similarity in `[-1, 1]`; `None` for mismatched or degenerate
/// inputs.
#[must_use]
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f32> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0.0_f32;
    let mut left_norm_sq = 0.0_f32;
    let mut right_norm_sq = 0.0_f32;

    for (a, b) in left.iter().zip(right.iter()) {
        dot += a * b;
        left_norm_sq += a * a;
        right_norm_sq += b * b;
    }

    let denom = left_norm_sq.sqrt() * right_norm_sq.sqrt();
    if denom <= f32::EPSILON {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0))
}

/// Predicate conjunction pushed down to a backend.
///
/// A backend applies every predicate it understands and silently drops the
/// rest; an unsupported filter never causes a failure. Date bounds are
/// inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Restrict to these source types; empty means all.
    #[serde(default)]
    pub source_types: Vec<SourceType>,
    #[serde(default)]
    pub min_quality: Option<f32>,
    #[serde(default)]
    pub after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
}

impl SearchFilters {
    /// Evaluate the full conjunction against a stored document.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        if !self.source_types.is_empty() && !self.source_types.contains(&doc.source_type) {
            return false;
        }
        if let Some(min) = self.min_quality
            && doc.quality_score < min
        {
            return false;
        }
        if let Some(after) = self.after
            && doc.created_at < after
        {
            return false;
        }
        if let Some(before) = self.before
            && doc.created_at > before
        {
            return false;
        }
        true
    }

    /// Evaluate against a payload snapshot.
    ///
    /// Snapshots carry no timestamp, so the date predicates are dropped
    /// here per the unsupported-filter rule. A snapshot without a
    /// quality score passes the quality predicate.
    #[must_use]
    pub fn matches_snapshot(&self, snap: &DocSnapshot) -> bool {
        if !self.source_types.is_empty() && !self.source_types.contains(&snap.source_type) {
            return false;
        }
        if let (Some(min), Some(quality)) = (self.min_quality, snap.quality_score)
            && quality < min
        {
            return false;
        }
        true
    }
}

/// One lexical hit, in the text store's own ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    pub id: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub title: String,
    pub body: String,
}

/// One vector-index hit with its native similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DocSnapshot>,
}

/// A cached vector with its payload, as stored in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub vector: Vec<f32>,
    pub payload: Option<DocSnapshot>,
}

/// Lexical full-text search over the document corpus.
pub trait TextSearch {
    /// Search for `query`, returning up to `limit` hits in the store's own
    /// relevance order (best first).
    fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<TextHit>, BackendError>;
}

/// Text-to-vector encoding, consistently comparable via cosine similarity
/// across calls.
pub trait EmbeddingService {
    fn encode(&self, text: &str) -> Result<Vec<f32>, BackendError>;

    /// Expected vector dimensionality; encodings of any other length are
    /// treated as malformed.
    fn dim(&self) -> usize;
}

/// Approximate-nearest-neighbour index over document embeddings. Doubles as
/// the embedding cache for the duplicate detector.
pub trait VectorIndex {
    /// Top-`limit` neighbours of `vector`, best first.
    fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorHit>, BackendError>;

    /// Number of stored vectors; also serves as the availability probe.
    fn count(&self) -> Result<usize, BackendError>;

    fn get(&self, id: &str) -> Result<Option<StoredVector>, BackendError>;

    /// Insert or replace. Concurrent upserts for one id are last-write-wins.
    fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        payload: Option<DocSnapshot>,
    ) -> Result<(), BackendError>;
}

/// Document lookup for payload enrichment and batch jobs.
pub trait ContentStore {
    fn get(&self, id: &str) -> Result<Option<Document>, BackendError>;

    /// Fetch many documents; unknown ids are skipped, not errors. Callers
    /// keep `ids` within [`FETCH_BATCH`].
    fn fetch(&self, ids: &[String]) -> Result<Vec<Document>, BackendError>;
}
