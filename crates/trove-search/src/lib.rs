#![forbid(unsafe_code)]
//! trove-search library.
//!
//! The algorithmic core of trove: given free text, blend exact lexical
//! matches with dense vector similarity into one ranked result list, and,
//! separately, detect exact and near-duplicate documents across the corpus.
//!
//! Pipeline stages, in order:
//!
//! 1. [`weights`]: query-adaptive (keyword, semantic) weight pair
//! 2. [`adapters`]: keyword and semantic retrieval over injected backends
//! 3. [`fusion`]: weighted Reciprocal Rank Fusion and orchestration
//! 4. [`aggregate`]: chunk-to-document aggregation
//! 5. [`diversity`]: per-source result capping
//!
//! Duplicate detection ([`dedup`]) is a separate batch path: hash-based
//! exact groups, embedding-similarity near groups via connected components,
//! and a survivor-resolution policy.
//!
//! # Conventions
//!
//! - **Errors**: backend failures degrade (empty list, skipped item), they
//!   never raise; only contract violations return typed errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).

pub mod adapters;
pub mod aggregate;
pub mod dedup;
pub mod diversity;
pub mod fusion;
pub mod weights;

pub use adapters::{KeywordSearchAdapter, SearchHit, SearchSource, SemanticSearchAdapter};
pub use aggregate::aggregate_chunks;
pub use dedup::{
    DedupReport, DuplicateDetector, DuplicateGroup, DuplicateKind, NearDuplicateReport,
    RemovedDoc, Resolution, ResolutionStrategy,
};
pub use diversity::enforce_diversity;
pub use fusion::{ChunkEvidence, FusedResult, HybridRetriever, rrf_merge, DEFAULT_RRF_K};
pub use weights::{query_weights, QueryWeights};
