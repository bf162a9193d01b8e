//! Fusion of the keyword and semantic hit lists into one ranked result
//! list.
//!
//! [`scoring`] holds the weighted Reciprocal Rank Fusion math;
//! [`hybrid`] orchestrates the full pipeline (weights → adapters → fusion →
//! aggregation → diversity → enrichment) over injected collaborators.

pub mod hybrid;
pub mod scoring;

pub use hybrid::HybridRetriever;
pub use scoring::{rrf_merge, ChunkEvidence, FusedResult, DEFAULT_RRF_K};
