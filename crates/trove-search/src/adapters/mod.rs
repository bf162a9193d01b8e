//! Source adapters that turn backend hits into rank-ordered [`SearchHit`]s.
//!
//! Both adapters follow the degrade-to-empty policy: a backend that is
//! unreachable or returns malformed output produces an empty hit list and a
//! `warn!`, never an error, so the other retrieval path proceeds
//! unaffected.

mod keyword;
mod semantic;

pub use keyword::KeywordSearchAdapter;
pub use semantic::{SemanticSearchAdapter, DEFAULT_OVERSAMPLE};

use serde::{Deserialize, Serialize};
use trove_core::model::DocSnapshot;

/// Which retrieval modality produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Keyword,
    Semantic,
}

/// One rank-ordered hit from a single modality.
///
/// `rank` is 1-based and unique within its own source list, assigned by
/// that source's own ordering. `score` is source-local: keyword hits carry
/// `1/rank` (strictly decreasing, no ties), semantic hits carry the index's
/// cosine-derived similarity in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub rank: usize,
    pub score: f32,
    pub source: SearchSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DocSnapshot>,
}
