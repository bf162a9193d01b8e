//! Lexical retrieval over the injected text store.

use crate::adapters::{SearchHit, SearchSource};
use tracing::warn;
use trove_core::backend::{SearchFilters, TextSearch};
use trove_core::model::DocSnapshot;

/// Adapter from the text store's hit shape to rank-ordered [`SearchHit`]s.
pub struct KeywordSearchAdapter<'a> {
    store: &'a dyn TextSearch,
}

impl<'a> KeywordSearchAdapter<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn TextSearch) -> Self {
        Self { store }
    }

    /// Run lexical search. Rank is the 1-based position in the store's
    /// returned order; score is `1/rank`, so it is strictly decreasing and
    /// tie-free by construction.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize, filters: &SearchFilters) -> Vec<SearchHit> {
        if limit == 0 {
            return Vec::new();
        }

        let hits = match self.store.search(query, limit, filters) {
            Ok(hits) => hits,
            Err(err) => {
                warn!("keyword search degraded to empty: {err}");
                return Vec::new();
            }
        };

        hits.into_iter()
            .enumerate()
            .map(|(idx, hit)| {
                let rank = idx + 1;
                #[allow(clippy::cast_precision_loss)]
                let score = 1.0 / rank as f32;
                SearchHit {
                    doc_id: hit.id,
                    rank,
                    score,
                    source: SearchSource::Keyword,
                    payload: Some(DocSnapshot {
                        source_type: hit.source_type,
                        title: hit.title,
                        excerpt: excerpt(&hit.body),
                        quality_score: None,
                    }),
                }
            })
            .collect()
    }
}

fn excerpt(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(280).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
