//! Per-source-type result capping.
//!
//! A corpus dominated by one source (a long email thread, say) would
//! otherwise fill the whole result page; capping each source type keeps the
//! mix varied without re-scoring anything.

use crate::fusion::scoring::FusedResult;
use std::collections::HashMap;
use trove_core::model::SourceType;

/// Keep at most `max_per_source` results per source type, preserving order.
///
/// Results without a payload are capped as their own group rather than
/// exempted. A cap of zero removes everything.
#[must_use]
pub fn enforce_diversity(results: Vec<FusedResult>, max_per_source: usize) -> Vec<FusedResult> {
    if max_per_source == 0 {
        return Vec::new();
    }

    let mut seen: HashMap<Option<SourceType>, usize> = HashMap::new();
    results
        .into_iter()
        .filter(|result| {
            let key = result.payload.as_ref().map(|p| p.source_type);
            let count = seen.entry(key).or_insert(0);
            *count += 1;
            *count <= max_per_source
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
