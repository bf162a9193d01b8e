//! Query-adaptive weighting between the keyword and semantic modalities.
//!
//! Short queries are usually lookups (names, addresses, invoice numbers)
//! where lexical match wins; long queries are usually descriptions where
//! dense similarity wins. Pattern signals (`@`, quotes, digits) shift the
//! balance further toward exact match. The output pair always sums to 1.0
//! with each side clamped to `[0.1, 0.9]` so neither modality is ever fully
//! silenced.

use serde::{Deserialize, Serialize};

/// Lower clamp bound for either weight.
pub const MIN_WEIGHT: f32 = 0.1;
/// Upper clamp bound for either weight.
pub const MAX_WEIGHT: f32 = 0.9;

/// Shift toward keyword when the query carries an exact-match signal
/// (an `@` or a double-quote).
const EXACT_MATCH_SHIFT: f32 = 0.15;
/// Shift toward keyword when the query contains any digit.
const NUMERIC_SHIFT: f32 = 0.05;

/// A keyword/semantic weight pair.
///
/// Invariant: `keyword + semantic == 1.0`, both in `[0.1, 0.9]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryWeights {
    pub keyword: f32,
    pub semantic: f32,
}

/// Compute the weight pair for a query. Pure and deterministic.
///
/// Base weights by whitespace token count: two or fewer tokens →
/// `(0.7, 0.3)`, exactly three → `(0.5, 0.5)`, four or more → `(0.3, 0.7)`.
/// An empty query takes the short-query branch. Pattern shifts are applied
/// to the keyword side, the pair is renormalized to sum 1.0, the keyword
/// side is clamped to `[0.1, 0.9]`, and the semantic side is recomputed as
/// its complement.
#[must_use]
pub fn query_weights(query: &str) -> QueryWeights {
    let tokens = query.split_whitespace().count();
    let (mut keyword, semantic) = match tokens {
        0..=2 => (0.7_f32, 0.3_f32),
        3 => (0.5, 0.5),
        _ => (0.3, 0.7),
    };

    if query.contains('@') || query.contains('"') {
        keyword += EXACT_MATCH_SHIFT;
    }
    if query.chars().any(|c| c.is_ascii_digit()) {
        keyword += NUMERIC_SHIFT;
    }

    let keyword = (keyword / (keyword + semantic)).clamp(MIN_WEIGHT, MAX_WEIGHT);
    QueryWeights {
        keyword,
        semantic: 1.0 - keyword,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
