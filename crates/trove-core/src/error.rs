use thiserror::Error;

/// Failures crossing a collaborator boundary.
///
/// These never escape the search adapters: an unreachable or malformed
/// backend degrades that retrieval path to an empty list instead of failing
/// the query. The variants exist so the degradation points can log *why*
/// and so batch jobs can count skipped items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend cannot be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The embedding service returned a malformed or wrong-dimension vector.
    #[error("encoding failure: expected dimension {expected}, got {got}")]
    Encoding { expected: usize, got: usize },

    /// The store accepted the request but failed to serve it.
    #[error("store error: {0}")]
    Store(String),
}

impl BackendError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E6101",
            Self::Encoding { .. } => "E6102",
            Self::Store(_) => "E6103",
        }
    }
}

/// Contract violations in the duplicate-detection API.
///
/// Unlike backend failures these fail fast, before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DetectError {
    /// Similarity thresholds must lie in `[0, 1]`.
    #[error("similarity threshold {0} outside [0, 1]")]
    ThresholdOutOfRange(f32),
}

impl DetectError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ThresholdOutOfRange(_) => "E2101",
        }
    }
}
