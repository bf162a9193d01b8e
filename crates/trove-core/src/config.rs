use crate::backend::FETCH_BATCH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Root configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TroveConfig {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// Tuning knobs for the hybrid retrieval pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// RRF damping constant; higher values reduce the impact of rank gaps.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    /// Vector-index oversampling factor when chunk aggregation is off.
    #[serde(default = "default_oversample")]
    pub oversample: usize,

    /// Oversampling factor when chunk aggregation is active, raised so the
    /// post-aggregation document count still covers the requested limit.
    #[serde(default = "default_chunk_oversample")]
    pub chunk_oversample: usize,

    /// Whether chunk-level hits are folded into parent-document results.
    #[serde(default = "default_true")]
    pub aggregate_chunks: bool,

    /// How many chunks per parent are retained as evidence.
    #[serde(default = "default_top_chunks")]
    pub top_chunks: usize,

    /// Result cap per source type.
    #[serde(default = "default_max_per_source")]
    pub max_per_source: usize,

    /// Minimum quality score, pushed down on the semantic path only.
    #[serde(default)]
    pub min_quality: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            oversample: default_oversample(),
            chunk_oversample: default_chunk_oversample(),
            aggregate_chunks: true,
            top_chunks: default_top_chunks(),
            max_per_source: default_max_per_source(),
            min_quality: None,
        }
    }
}

/// Tuning knobs for the duplicate-detection batch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Cosine-similarity threshold for the near-duplicate tier.
    #[serde(default = "default_near_threshold")]
    pub near_threshold: f32,

    /// Maximum document ids per content-store round-trip.
    #[serde(default = "default_fetch_batch")]
    pub fetch_batch: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            near_threshold: default_near_threshold(),
            fetch_batch: default_fetch_batch(),
        }
    }
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<TroveConfig> {
    if !path.exists() {
        debug!("no config file at {}, using defaults", path.display());
        return Ok(TroveConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TroveConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_rrf_k() -> u32 {
    60
}

const fn default_oversample() -> usize {
    2
}

const fn default_chunk_oversample() -> usize {
    4
}

const fn default_top_chunks() -> usize {
    3
}

const fn default_max_per_source() -> usize {
    3
}

const fn default_near_threshold() -> f32 {
    0.85
}

const fn default_fetch_batch() -> usize {
    FETCH_BATCH
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("trove-config-test-{label}-{id}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = make_temp_dir("missing");
        let cfg = load_config(&dir.join("trove.toml")).expect("load should succeed");
        assert_eq!(cfg.retrieval.rrf_k, 60);
        assert_eq!(cfg.retrieval.oversample, 2);
        assert_eq!(cfg.retrieval.chunk_oversample, 4);
        assert!(cfg.retrieval.aggregate_chunks);
        assert_eq!(cfg.retrieval.top_chunks, 3);
        assert_eq!(cfg.retrieval.max_per_source, 3);
        assert_eq!(cfg.retrieval.min_quality, None);
        assert!((cfg.dedup.near_threshold - 0.85).abs() < 1e-6);
        assert_eq!(cfg.dedup.fetch_batch, 500);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = make_temp_dir("partial");
        let path = dir.join("trove.toml");
        std::fs::write(
            &path,
            "[retrieval]\nrrf_k = 30\nmin_quality = 0.4\n\n[dedup]\nnear_threshold = 0.9\n",
        )
        .expect("write config");

        let cfg = load_config(&path).expect("load should succeed");
        assert_eq!(cfg.retrieval.rrf_k, 30);
        assert_eq!(cfg.retrieval.min_quality, Some(0.4));
        assert_eq!(cfg.retrieval.max_per_source, 3);
        assert!((cfg.dedup.near_threshold - 0.9).abs() < 1e-6);
        assert_eq!(cfg.dedup.fetch_batch, 500);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = make_temp_dir("malformed");
        let path = dir.join("trove.toml");
        std::fs::write(&path, "retrieval = \"not a table\"").expect("write config");
        assert!(load_config(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
