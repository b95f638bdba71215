//! Session configuration and on-disk dataset layout.

use crate::error::{Result, TsclustError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of elements per chunked read.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default number of normalised subsets kept in memory.
pub const DEFAULT_MAX_CACHED_SUBSETS: usize = 32;

/// Named dataset paths inside a clustering database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    /// Scalar holding the number of sequences.
    pub n_sequences: String,
    /// Scalar holding the number of samples.
    pub n_samples: String,
    /// CSR values.
    pub data: String,
    /// CSR column indices (zero-based).
    pub indices: String,
    /// CSR row pointers (zero-based, length sequences + 1).
    pub indptr: String,
    /// Per-sample collection times.
    pub time: String,
    /// Per-sequence taxonomy strings.
    pub taxonomy: String,
    /// Per-sequence stable phylogenetic cluster labels.
    pub phylo_clusters: String,
    /// Per-sequence identifiers.
    pub sequence_ids: String,
    /// Epsilon x sequences label matrix.
    pub clusters: String,
    /// Sweep attribute names on the label matrix.
    pub param_min: String,
    pub param_max: String,
    pub param_step: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            n_sequences: "timeseries/n_sequences".to_string(),
            n_samples: "timeseries/n_samples".to_string(),
            data: "timeseries/data".to_string(),
            indices: "timeseries/indices".to_string(),
            indptr: "timeseries/indptr".to_string(),
            time: "samples/time".to_string(),
            taxonomy: "genes/taxonomy".to_string(),
            phylo_clusters: "genes/sequenceclusters".to_string(),
            sequence_ids: "genes/sequenceids".to_string(),
            clusters: "genes/clusters".to_string(),
            param_min: "param_min".to_string(),
            param_max: "param_max".to_string(),
            param_step: "param_step".to_string(),
        }
    }
}

/// Configuration for opening and querying a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Elements per chunk when streaming the sparse time series.
    pub chunk_size: usize,
    /// Memoise selections, normalisations and diversity reports.
    pub cache: bool,
    /// Normalised subsets retained before the oldest is evicted.
    pub max_cached_subsets: usize,
    /// Dataset paths.
    pub layout: DatasetLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache: true,
            max_cached_subsets: DEFAULT_MAX_CACHED_SUBSETS,
            layout: DatasetLayout::default(),
        }
    }
}

impl SessionConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TsclustError::from)
    }

    /// Override the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Enable or disable memoisation.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Bound the number of memoised normalisations.
    pub fn with_max_cached_subsets(mut self, max: usize) -> Self {
        self.max_cached_subsets = max;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TsclustError::InvalidParameter(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_cached_subsets == 0 {
            return Err(TsclustError::InvalidParameter(
                "max_cached_subsets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
