//! Row filters selecting a subset of sequences.

use serde::{Deserialize, Serialize};

/// Which sequences to include in a subset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// Every sequence.
    All,
    /// Explicit sequence positions (order and duplicates are ignored).
    Indices(Vec<usize>),
    /// Members of a time-series cluster at the currently selected epsilon.
    TimeCluster(i64),
    /// Members of a stable phylogenetic cluster.
    PhyloCluster(i64),
    /// Sequences whose taxonomy string contains the text (case-insensitive).
    TaxonContains(String),
}

impl RowFilter {
    /// Whether resolving the filter needs a selected epsilon.
    pub fn needs_selection(&self) -> bool {
        matches!(self, RowFilter::TimeCluster(_))
    }
}
