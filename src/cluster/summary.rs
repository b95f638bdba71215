//! Per-cluster membership summaries.

use crate::data::{AbundanceMatrix, ClusterLabels, NOISE_LABEL};
use crate::error::{Result, TsclustError};
use serde::{Deserialize, Serialize};

/// Size and total abundance of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub label: i64,
    /// Number of member sequences.
    pub size: usize,
    /// Summed abundance of all members over all samples.
    pub abundance: f64,
}

impl ClusterSummary {
    pub fn is_noise(&self) -> bool {
        self.label == NOISE_LABEL
    }
}

/// Summarise every label, noise included, in ascending label order.
///
/// Fails with [`TsclustError::ShapeMismatch`] when the label row does not
/// cover exactly the rows of `abundance`.
pub fn summarize_clusters(
    labels: &ClusterLabels,
    abundance: &AbundanceMatrix,
) -> Result<Vec<ClusterSummary>> {
    if labels.len() != abundance.n_sequences() {
        return Err(TsclustError::ShapeMismatch {
            array: "cluster labels".to_string(),
            expected: abundance.n_sequences(),
            actual: labels.len(),
        });
    }
    let row_sums = abundance.row_sums();
    Ok(labels
        .groups()
        .into_iter()
        .map(|(label, members)| ClusterSummary {
            label,
            size: members.len(),
            abundance: members.iter().map(|&i| row_sums[i]).sum(),
        })
        .collect())
}
