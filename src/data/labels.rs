//! Per-sequence time-series cluster labels at one epsilon.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Label assigned to sequences that belong to no cluster.
pub const NOISE_LABEL: i64 = -1;

/// Cluster labels for every sequence at a single epsilon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterLabels {
    /// Epsilon the labels were computed at.
    pub epsilon: f64,
    /// Row of the label matrix they were read from.
    pub row: usize,
    labels: Vec<i64>,
}

impl ClusterLabels {
    pub fn new(epsilon: f64, row: usize, labels: Vec<i64>) -> Self {
        Self { epsilon, row, labels }
    }

    /// Number of sequences covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of one sequence.
    #[inline]
    pub fn get(&self, sequence: usize) -> Option<i64> {
        self.labels.get(sequence).copied()
    }

    /// All labels in sequence order.
    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.labels
    }

    /// Distinct labels in ascending order, noise included.
    pub fn distinct(&self) -> BTreeSet<i64> {
        self.labels.iter().copied().collect()
    }

    /// Distinct labels excluding noise.
    pub fn clusters(&self) -> Vec<i64> {
        self.distinct()
            .into_iter()
            .filter(|&l| l != NOISE_LABEL)
            .collect()
    }

    /// Whether any sequence is unclustered.
    pub fn has_noise(&self) -> bool {
        self.labels.contains(&NOISE_LABEL)
    }

    /// Positions of the sequences carrying `label`.
    pub fn members(&self, label: i64) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Sequence positions grouped by label, labels ascending.
    pub fn groups(&self) -> BTreeMap<i64, Vec<usize>> {
        let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in self.labels.iter().enumerate() {
            groups.entry(label).or_default().push(i);
        }
        groups
    }
}

/// Number of distinct values in a label row, noise counted as a label.
pub fn count_distinct(labels: &[i64]) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}
