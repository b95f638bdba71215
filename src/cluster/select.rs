//! Mapping an epsilon to its row of the label matrix.

use crate::config::DatasetLayout;
use crate::data::{ClusterLabels, EpsilonSweep};
use crate::error::{Result, TsclustError};
use crate::store::ArrayStore;
use log::debug;

/// Read one label row and check it covers every sequence.
pub(crate) fn read_label_row(
    store: &dyn ArrayStore,
    layout: &DatasetLayout,
    row: usize,
    n_sequences: usize,
) -> Result<Vec<i64>> {
    let labels = store.read_i64_row(&layout.clusters, row)?;
    if labels.len() != n_sequences {
        return Err(TsclustError::ShapeMismatch {
            array: layout.clusters.clone(),
            expected: n_sequences,
            actual: labels.len(),
        });
    }
    Ok(labels)
}

/// Cluster labels of every sequence at `epsilon`.
///
/// The epsilon is validated against the sweep grid before anything is read.
pub fn select_clusters(
    store: &dyn ArrayStore,
    layout: &DatasetLayout,
    sweep: &EpsilonSweep,
    n_sequences: usize,
    epsilon: f64,
) -> Result<ClusterLabels> {
    let row = sweep.row_for(epsilon)?;
    debug!("epsilon {} -> label row {}", epsilon, row);
    let labels = read_label_row(store, layout, row, n_sequences)?;
    Ok(ClusterLabels::new(sweep.epsilon(row), row, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn label_store() -> (MemoryStore, EpsilonSweep) {
        let layout = DatasetLayout::default();
        let mut store = MemoryStore::new();
        // Row k labels every sequence with k so the row read is visible
        let labels: Vec<i64> = (0..4).flat_map(|k| vec![k as i64; 3]).collect();
        store.insert_i64(&layout.clusters, vec![4, 3], labels).unwrap();
        (store, EpsilonSweep::new(1.0, 2.5, 0.5, 4).unwrap())
    }

    #[test]
    fn test_aligned_epsilon_reads_its_row() {
        let (store, sweep) = label_store();
        let layout = DatasetLayout::default();
        for k in 0..4 {
            let eps = 1.0 + k as f64 * 0.5;
            let labels = select_clusters(&store, &layout, &sweep, 3, eps).unwrap();
            assert_eq!(labels.row, k);
            assert_eq!(labels.as_slice(), &[k as i64; 3]);
            assert_eq!(labels.epsilon, eps);
        }
    }

    #[test]
    fn test_unaligned_epsilon_rejected() {
        let (store, sweep) = label_store();
        let layout = DatasetLayout::default();
        for eps in [1.25, 0.5, 3.0] {
            let err = select_clusters(&store, &layout, &sweep, 3, eps).unwrap_err();
            assert!(err.is_invalid_input());
        }
    }

    #[test]
    fn test_row_width_checked() {
        let (store, sweep) = label_store();
        let result = select_clusters(&store, &DatasetLayout::default(), &sweep, 5, 1.0);
        assert!(matches!(result, Err(TsclustError::ShapeMismatch { .. })));
    }
}
