//! Counting clusters across the whole epsilon sweep.

use super::select::read_label_row;
use crate::config::DatasetLayout;
use crate::data::{count_distinct, EpsilonSweep, NOISE_LABEL};
use crate::error::Result;
use crate::progress::Progress;
use crate::store::ArrayStore;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Cluster count at one epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub epsilon: f64,
    /// Distinct labels in the row; the noise label counts as one.
    pub clusters: usize,
    /// Whether the noise label occurs in the row.
    pub has_noise: bool,
}

impl SweepPoint {
    /// Distinct labels excluding noise.
    pub fn clusters_excluding_noise(&self) -> usize {
        self.clusters - usize::from(self.has_noise)
    }
}

/// Count distinct labels for every epsilon in the sweep.
///
/// Rows are read in parallel; the result is in epsilon order.
pub fn sweep_counts(
    store: &dyn ArrayStore,
    layout: &DatasetLayout,
    sweep: &EpsilonSweep,
    n_sequences: usize,
    progress: &dyn Progress,
) -> Result<Vec<SweepPoint>> {
    progress.start("sweep", sweep.n_steps as u64);
    let points = (0..sweep.n_steps)
        .into_par_iter()
        .map(|row| {
            let labels = read_label_row(store, layout, row, n_sequences)?;
            progress.advance(1);
            Ok(SweepPoint {
                epsilon: sweep.epsilon(row),
                clusters: count_distinct(&labels),
                has_noise: labels.contains(&NOISE_LABEL),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish();

    info!("Counted clusters for {} epsilon values", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, ProgressCounter};
    use crate::store::MemoryStore;

    fn sweep_store() -> (MemoryStore, EpsilonSweep) {
        let layout = DatasetLayout::default();
        let mut store = MemoryStore::new();
        #[rustfmt::skip]
        let labels = vec![
            -1, -1, -1, -1,
             0,  0,  1, -1,
             0,  1,  2,  3,
             0,  0,  0,  0,
        ];
        store.insert_i64(&layout.clusters, vec![4, 4], labels).unwrap();
        (store, EpsilonSweep::new(0.1, 0.4, 0.1, 4).unwrap())
    }

    #[test]
    fn test_counts_in_epsilon_order() {
        let (store, sweep) = sweep_store();
        let points = sweep_counts(&store, &DatasetLayout::default(), &sweep, 4, &NoProgress).unwrap();
        assert_eq!(points.len(), sweep.n_steps);
        let counts: Vec<usize> = points.iter().map(|p| p.clusters).collect();
        assert_eq!(counts, vec![1, 3, 4, 1]);
        assert!(points[0].has_noise);
        assert_eq!(points[0].clusters_excluding_noise(), 0);
        assert_eq!(points[1].clusters_excluding_noise(), 2);
        assert_eq!(points[2].clusters_excluding_noise(), 4);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.epsilon, sweep.epsilon(i));
        }
    }

    #[test]
    fn test_progress_counts_rows() {
        let (store, sweep) = sweep_store();
        let counter = ProgressCounter::new();
        sweep_counts(&store, &DatasetLayout::default(), &sweep, 4, &counter).unwrap();
        assert_eq!(counter.position(), (4, 4));
        assert!(counter.is_finished());
    }
}
