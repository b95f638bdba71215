//! Loader for the small, fully resident per-sequence and per-sample arrays.

use crate::config::DatasetLayout;
use crate::data::{EpsilonSweep, SequenceTable};
use crate::error::{Result, TsclustError};
use crate::store::ArrayStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Metadata accompanying the abundance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Per-sequence records, index-aligned with the matrix rows.
    pub sequences: SequenceTable,
    /// Collection time of each sample.
    pub time: Vec<f64>,
    /// Epsilon values the label matrix was computed for.
    pub sweep: EpsilonSweep,
}

fn expect_count(array: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(TsclustError::ShapeMismatch {
            array: array.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Read the sweep parameters stored as attributes of the label matrix.
pub fn load_sweep(store: &dyn ArrayStore, layout: &DatasetLayout, n_sequences: usize) -> Result<EpsilonSweep> {
    let shape = store.shape(&layout.clusters)?;
    if shape.len() != 2 {
        return Err(TsclustError::ShapeMismatch {
            array: layout.clusters.clone(),
            expected: 2,
            actual: shape.len(),
        });
    }
    expect_count(&layout.clusters, n_sequences, shape[1])?;

    let min = store.read_attr(&layout.clusters, &layout.param_min)?;
    let max = store.read_attr(&layout.clusters, &layout.param_max)?;
    let step = store.read_attr(&layout.clusters, &layout.param_step)?;
    let sweep = EpsilonSweep::new(min, max, step, shape[0])?;

    if sweep.implied_steps() != sweep.n_steps {
        warn!(
            "Sweep parameters (min={}, max={}, step={}) imply {} epsilon values but '{}' has {} rows",
            min,
            max,
            step,
            sweep.implied_steps(),
            layout.clusters,
            sweep.n_steps
        );
    }
    Ok(sweep)
}

/// Load sequence metadata, sample times and sweep parameters.
///
/// Every array must exist and match the declared dimensions.
pub fn load_metadata(
    store: &dyn ArrayStore,
    layout: &DatasetLayout,
    n_sequences: usize,
    n_samples: usize,
) -> Result<DatasetMetadata> {
    let time = store.read_f64_all(&layout.time)?;
    expect_count(&layout.time, n_samples, time.len())?;

    let taxonomy = store.read_strings(&layout.taxonomy)?;
    expect_count(&layout.taxonomy, n_sequences, taxonomy.len())?;

    let ids = store.read_strings(&layout.sequence_ids)?;
    expect_count(&layout.sequence_ids, n_sequences, ids.len())?;

    let phylo = store.read_i64_all(&layout.phylo_clusters)?;
    expect_count(&layout.phylo_clusters, n_sequences, phylo.len())?;

    let sequences = SequenceTable::from_columns(ids, taxonomy, phylo)?;
    let sweep = load_sweep(store, layout, n_sequences)?;

    info!(
        "Loaded metadata: {} sequences, {} time points, {} epsilon values in [{}, {}]",
        sequences.len(),
        time.len(),
        sweep.n_steps,
        sweep.min,
        sweep.max
    );

    Ok(DatasetMetadata {
        sequences,
        time,
        sweep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Rank;
    use crate::store::MemoryStore;

    fn metadata_store() -> MemoryStore {
        let layout = DatasetLayout::default();
        let mut store = MemoryStore::new();
        store.insert_f64(&layout.time, vec![3], vec![0.0, 7.0, 14.0]).unwrap();
        store
            .insert_strings(
                &layout.taxonomy,
                vec!["k__Bacteria;p__Firmicutes".into(), "k__Bacteria;p__".into()],
            )
            .unwrap();
        store
            .insert_strings(&layout.sequence_ids, vec!["ASV1".into(), "ASV2".into()])
            .unwrap();
        store.insert_i64(&layout.phylo_clusters, vec![2], vec![3, -1]).unwrap();
        store
            .insert_i64(&layout.clusters, vec![3, 2], vec![0, 0, 0, -1, 1, -1])
            .unwrap();
        store.set_attr(&layout.clusters, "param_min", 0.5).unwrap();
        store.set_attr(&layout.clusters, "param_max", 1.5).unwrap();
        store.set_attr(&layout.clusters, "param_step", 0.5).unwrap();
        store
    }

    #[test]
    fn test_load_metadata() {
        let store = metadata_store();
        let meta = load_metadata(&store, &DatasetLayout::default(), 2, 3).unwrap();
        assert_eq!(meta.time, vec![0.0, 7.0, 14.0]);
        assert_eq!(meta.sequences.len(), 2);
        assert_eq!(meta.sequences.get(0).unwrap().id, "ASV1");
        assert_eq!(
            meta.sequences.get(0).unwrap().taxonomy.at(Rank::Phylum),
            Some("p__Firmicutes")
        );
        assert_eq!(meta.sequences.get(1).unwrap().phylo_cluster, -1);
        assert_eq!(meta.sweep.n_steps, 3);
        assert_eq!(meta.sweep.epsilon(2), 1.5);
    }

    #[test]
    fn test_sweep_requires_attributes() {
        let layout = DatasetLayout::default();
        let mut store = metadata_store();
        store
            .get_mut(&layout.clusters)
            .unwrap()
            .attrs
            .remove("param_step");
        assert!(matches!(
            load_metadata(&store, &layout, 2, 3),
            Err(TsclustError::MissingAttribute { ref attr, .. }) if attr == "param_step"
        ));
    }

    #[test]
    fn test_time_length_mismatch() {
        let store = metadata_store();
        assert!(matches!(
            load_metadata(&store, &DatasetLayout::default(), 2, 4),
            Err(TsclustError::ShapeMismatch { ref array, .. }) if array == "samples/time"
        ));
    }

    #[test]
    fn test_label_matrix_width_checked() {
        let layout = DatasetLayout::default();
        let mut store = metadata_store();
        store.insert_i64(&layout.clusters, vec![2, 3], vec![0; 6]).unwrap();
        assert!(matches!(
            load_sweep(&store, &layout, 2),
            Err(TsclustError::ShapeMismatch { ref array, .. }) if array == "genes/clusters"
        ));
    }

    #[test]
    fn test_missing_taxonomy() {
        let layout = DatasetLayout::default();
        let mut store = metadata_store();
        store.remove(&layout.taxonomy);
        assert!(matches!(
            load_metadata(&store, &layout, 2, 3),
            Err(TsclustError::MissingDataset(_))
        ));
    }
}
