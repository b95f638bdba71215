//! Shared fixtures for integration tests.

#![allow(dead_code)]

use tsclust::prelude::*;

/// Four sequences, three samples, three epsilon values.
///
/// Abundances decode to rows [1,0,0], [0,0,2], [0,3,0], [0,0,0].
pub fn scenario_store() -> MemoryStore {
    let layout = DatasetLayout::default();
    let mut store = MemoryStore::new();
    store.insert_scalar(&layout.n_sequences, 4).unwrap();
    store.insert_scalar(&layout.n_samples, 3).unwrap();
    store.insert_f64(&layout.data, vec![3], vec![1.0, 2.0, 3.0]).unwrap();
    store.insert_i64(&layout.indices, vec![3], vec![0, 2, 1]).unwrap();
    store.insert_i64(&layout.indptr, vec![5], vec![0, 1, 2, 3, 3]).unwrap();
    store.insert_f64(&layout.time, vec![3], vec![0.0, 7.0, 14.0]).unwrap();
    store
        .insert_strings(
            &layout.taxonomy,
            vec![
                "k__Bacteria; p__Firmicutes; c__Bacilli".to_string(),
                "k__Bacteria; p__Firmicutes; c__Clostridia".to_string(),
                "k__Bacteria; p__Proteobacteria".to_string(),
                "k__Bacteria; p__; c__".to_string(),
            ],
        )
        .unwrap();
    store
        .insert_i64(&layout.phylo_clusters, vec![4], vec![0, 0, 1, -1])
        .unwrap();
    store
        .insert_strings(
            &layout.sequence_ids,
            (0..4).map(|i| format!("seq{}", i)).collect(),
        )
        .unwrap();
    // eps 0.1: {0,1} {2} noise {3}; eps 0.2: {0,1,2} noise {3}; eps 0.3: all one cluster
    store
        .insert_i64(
            &layout.clusters,
            vec![3, 4],
            vec![0, 0, 1, -1, 0, 0, 0, -1, 0, 0, 0, 0],
        )
        .unwrap();
    store.set_attr(&layout.clusters, &layout.param_min, 0.1).unwrap();
    store.set_attr(&layout.clusters, &layout.param_max, 0.3).unwrap();
    store.set_attr(&layout.clusters, &layout.param_step, 0.1).unwrap();
    store
}

/// Wraps a store and drops the last element of every ranged read of one dataset.
pub struct ShortReadStore {
    pub inner: MemoryStore,
    pub truncated: String,
}

impl ShortReadStore {
    fn trim(&self, path: &str, n: usize) -> usize {
        if path == self.truncated {
            n.saturating_sub(1)
        } else {
            n
        }
    }
}

impl ArrayStore for ShortReadStore {
    fn describe(&self) -> String {
        "short-read".to_string()
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        self.inner.shape(path)
    }

    fn read_scalar(&self, path: &str) -> Result<f64> {
        self.inner.read_scalar(path)
    }

    fn read_f64_into(&self, path: &str, offset: usize, out: &mut [f64]) -> Result<usize> {
        let n = self.inner.read_f64_into(path, offset, out)?;
        Ok(self.trim(path, n))
    }

    fn read_i64_into(&self, path: &str, offset: usize, out: &mut [i64]) -> Result<usize> {
        let n = self.inner.read_i64_into(path, offset, out)?;
        Ok(self.trim(path, n))
    }

    fn read_strings(&self, path: &str) -> Result<Vec<String>> {
        self.inner.read_strings(path)
    }

    fn read_i64_row(&self, path: &str, row: usize) -> Result<Vec<i64>> {
        self.inner.read_i64_row(path, row)
    }

    fn read_attr(&self, path: &str, name: &str) -> Result<f64> {
        self.inner.read_attr(path, name)
    }
}
