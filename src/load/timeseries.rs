//! Chunked loader for the CSR-encoded abundance time series.

use crate::config::DatasetLayout;
use crate::data::AbundanceMatrix;
use crate::error::{Result, TsclustError};
use crate::progress::Progress;
use crate::store::{check_complete, ArrayStore};
use log::{debug, info};
use rayon::prelude::*;
use std::ops::Range;

/// Split `0..total` into consecutive ranges of at most `chunk_size` elements.
///
/// The last range covers the remainder when `total` is not a multiple of
/// `chunk_size`. A zero `chunk_size` is rejected.
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Result<Vec<Range<usize>>> {
    if chunk_size == 0 {
        return Err(TsclustError::InvalidParameter(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    Ok((0..total)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(total))
        .collect())
}

/// Read a non-negative integer dimension scalar.
pub(crate) fn read_dimension(store: &dyn ArrayStore, path: &str) -> Result<usize> {
    let value = store.read_scalar(path)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(TsclustError::Store(format!(
            "dimension '{}' must be a non-negative integer, got {}",
            path, value
        )));
    }
    Ok(value as usize)
}

/// Fill a `total`-element buffer from `path` in chunks of `chunk_size`.
///
/// Chunks cover disjoint slices of the buffer, so they are read in parallel
/// and land in place without reordering.
fn read_chunked<T, F>(
    path: &str,
    total: usize,
    chunk_size: usize,
    progress: &dyn Progress,
    read: F,
) -> Result<Vec<T>>
where
    T: Default + Clone + Send,
    F: Fn(usize, &mut [T]) -> Result<usize> + Sync,
{
    let ranges = chunk_ranges(total, chunk_size)?;
    debug!("{}: {} elements in {} chunks", path, total, ranges.len());

    let mut buf = vec![T::default(); total];
    buf.par_chunks_mut(chunk_size)
        .zip(ranges.par_iter())
        .try_for_each(|(slot, range)| {
            let offset = range.start;
            let n = read(offset, slot)?;
            check_complete(path, offset, slot.len(), n)?;
            debug!("{}: read {} elements at offset {}", path, n, offset);
            progress.advance(n as u64);
            Ok::<(), TsclustError>(())
        })?;
    Ok(buf)
}

fn read_chunked_f64(
    store: &dyn ArrayStore,
    path: &str,
    total: usize,
    chunk_size: usize,
    progress: &dyn Progress,
) -> Result<Vec<f64>> {
    read_chunked(path, total, chunk_size, progress, |offset, out| {
        store.read_f64_into(path, offset, out)
    })
}

fn read_chunked_i64(
    store: &dyn ArrayStore,
    path: &str,
    total: usize,
    chunk_size: usize,
    progress: &dyn Progress,
) -> Result<Vec<i64>> {
    read_chunked(path, total, chunk_size, progress, |offset, out| {
        store.read_i64_into(path, offset, out)
    })
}

/// Convert stored zero-based offsets to in-memory indices.
///
/// This is the only place stored index values become `usize`.
fn to_offsets(path: &str, raw: Vec<i64>) -> Result<Vec<usize>> {
    raw.into_iter()
        .enumerate()
        .map(|(pos, v)| {
            usize::try_from(v).map_err(|_| TsclustError::InvalidCsr {
                array: path.to_string(),
                reason: format!("negative offset {} at position {}", v, pos),
            })
        })
        .collect()
}

fn expect_len(store: &dyn ArrayStore, path: &str, expected: usize) -> Result<()> {
    let actual = store.element_count(path)?;
    if actual != expected {
        return Err(TsclustError::ShapeMismatch {
            array: path.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Load the dense abundance matrix and its column totals.
///
/// Buffers are sized from the declared dimensions and `indptr`, never from
/// the stored lengths of `data` and `indices`; those must agree with the last
/// `indptr` entry.
pub fn load_timeseries(
    store: &dyn ArrayStore,
    layout: &DatasetLayout,
    chunk_size: usize,
    progress: &dyn Progress,
) -> Result<AbundanceMatrix> {
    if chunk_size == 0 {
        return Err(TsclustError::InvalidParameter(
            "chunk_size must be at least 1".to_string(),
        ));
    }

    let n_sequences = read_dimension(store, &layout.n_sequences)?;
    let n_samples = read_dimension(store, &layout.n_samples)?;
    info!(
        "Loading time series: {} sequences x {} samples (chunk size {})",
        n_sequences, n_samples, chunk_size
    );

    expect_len(store, &layout.indptr, n_sequences + 1)?;
    progress.start("indptr", (n_sequences + 1) as u64);
    let indptr = to_offsets(
        &layout.indptr,
        read_chunked_i64(store, &layout.indptr, n_sequences + 1, chunk_size, progress)?,
    )?;
    progress.finish();

    let nnz = indptr[n_sequences];
    expect_len(store, &layout.data, nnz)?;
    expect_len(store, &layout.indices, nnz)?;

    progress.start("timeseries", 2 * nnz as u64);
    let data = read_chunked_f64(store, &layout.data, nnz, chunk_size, progress)?;
    let indices = to_offsets(
        &layout.indices,
        read_chunked_i64(store, &layout.indices, nnz, chunk_size, progress)?,
    )?;
    progress.finish();

    let matrix = AbundanceMatrix::from_csr(n_sequences, n_samples, &data, &indices, &indptr)?;
    info!("Decoded {} non-zero abundances", matrix.nnz());
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, ProgressCounter};
    use crate::store::MemoryStore;

    fn scenario_store() -> MemoryStore {
        let layout = DatasetLayout::default();
        let mut store = MemoryStore::new();
        store.insert_scalar(&layout.n_sequences, 4).unwrap();
        store.insert_scalar(&layout.n_samples, 3).unwrap();
        store.insert_f64(&layout.data, vec![3], vec![1.0, 2.0, 3.0]).unwrap();
        store.insert_i64(&layout.indices, vec![3], vec![0, 2, 1]).unwrap();
        store.insert_i64(&layout.indptr, vec![5], vec![0, 1, 2, 3, 3]).unwrap();
        store
    }

    #[test]
    fn test_chunk_ranges_cover_remainder() {
        assert_eq!(chunk_ranges(10, 4).unwrap(), vec![0..4, 4..8, 8..10]);
        assert_eq!(chunk_ranges(8, 4).unwrap(), vec![0..4, 4..8]);
        assert_eq!(chunk_ranges(3, 10_000).unwrap(), vec![0..3]);
        assert!(chunk_ranges(0, 5).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_ranges_reject_zero_size() {
        assert!(matches!(
            chunk_ranges(5, 0),
            Err(TsclustError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_load_scenario() {
        let store = scenario_store();
        let m = load_timeseries(&store, &DatasetLayout::default(), 10_000, &NoProgress).unwrap();
        assert_eq!(m.n_sequences(), 4);
        assert_eq!(m.n_samples(), 3);
        assert_eq!(m.row(1), vec![0.0, 0.0, 2.0]);
        assert_eq!(m.column_totals(), &[1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let store = scenario_store();
        let layout = DatasetLayout::default();
        let reference = load_timeseries(&store, &layout, 10_000, &NoProgress).unwrap();
        for chunk_size in [1, 2, 3, 4] {
            let m = load_timeseries(&store, &layout, chunk_size, &NoProgress).unwrap();
            assert_eq!(m, reference, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_progress_reports_every_element() {
        let store = scenario_store();
        let counter = ProgressCounter::new();
        load_timeseries(&store, &DatasetLayout::default(), 2, &counter).unwrap();
        assert_eq!(counter.stage(), "timeseries");
        assert_eq!(counter.position(), (6, 6));
        assert!(counter.is_finished());
    }

    #[test]
    fn test_data_length_mismatch_names_array() {
        let layout = DatasetLayout::default();
        let mut store = scenario_store();
        store
            .insert_f64(&layout.data, vec![4], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        match load_timeseries(&store, &layout, 2, &NoProgress) {
            Err(TsclustError::ShapeMismatch { array, expected, actual }) => {
                assert_eq!(array, "timeseries/data");
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_indptr_must_match_declared_sequences() {
        let layout = DatasetLayout::default();
        let mut store = scenario_store();
        store.insert_scalar(&layout.n_sequences, 5).unwrap();
        assert!(matches!(
            load_timeseries(&store, &layout, 2, &NoProgress),
            Err(TsclustError::ShapeMismatch { ref array, .. }) if array == "timeseries/indptr"
        ));
    }

    #[test]
    fn test_negative_index_rejected() {
        let layout = DatasetLayout::default();
        let mut store = scenario_store();
        store.insert_i64(&layout.indices, vec![3], vec![0, -2, 1]).unwrap();
        assert!(matches!(
            load_timeseries(&store, &layout, 2, &NoProgress),
            Err(TsclustError::InvalidCsr { .. })
        ));
    }

    #[test]
    fn test_missing_dataset() {
        let layout = DatasetLayout::default();
        let mut store = scenario_store();
        store.remove(&layout.indices);
        assert!(matches!(
            load_timeseries(&store, &layout, 2, &NoProgress),
            Err(TsclustError::MissingDataset(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let store = scenario_store();
        assert!(load_timeseries(&store, &DatasetLayout::default(), 0, &NoProgress).is_err());
    }
}
