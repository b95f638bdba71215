//! Dense abundance matrix reconstructed from a CSR-encoded time series.

use crate::error::{Result, TsclustError};
use nalgebra::DMatrix;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

/// Decode a CSR triple into a dense `n_rows × n_cols` matrix.
///
/// Row `r` holds `data[indptr[r]..indptr[r + 1]]` at the columns listed in
/// `indices[indptr[r]..indptr[r + 1]]`; every other position is zero.
/// Offsets and column indices are zero-based. Duplicate entries are summed.
pub fn decode_csr(
    n_rows: usize,
    n_cols: usize,
    data: &[f64],
    indices: &[usize],
    indptr: &[usize],
) -> Result<DMatrix<f64>> {
    let sparse = build_csr(n_rows, n_cols, data, indices, indptr)?;
    let mut dense = DMatrix::zeros(n_rows, n_cols);
    for (row, row_vec) in sparse.outer_iterator().enumerate() {
        for (col, &val) in row_vec.iter() {
            dense[(row, col)] = val;
        }
    }
    Ok(dense)
}

/// Validate a CSR triple and assemble it as a sparse matrix.
fn build_csr(
    n_rows: usize,
    n_cols: usize,
    data: &[f64],
    indices: &[usize],
    indptr: &[usize],
) -> Result<CsMat<f64>> {
    if indptr.len() != n_rows + 1 {
        return Err(TsclustError::ShapeMismatch {
            array: "indptr".to_string(),
            expected: n_rows + 1,
            actual: indptr.len(),
        });
    }
    if indptr[0] != 0 {
        return Err(TsclustError::InvalidCsr {
            array: "indptr".to_string(),
            reason: format!("first offset is {}, expected 0", indptr[0]),
        });
    }
    if let Some(r) = indptr.windows(2).position(|w| w[1] < w[0]) {
        return Err(TsclustError::InvalidCsr {
            array: "indptr".to_string(),
            reason: format!("offsets decrease between rows {} and {}", r, r + 1),
        });
    }

    let nnz = indptr[n_rows];
    if data.len() != nnz {
        return Err(TsclustError::ShapeMismatch {
            array: "data".to_string(),
            expected: nnz,
            actual: data.len(),
        });
    }
    if indices.len() != nnz {
        return Err(TsclustError::ShapeMismatch {
            array: "indices".to_string(),
            expected: nnz,
            actual: indices.len(),
        });
    }
    if let Some(pos) = indices.iter().position(|&c| c >= n_cols) {
        return Err(TsclustError::InvalidCsr {
            array: "indices".to_string(),
            reason: format!(
                "column {} at position {} exceeds {} samples",
                indices[pos], pos, n_cols
            ),
        });
    }
    if let Some(pos) = data.iter().position(|v| !v.is_finite() || *v < 0.0) {
        return Err(TsclustError::InvalidCsr {
            array: "data".to_string(),
            reason: format!("abundance {} at position {} is negative or not finite", data[pos], pos),
        });
    }

    let mut tri_mat = TriMat::with_capacity((n_rows, n_cols), nnz);
    for row in 0..n_rows {
        for k in indptr[row]..indptr[row + 1] {
            tri_mat.add_triplet(row, indices[k], data[k]);
        }
    }
    Ok(tri_mat.to_csr())
}

/// Sequences × samples abundance matrix with its per-sample totals.
///
/// Immutable after construction; the column totals always describe the full
/// matrix, never a subset of it.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceMatrix {
    values: DMatrix<f64>,
    column_totals: Vec<f64>,
    nnz: usize,
}

impl AbundanceMatrix {
    /// Wrap a dense matrix, computing column totals.
    pub fn new(values: DMatrix<f64>) -> Self {
        let column_totals = column_sums(&values);
        let nnz = values.iter().filter(|&&v| v != 0.0).count();
        Self {
            values,
            column_totals,
            nnz,
        }
    }

    /// Decode a CSR triple (see [`decode_csr`]).
    pub fn from_csr(
        n_sequences: usize,
        n_samples: usize,
        data: &[f64],
        indices: &[usize],
        indptr: &[usize],
    ) -> Result<Self> {
        let values = decode_csr(n_sequences, n_samples, data, indices, indptr)?;
        Ok(Self::new(values))
    }

    /// Number of sequences (rows).
    #[inline]
    pub fn n_sequences(&self) -> usize {
        self.values.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Value at (sequence, sample).
    #[inline]
    pub fn get(&self, sequence: usize, sample: usize) -> f64 {
        self.values[(sequence, sample)]
    }

    /// Per-sample totals over all sequences.
    #[inline]
    pub fn column_totals(&self) -> &[f64] {
        &self.column_totals
    }

    /// Underlying dense matrix.
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// One sequence's time series.
    pub fn row(&self, sequence: usize) -> Vec<f64> {
        self.values.row(sequence).iter().copied().collect()
    }

    /// Total abundance per sequence.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_sequences())
            .into_par_iter()
            .map(|r| self.values.row(r).sum())
            .collect()
    }

    /// Copy the given rows, in order, into a `rows.len() × n_samples` matrix.
    ///
    /// Always two-dimensional: one row yields a `1 × n_samples` matrix and an
    /// empty selection yields `0 × n_samples`.
    pub fn select_rows(&self, rows: &[usize]) -> Result<DMatrix<f64>> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_sequences()) {
            return Err(TsclustError::InvalidParameter(format!(
                "sequence index {} out of bounds for {} sequences",
                bad,
                self.n_sequences()
            )));
        }
        Ok(self.values.select_rows(rows.iter()))
    }
}

fn column_sums(values: &DMatrix<f64>) -> Vec<f64> {
    (0..values.ncols()).map(|j| values.column(j).sum()).collect()
}
