//! Raw, depth-normalised, series-normalised and doubly normalised views of a
//! sequence subset.

use crate::data::AbundanceMatrix;
use crate::error::{Result, TsclustError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which normalisation of a subset to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Abundances as stored.
    Raw,
    /// Divided by the per-sample totals of the whole dataset.
    ByColumn,
    /// Each series divided by its own sum.
    ByRow,
    /// `ByColumn`, then each series divided by its own sum.
    Double,
}

impl View {
    pub const ALL: [View; 4] = [View::Raw, View::ByColumn, View::ByRow, View::Double];

    pub fn name(&self) -> &'static str {
        match self {
            View::Raw => "raw",
            View::ByColumn => "by_column",
            View::ByRow => "by_row",
            View::Double => "double",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = TsclustError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "raw" => Ok(View::Raw),
            "by_column" | "column" | "sample" => Ok(View::ByColumn),
            "by_row" | "row" | "sequence" => Ok(View::ByRow),
            "double" | "both" => Ok(View::Double),
            _ => Err(TsclustError::InvalidParameter(format!(
                "unknown normalisation '{}'",
                s
            ))),
        }
    }
}

/// The four views of a row subset, each `rows.len() × n_samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationResult {
    /// Sequence positions of the subset, in output row order.
    pub rows: Vec<usize>,
    pub raw: DMatrix<f64>,
    pub by_column: DMatrix<f64>,
    pub by_row: DMatrix<f64>,
    pub double: DMatrix<f64>,
}

impl NormalizationResult {
    /// Matrix for a view.
    pub fn view(&self, view: View) -> &DMatrix<f64> {
        match view {
            View::Raw => &self.raw,
            View::ByColumn => &self.by_column,
            View::ByRow => &self.by_row,
            View::Double => &self.double,
        }
    }

    /// Number of sequences in the subset.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Replace NaN and infinite entries with zero.
fn zero_non_finite(mut m: DMatrix<f64>) -> DMatrix<f64> {
    m.iter_mut().filter(|v| !v.is_finite()).for_each(|v| *v = 0.0);
    m
}

/// Divide each row by its own sum.
///
/// Rows summing to zero come out as NaN; nothing is guarded.
pub fn norm_by_row(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    for mut row in out.row_iter_mut() {
        let total = row.sum();
        row /= total;
    }
    out
}

/// Divide each column by the matching dataset-wide sample total.
///
/// Entries that become NaN or infinite (zero totals) are set to zero.
pub fn norm_by_column(m: &DMatrix<f64>, column_totals: &[f64]) -> Result<DMatrix<f64>> {
    if column_totals.len() != m.ncols() {
        return Err(TsclustError::ShapeMismatch {
            array: "column_totals".to_string(),
            expected: m.ncols(),
            actual: column_totals.len(),
        });
    }
    let mut out = m.clone();
    for (j, mut col) in out.column_iter_mut().enumerate() {
        col /= column_totals[j];
    }
    Ok(zero_non_finite(out))
}

/// Depth-normalise, then scale each series to sum to one; non-finite entries
/// become zero.
pub fn norm_double(m: &DMatrix<f64>, column_totals: &[f64]) -> Result<DMatrix<f64>> {
    let by_column = norm_by_column(m, column_totals)?;
    Ok(rescale_rows_guarded(&by_column))
}

fn rescale_rows_guarded(by_column: &DMatrix<f64>) -> DMatrix<f64> {
    zero_non_finite(norm_by_row(by_column))
}

/// Compute all four views for the given sequence positions.
///
/// An empty selection returns `0 × n_samples` matrices.
pub fn normalize_rows(abundance: &AbundanceMatrix, rows: &[usize]) -> Result<NormalizationResult> {
    let raw = abundance.select_rows(rows)?;
    let totals = abundance.column_totals();
    let by_column = norm_by_column(&raw, totals)?;
    let by_row = norm_by_row(&raw);
    let double = rescale_rows_guarded(&by_column);

    Ok(NormalizationResult {
        rows: rows.to_vec(),
        raw,
        by_column,
        by_row,
        double,
    })
}
