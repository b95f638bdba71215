//! Normalisation of sequence subsets.
//!
//! - **raw**: abundances as stored
//! - **by_column**: sequencing-depth normalisation against dataset-wide sample totals
//! - **by_row**: each time series scaled to sum to one
//! - **double**: depth normalisation followed by series scaling

mod views;

pub use views::{norm_by_column, norm_by_row, norm_double, normalize_rows, NormalizationResult, View};
