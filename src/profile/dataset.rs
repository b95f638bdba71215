//! Summary profile of a loaded clustering database.

use crate::data::UNCLUSTERED;
use crate::load::Database;
use serde::{Deserialize, Serialize};

/// Shape, sparsity and sample-depth summary of a database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// Where the data was loaded from.
    pub source: String,
    pub n_sequences: usize,
    pub n_samples: usize,
    /// Stored non-zero abundances.
    pub nnz: usize,
    /// Proportion of zero entries in the abundance matrix.
    pub sparsity: f64,
    /// Samples whose column total is zero.
    pub n_zero_total_samples: usize,
    /// Smallest sample total.
    pub min_column_total: f64,
    /// Largest sample total.
    pub max_column_total: f64,
    /// Mean sample total.
    pub mean_column_total: f64,
    /// Sequences without a stable phylogenetic cluster.
    pub n_unclustered: usize,
    /// Sequences with no classified rank at all.
    pub n_unclassified: usize,
    /// Epsilon values with stored labels.
    pub n_epsilons: usize,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    pub epsilon_step: f64,
}

impl DatasetProfile {
    /// Check if the data is highly sparse (> 50% zeros).
    pub fn is_highly_sparse(&self) -> bool {
        self.sparsity > 0.5
    }

    /// Some samples will normalise to all-zero columns.
    pub fn has_empty_samples(&self) -> bool {
        self.n_zero_total_samples > 0
    }
}

impl std::fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset Profile: {}", self.source)?;
        writeln!(f, "  Sequences:            {}", self.n_sequences)?;
        writeln!(f, "  Samples:              {}", self.n_samples)?;
        writeln!(f, "  Non-zero entries:     {}", self.nnz)?;
        writeln!(
            f,
            "  Sparsity:             {:.2}%{}",
            self.sparsity * 100.0,
            if self.is_highly_sparse() { " (highly sparse)" } else { "" }
        )?;
        writeln!(f, "  Zero-total samples:   {}", self.n_zero_total_samples)?;
        writeln!(
            f,
            "  Sample totals:        min {:.1}, mean {:.1}, max {:.1}",
            self.min_column_total, self.mean_column_total, self.max_column_total
        )?;
        writeln!(f, "  Unclustered (phylo):  {}", self.n_unclustered)?;
        writeln!(f, "  Unclassified taxa:    {}", self.n_unclassified)?;
        writeln!(
            f,
            "  Epsilon sweep:        {} values, {} to {} by {}",
            self.n_epsilons, self.epsilon_min, self.epsilon_max, self.epsilon_step
        )?;
        Ok(())
    }
}

/// Profile a loaded database.
pub fn profile_dataset(db: &Database) -> DatasetProfile {
    let totals = db.abundance.column_totals();
    let total_entries = db.n_sequences() * db.n_samples();
    let sparsity = if total_entries > 0 {
        1.0 - db.abundance.nnz() as f64 / total_entries as f64
    } else {
        0.0
    };

    let (min, max, mean) = if totals.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let min = totals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max, totals.iter().sum::<f64>() / totals.len() as f64)
    };

    DatasetProfile {
        source: db.source.clone(),
        n_sequences: db.n_sequences(),
        n_samples: db.n_samples(),
        nnz: db.abundance.nnz(),
        sparsity,
        n_zero_total_samples: totals.iter().filter(|&&t| t == 0.0).count(),
        min_column_total: min,
        max_column_total: max,
        mean_column_total: mean,
        n_unclustered: db
            .sequences
            .iter()
            .filter(|r| r.phylo_cluster == UNCLUSTERED)
            .count(),
        n_unclassified: db
            .sequences
            .iter()
            .filter(|r| r.taxonomy.deepest().is_none())
            .count(),
        n_epsilons: db.sweep.n_steps,
        epsilon_min: db.sweep.min,
        epsilon_max: db.sweep.max,
        epsilon_step: db.sweep.step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AbundanceMatrix, EpsilonSweep, SequenceTable};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn database() -> Database {
        let abundance = AbundanceMatrix::new(DMatrix::from_row_slice(
            2,
            3,
            &[1.0, 0.0, 0.0, 3.0, 0.0, 2.0],
        ));
        let sequences = SequenceTable::from_columns(
            vec!["s0".into(), "s1".into()],
            vec!["k__Bacteria".into(), "k__".into()],
            vec![0, -1],
        )
        .unwrap();
        Database {
            source: "memory".to_string(),
            abundance,
            sequences,
            time: vec![0.0, 1.0, 2.0],
            sweep: EpsilonSweep::new(0.1, 0.3, 0.1, 3).unwrap(),
        }
    }

    #[test]
    fn test_profile() {
        let profile = profile_dataset(&database());
        assert_eq!(profile.nnz, 3);
        assert_relative_eq!(profile.sparsity, 0.5);
        assert_eq!(profile.n_zero_total_samples, 1);
        assert!(profile.has_empty_samples());
        assert_relative_eq!(profile.min_column_total, 0.0);
        assert_relative_eq!(profile.max_column_total, 4.0);
        assert_relative_eq!(profile.mean_column_total, 2.0);
        assert_eq!(profile.n_unclustered, 1);
        assert_eq!(profile.n_unclassified, 1);
        assert_eq!(profile.n_epsilons, 3);
    }

    #[test]
    fn test_display() {
        let text = profile_dataset(&database()).to_string();
        assert!(text.contains("Sequences:            2"));
        assert!(text.contains("Sparsity:             50.00%\n"));
    }

    #[test]
    fn test_display_flags_high_sparsity() {
        let mut profile = profile_dataset(&database());
        assert!(!profile.is_highly_sparse());
        profile.sparsity = 0.9;
        assert!(profile.is_highly_sparse());
        assert!(profile
            .to_string()
            .contains("Sparsity:             90.00% (highly sparse)"));
    }
}
