//! Epsilon sweep parameters and the epsilon → label-row mapping.

use crate::error::{Result, TsclustError};
use serde::{Deserialize, Serialize};

/// Relative tolerance (in units of `step`) when matching an epsilon to a row.
pub const ALIGNMENT_TOLERANCE: f64 = 1e-6;

/// The discrete epsilon values a clustering was computed for.
///
/// Row `i` of the label matrix holds the clustering at `min + i * step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSweep {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Number of label rows (P).
    pub n_steps: usize,
}

impl EpsilonSweep {
    /// Create a sweep, checking the parameters are usable.
    pub fn new(min: f64, max: f64, step: f64, n_steps: usize) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(TsclustError::Store(format!(
                "sweep parameters must be finite (min={}, max={}, step={})",
                min, max, step
            )));
        }
        if step <= 0.0 {
            return Err(TsclustError::Store(format!(
                "sweep step must be positive, got {}",
                step
            )));
        }
        if max < min {
            return Err(TsclustError::Store(format!(
                "sweep max {} is below min {}",
                max, min
            )));
        }
        Ok(Self {
            min,
            max,
            step,
            n_steps,
        })
    }

    /// Number of rows implied by `min`, `max` and `step` alone.
    pub fn implied_steps(&self) -> usize {
        ((self.max - self.min) / self.step).round() as usize + 1
    }

    /// Epsilon of row `i`.
    #[inline]
    pub fn epsilon(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step
    }

    /// All epsilon values in row order.
    pub fn epsilons(&self) -> Vec<f64> {
        (0..self.n_steps).map(|i| self.epsilon(i)).collect()
    }

    /// Row holding the clustering for `epsilon`.
    ///
    /// Values off the `min + k * step` grid, or outside the stored rows and
    /// `[min, max]`, are rejected rather than snapped to a neighbouring row.
    pub fn row_for(&self, epsilon: f64) -> Result<usize> {
        let invalid = || TsclustError::InvalidEpsilon {
            value: epsilon,
            min: self.min,
            max: self.max,
            step: self.step,
        };

        if !epsilon.is_finite() {
            return Err(invalid());
        }
        let k = (epsilon - self.min) / self.step;
        let i = k.round();
        if (k - i).abs() > ALIGNMENT_TOLERANCE || i < 0.0 {
            return Err(invalid());
        }
        if epsilon > self.max + ALIGNMENT_TOLERANCE * self.step {
            return Err(invalid());
        }
        let row = i as usize;
        if row >= self.n_steps {
            return Err(invalid());
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep() -> EpsilonSweep {
        EpsilonSweep::new(0.1, 0.5, 0.1, 5).unwrap()
    }

    #[test]
    fn test_grid_values_map_to_rows() {
        let s = sweep();
        for k in 0..5 {
            assert_eq!(s.row_for(s.epsilon(k)).unwrap(), k);
        }
        // Decimal literals that are not bit-identical to min + k * step
        assert_eq!(s.row_for(0.3).unwrap(), 2);
        assert_eq!(s.row_for(0.5).unwrap(), 4);
    }

    #[test]
    fn test_off_grid_rejected() {
        let s = sweep();
        for bad in [0.15, 0.0, 0.6, -0.1, f64::NAN, f64::INFINITY, 0.10001] {
            assert!(
                matches!(s.row_for(bad), Err(TsclustError::InvalidEpsilon { .. })),
                "{} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_rows_bounded_by_label_matrix() {
        // Parameters imply 5 rows but only 3 were stored
        let s = EpsilonSweep::new(0.1, 0.5, 0.1, 3).unwrap();
        assert_eq!(s.implied_steps(), 5);
        assert!(s.row_for(0.3).is_ok());
        assert!(s.row_for(0.4).is_err());
        assert_eq!(s.epsilons().len(), 3);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(EpsilonSweep::new(0.1, 0.5, 0.0, 5).is_err());
        assert!(EpsilonSweep::new(0.5, 0.1, 0.1, 5).is_err());
        assert!(EpsilonSweep::new(f64::NAN, 0.5, 0.1, 5).is_err());
    }
}
