//! Core data structures for exploring a clustering database.

mod abundance;
mod labels;
mod sequence;
mod sweep;

pub use abundance::{decode_csr, AbundanceMatrix};
pub use labels::{count_distinct, ClusterLabels, NOISE_LABEL};
pub use sequence::{Rank, SequenceRecord, SequenceTable, Taxonomy, TAXONOMY_DELIMITER, UNCLUSTERED};
pub use sweep::{EpsilonSweep, ALIGNMENT_TOLERANCE};
