//! Taxonomic diversity of time-series clusters.

mod simpson;

pub use simpson::{
    diversity_by_level, diversity_rank, simpson_for_rank, simpson_index, ClusterDiversity,
    DiversityReport, LevelDiversity,
};
