//! Tabular exports of a selected time-series cluster.
//!
//! Two shapes are produced for a cluster label at the current epsilon:
//!
//! - **cluster table**: one row per member sequence with its identifier,
//!   summed abundance, taxonomy, phylogenetic cluster and time-series cluster
//! - **wide table**: the cluster table with the raw time series appended,
//!   one column per sample headed by its time value

mod table;

pub use table::{
    cluster_table, wide_table, write_matrix, ClusterRow, ClusterTable, Delimiter, WideTable,
};
