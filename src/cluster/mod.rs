//! Time-series cluster selection and epsilon sweeps.

mod select;
mod summary;
mod sweep;

pub use select::select_clusters;
pub use summary::{summarize_clusters, ClusterSummary};
pub use sweep::{sweep_counts, SweepPoint};
