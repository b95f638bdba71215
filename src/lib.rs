//! Time-Series Clustering Explorer Core
//!
//! This library loads a precomputed time-series clustering database and
//! answers the questions an interactive explorer asks of it: which sequences
//! cluster together at a given epsilon, how their abundances look under
//! different normalisations, how the number of clusters changes across the
//! epsilon sweep, and how taxonomically diverse each cluster is.
//!
//! # Overview
//!
//! The library is organized into modules, leaf-first:
//!
//! - **store**: Named-array storage backends (JSON in memory, optional HDF5)
//! - **data**: Core data structures (AbundanceMatrix, SequenceTable, ClusterLabels)
//! - **load**: Chunked sparse time-series loader and metadata loader
//! - **cluster**: Epsilon selection, sweep counts and cluster summaries
//! - **normalize**: Raw, by-column, by-row and double normalisation views
//! - **diversity**: Simpson diversity per taxonomic rank and cluster
//! - **export**: Cluster and wide time-series tables
//! - **session**: Loaded state with memoised results and atomic reload
//!
//! # Example
//!
//! ```no_run
//! use tsclust::prelude::*;
//!
//! let session = Session::open("clusters.h5").unwrap();
//! let eps = session.sweep().epsilon(3);
//! let labels = session.select_epsilon(eps).unwrap();
//!
//! let cluster = labels.clusters()[0];
//! let views = session
//!     .normalize_subset(&RowFilter::TimeCluster(cluster))
//!     .unwrap();
//! let depth_normalised = views.view(View::ByColumn);
//!
//! let diversity = session.diversity_by_level(eps).unwrap();
//! ```

pub mod cluster;
pub mod config;
pub mod data;
pub mod diversity;
pub mod error;
pub mod export;
pub mod load;
pub mod normalize;
pub mod profile;
pub mod progress;
pub mod session;
pub mod store;
pub mod synthetic;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cluster::{
        select_clusters, summarize_clusters, sweep_counts, ClusterSummary, SweepPoint,
    };
    pub use crate::config::{DatasetLayout, SessionConfig};
    pub use crate::data::{
        decode_csr, AbundanceMatrix, ClusterLabels, EpsilonSweep, Rank, SequenceRecord,
        SequenceTable, Taxonomy, NOISE_LABEL, UNCLUSTERED,
    };
    pub use crate::diversity::{
        diversity_by_level, simpson_for_rank, simpson_index, DiversityReport, LevelDiversity,
    };
    pub use crate::error::{Result, TsclustError};
    pub use crate::export::{cluster_table, wide_table, ClusterTable, Delimiter, WideTable};
    pub use crate::load::{load_database, load_timeseries, Database};
    pub use crate::normalize::{normalize_rows, NormalizationResult, View};
    pub use crate::profile::{profile_dataset, DatasetProfile};
    pub use crate::progress::{NoProgress, Progress, ProgressCounter};
    pub use crate::session::{RowFilter, Session};
    pub use crate::store::{open_store, ArrayStore, MemoryStore};
    pub use crate::synthetic::{generate_synthetic, SyntheticConfig};
}
