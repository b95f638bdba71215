//! Loading a clustering database into memory.

mod metadata;
mod timeseries;

pub use metadata::{load_metadata, load_sweep, DatasetMetadata};
pub use timeseries::{chunk_ranges, load_timeseries};

use crate::config::SessionConfig;
use crate::data::{AbundanceMatrix, EpsilonSweep, SequenceTable};
use crate::error::Result;
use crate::progress::Progress;
use crate::store::ArrayStore;
use log::info;
use timeseries::read_dimension;

/// Everything read from a database in one load.
///
/// Rows of `abundance`, entries of `sequences` and every label vector read
/// later share the same sequence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    /// Description of the source the data came from.
    pub source: String,
    pub abundance: AbundanceMatrix,
    pub sequences: SequenceTable,
    pub time: Vec<f64>,
    pub sweep: EpsilonSweep,
}

impl Database {
    #[inline]
    pub fn n_sequences(&self) -> usize {
        self.abundance.n_sequences()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.abundance.n_samples()
    }
}

/// Load the abundance matrix and all metadata from a store.
pub fn load_database(
    store: &dyn ArrayStore,
    config: &SessionConfig,
    progress: &dyn Progress,
) -> Result<Database> {
    config.validate()?;
    let layout = &config.layout;
    info!("Loading database from {}", store.describe());

    let n_sequences = read_dimension(store, &layout.n_sequences)?;
    let n_samples = read_dimension(store, &layout.n_samples)?;

    let meta = load_metadata(store, layout, n_sequences, n_samples)?;
    let abundance = load_timeseries(store, layout, config.chunk_size, progress)?;

    Ok(Database {
        source: store.describe(),
        abundance,
        sequences: meta.sequences,
        time: meta.time,
        sweep: meta.sweep,
    })
}
