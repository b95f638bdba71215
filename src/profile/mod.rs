//! Data profiling for loaded clustering databases.

mod dataset;

pub use dataset::{profile_dataset, DatasetProfile};
