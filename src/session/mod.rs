//! Exploration sessions over a loaded clustering database.

mod filter;
mod state;

pub use filter::RowFilter;
pub use state::Session;
