//! Named-array storage backends for clustering databases.
//!
//! A clustering database is a container of named arrays addressed by
//! slash-separated paths (`timeseries/data`, `genes/clusters`, ...), some of
//! which carry numeric attributes. The loader only talks to the [`ArrayStore`]
//! trait, so the same pipeline runs against an HDF5 file or an in-memory store.

mod memory;

#[cfg(feature = "hdf5")]
mod hdf5_store;

pub use memory::{ArrayData, MemoryStore, StoredArray};

#[cfg(feature = "hdf5")]
pub use hdf5_store::Hdf5Store;

use crate::error::{Result, TsclustError};
use std::path::Path;

/// Read access to a container of named arrays.
///
/// Ranged reads return the number of elements actually copied into `out`,
/// which may be smaller than `out.len()` near the end of a dataset. Callers
/// decide whether a short read is an error.
pub trait ArrayStore: Send + Sync {
    /// Human-readable description of the backing source.
    fn describe(&self) -> String;

    /// Dimensions of a dataset (empty for scalars).
    fn shape(&self, path: &str) -> Result<Vec<usize>>;

    /// Read a scalar (or single-element) numeric dataset.
    fn read_scalar(&self, path: &str) -> Result<f64>;

    /// Copy elements `offset..offset + out.len()` of a flattened numeric dataset.
    fn read_f64_into(&self, path: &str, offset: usize, out: &mut [f64]) -> Result<usize>;

    /// Copy elements `offset..offset + out.len()` of a flattened integer dataset.
    fn read_i64_into(&self, path: &str, offset: usize, out: &mut [i64]) -> Result<usize>;

    /// Read a whole string vector.
    fn read_strings(&self, path: &str) -> Result<Vec<String>>;

    /// Read one row of a 2-D integer dataset.
    fn read_i64_row(&self, path: &str, row: usize) -> Result<Vec<i64>>;

    /// Read a numeric attribute attached to a dataset.
    fn read_attr(&self, path: &str, name: &str) -> Result<f64>;

    /// Total number of elements in a dataset.
    fn element_count(&self, path: &str) -> Result<usize> {
        Ok(self.shape(path)?.iter().product())
    }

    /// Read a whole numeric vector in one pass.
    fn read_f64_all(&self, path: &str) -> Result<Vec<f64>> {
        let n = self.element_count(path)?;
        let mut out = vec![0.0; n];
        let read = self.read_f64_into(path, 0, &mut out)?;
        check_complete(path, 0, n, read)?;
        Ok(out)
    }

    /// Read a whole integer vector in one pass.
    fn read_i64_all(&self, path: &str) -> Result<Vec<i64>> {
        let n = self.element_count(path)?;
        let mut out = vec![0; n];
        let read = self.read_i64_into(path, 0, &mut out)?;
        check_complete(path, 0, n, read)?;
        Ok(out)
    }
}

/// Fail with [`TsclustError::ShortRead`] unless `read == requested`.
pub(crate) fn check_complete(path: &str, offset: usize, requested: usize, read: usize) -> Result<()> {
    if read != requested {
        return Err(TsclustError::ShortRead {
            array: path.to_string(),
            offset,
            requested,
            read,
        });
    }
    Ok(())
}

/// Open a database file, choosing the backend from the file extension.
///
/// - `.json` files are loaded into a [`MemoryStore`].
/// - `.h5`, `.hdf5` and `.he5` files require the `hdf5` feature.
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<Box<dyn ArrayStore>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TsclustError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("database {} does not exist", path.display()),
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Ok(Box::new(MemoryStore::from_json_file(path)?)),
        "h5" | "hdf5" | "he5" => open_hdf5(path),
        other => Err(TsclustError::UnsupportedFormat(format!(
            "unrecognised extension '{}' on {}",
            other,
            path.display()
        ))),
    }
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path) -> Result<Box<dyn ArrayStore>> {
    Ok(Box::new(Hdf5Store::open(path)?))
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path) -> Result<Box<dyn ArrayStore>> {
    Err(TsclustError::UnsupportedFormat(format!(
        "{} is an HDF5 file; rebuild with `--features hdf5` to read it",
        path.display()
    )))
}
