//! HDF5-backed array store.

use super::ArrayStore;
use crate::error::{Result, TsclustError};
use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use std::path::{Path, PathBuf};

/// Read-only view of an HDF5 clustering database.
pub struct Hdf5Store {
    file: hdf5::File,
    path: PathBuf,
}

fn store_err(context: &str, err: hdf5::Error) -> TsclustError {
    TsclustError::Store(format!("{}: {}", context, err))
}

/// Read a fixed-length string dataset through the smallest buffer width that
/// holds `$width` bytes.
macro_rules! read_fixed {
    ($ds:expr, $path:expr, $ty:ident, $width:expr) => {{
        let width = $width;
        let read = match width {
            0..=16 => $ds.read_raw::<$ty<16>>().map(|v| strings(&v, |s| s.as_str())),
            17..=64 => $ds.read_raw::<$ty<64>>().map(|v| strings(&v, |s| s.as_str())),
            65..=256 => $ds.read_raw::<$ty<256>>().map(|v| strings(&v, |s| s.as_str())),
            257..=1024 => $ds.read_raw::<$ty<1024>>().map(|v| strings(&v, |s| s.as_str())),
            1025..=4096 => $ds.read_raw::<$ty<4096>>().map(|v| strings(&v, |s| s.as_str())),
            _ => {
                return Err(TsclustError::Store(format!(
                    "{}: fixed-length strings of {} bytes are not supported",
                    $path, width
                )))
            }
        };
        read.map_err(|e| store_err($path, e))
    }};
}

fn strings<T>(values: &[T], as_str: impl Fn(&T) -> &str) -> Vec<String> {
    values.iter().map(|s| as_str(s).to_string()).collect()
}

impl Hdf5Store {
    /// Open an HDF5 file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = hdf5::File::open(&path)
            .map_err(|e| store_err(&format!("opening {}", path.display()), e))?;
        Ok(Self { file, path })
    }

    fn dataset(&self, path: &str) -> Result<hdf5::Dataset> {
        self.file
            .dataset(path)
            .map_err(|_| TsclustError::MissingDataset(path.to_string()))
    }

    fn clamp_range(ds: &hdf5::Dataset, offset: usize, want: usize) -> Option<(usize, usize)> {
        let len = ds.size();
        if offset >= len || want == 0 {
            return None;
        }
        Some((offset, (offset + want).min(len)))
    }
}

impl ArrayStore for Hdf5Store {
    fn describe(&self) -> String {
        format!("HDF5 file {}", self.path.display())
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        Ok(self.dataset(path)?.shape())
    }

    fn read_scalar(&self, path: &str) -> Result<f64> {
        let values = self
            .dataset(path)?
            .read_raw::<f64>()
            .map_err(|e| store_err(path, e))?;
        match values.as_slice() {
            [v] => Ok(*v),
            other => Err(TsclustError::ShapeMismatch {
                array: path.to_string(),
                expected: 1,
                actual: other.len(),
            }),
        }
    }

    fn read_f64_into(&self, path: &str, offset: usize, out: &mut [f64]) -> Result<usize> {
        let ds = self.dataset(path)?;
        let Some((start, end)) = Self::clamp_range(&ds, offset, out.len()) else {
            return Ok(0);
        };
        let chunk = ds
            .read_slice_1d::<f64, _>(start..end)
            .map_err(|e| store_err(path, e))?;
        let n = chunk.len();
        for (dst, v) in out[..n].iter_mut().zip(chunk.iter()) {
            *dst = *v;
        }
        Ok(n)
    }

    fn read_i64_into(&self, path: &str, offset: usize, out: &mut [i64]) -> Result<usize> {
        let ds = self.dataset(path)?;
        let Some((start, end)) = Self::clamp_range(&ds, offset, out.len()) else {
            return Ok(0);
        };
        let chunk = ds
            .read_slice_1d::<i64, _>(start..end)
            .map_err(|e| store_err(path, e))?;
        let n = chunk.len();
        for (dst, v) in out[..n].iter_mut().zip(chunk.iter()) {
            *dst = *v;
        }
        Ok(n)
    }

    fn read_strings(&self, path: &str) -> Result<Vec<String>> {
        let ds = self.dataset(path)?;
        let descriptor = ds
            .dtype()
            .and_then(|t| t.to_descriptor())
            .map_err(|e| store_err(path, e))?;
        match descriptor {
            TypeDescriptor::FixedAscii(width) => read_fixed!(ds, path, FixedAscii, width),
            TypeDescriptor::FixedUnicode(width) => read_fixed!(ds, path, FixedUnicode, width),
            TypeDescriptor::VarLenAscii => ds
                .read_raw::<VarLenAscii>()
                .map(|v| strings(&v, |s| s.as_str()))
                .map_err(|e| store_err(path, e)),
            _ => ds
                .read_raw::<VarLenUnicode>()
                .map(|v| strings(&v, |s| s.as_str()))
                .map_err(|e| store_err(path, e)),
        }
    }

    fn read_i64_row(&self, path: &str, row: usize) -> Result<Vec<i64>> {
        let ds = self.dataset(path)?;
        let shape = ds.shape();
        if shape.len() != 2 {
            return Err(TsclustError::ShapeMismatch {
                array: path.to_string(),
                expected: 2,
                actual: shape.len(),
            });
        }
        if row >= shape[0] {
            return Err(TsclustError::InvalidParameter(format!(
                "row {} out of bounds for '{}' with {} rows",
                row, path, shape[0]
            )));
        }
        let values = ds
            .read_slice_1d::<i64, _>((row, ..))
            .map_err(|e| store_err(path, e))?;
        Ok(values.to_vec())
    }

    fn read_attr(&self, path: &str, name: &str) -> Result<f64> {
        let attr = self
            .dataset(path)?
            .attr(name)
            .map_err(|_| TsclustError::MissingAttribute {
                dataset: path.to_string(),
                attr: name.to_string(),
            })?;
        attr.read_scalar::<f64>().map_err(|e| store_err(name, e))
    }
}
