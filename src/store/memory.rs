//! In-memory array store with JSON persistence.

use super::ArrayStore;
use crate::error::{Result, TsclustError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Typed payload of a stored array, flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ArrayData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl ArrayData {
    fn len(&self) -> usize {
        match self {
            ArrayData::Float(v) => v.len(),
            ArrayData::Int(v) => v.len(),
            ArrayData::Text(v) => v.len(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ArrayData::Float(_) => "float",
            ArrayData::Int(_) => "int",
            ArrayData::Text(_) => "text",
        }
    }
}

/// A named array with its shape and numeric attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArray {
    pub shape: Vec<usize>,
    pub data: ArrayData,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, f64>,
}

/// Array store held entirely in memory.
///
/// Used for tests, synthetic databases and JSON-encoded databases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    datasets: BTreeMap<String, StoredArray>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the store to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Insert (or replace) an array, checking that the shape matches the payload.
    pub fn insert(&mut self, path: &str, shape: Vec<usize>, data: ArrayData) -> Result<()> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TsclustError::ShapeMismatch {
                array: path.to_string(),
                expected,
                actual: data.len(),
            });
        }
        self.datasets.insert(
            path.to_string(),
            StoredArray {
                shape,
                data,
                attrs: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Insert a floating-point array.
    pub fn insert_f64(&mut self, path: &str, shape: Vec<usize>, values: Vec<f64>) -> Result<()> {
        self.insert(path, shape, ArrayData::Float(values))
    }

    /// Insert an integer array.
    pub fn insert_i64(&mut self, path: &str, shape: Vec<usize>, values: Vec<i64>) -> Result<()> {
        self.insert(path, shape, ArrayData::Int(values))
    }

    /// Insert a string vector.
    pub fn insert_strings(&mut self, path: &str, values: Vec<String>) -> Result<()> {
        let shape = vec![values.len()];
        self.insert(path, shape, ArrayData::Text(values))
    }

    /// Insert an integer scalar.
    pub fn insert_scalar(&mut self, path: &str, value: i64) -> Result<()> {
        self.insert(path, Vec::new(), ArrayData::Int(vec![value]))
    }

    /// Attach a numeric attribute to an existing dataset.
    pub fn set_attr(&mut self, path: &str, name: &str, value: f64) -> Result<()> {
        let array = self
            .datasets
            .get_mut(path)
            .ok_or_else(|| TsclustError::MissingDataset(path.to_string()))?;
        array.attrs.insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a dataset, returning it if present.
    pub fn remove(&mut self, path: &str) -> Option<StoredArray> {
        self.datasets.remove(path)
    }

    /// Mutable access to a stored array.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut StoredArray> {
        self.datasets.get_mut(path)
    }

    fn get(&self, path: &str) -> Result<&StoredArray> {
        self.datasets
            .get(path)
            .ok_or_else(|| TsclustError::MissingDataset(path.to_string()))
    }
}

fn wrong_type(path: &str, wanted: &str, found: &ArrayData) -> TsclustError {
    TsclustError::Store(format!(
        "dataset '{}' holds {} values, expected {}",
        path,
        found.kind(),
        wanted
    ))
}

fn copy_range<T: Copy, U>(src: &[T], offset: usize, out: &mut [U], f: impl Fn(T) -> U) -> usize {
    if offset >= src.len() {
        return 0;
    }
    let n = out.len().min(src.len() - offset);
    for (dst, &v) in out[..n].iter_mut().zip(&src[offset..offset + n]) {
        *dst = f(v);
    }
    n
}

impl ArrayStore for MemoryStore {
    fn describe(&self) -> String {
        format!("in-memory store ({} datasets)", self.datasets.len())
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        Ok(self.get(path)?.shape.clone())
    }

    fn read_scalar(&self, path: &str) -> Result<f64> {
        let array = self.get(path)?;
        match &array.data {
            ArrayData::Float(v) if v.len() == 1 => Ok(v[0]),
            ArrayData::Int(v) if v.len() == 1 => Ok(v[0] as f64),
            other => Err(TsclustError::Store(format!(
                "dataset '{}' is not a numeric scalar ({} values of type {})",
                path,
                other.len(),
                other.kind()
            ))),
        }
    }

    fn read_f64_into(&self, path: &str, offset: usize, out: &mut [f64]) -> Result<usize> {
        match &self.get(path)?.data {
            ArrayData::Float(v) => Ok(copy_range(v, offset, out, |x| x)),
            ArrayData::Int(v) => Ok(copy_range(v, offset, out, |x| x as f64)),
            other => Err(wrong_type(path, "numeric", other)),
        }
    }

    fn read_i64_into(&self, path: &str, offset: usize, out: &mut [i64]) -> Result<usize> {
        match &self.get(path)?.data {
            ArrayData::Int(v) => Ok(copy_range(v, offset, out, |x| x)),
            other => Err(wrong_type(path, "int", other)),
        }
    }

    fn read_strings(&self, path: &str) -> Result<Vec<String>> {
        match &self.get(path)?.data {
            ArrayData::Text(v) => Ok(v.clone()),
            other => Err(wrong_type(path, "text", other)),
        }
    }

    fn read_i64_row(&self, path: &str, row: usize) -> Result<Vec<i64>> {
        let array = self.get(path)?;
        if array.shape.len() != 2 {
            return Err(TsclustError::ShapeMismatch {
                array: path.to_string(),
                expected: 2,
                actual: array.shape.len(),
            });
        }
        let (n_rows, n_cols) = (array.shape[0], array.shape[1]);
        if row >= n_rows {
            return Err(TsclustError::InvalidParameter(format!(
                "row {} out of bounds for '{}' with {} rows",
                row, path, n_rows
            )));
        }
        match &array.data {
            ArrayData::Int(v) => Ok(v[row * n_cols..(row + 1) * n_cols].to_vec()),
            other => Err(wrong_type(path, "int", other)),
        }
    }

    fn read_attr(&self, path: &str, name: &str) -> Result<f64> {
        self.get(path)?
            .attrs
            .get(name)
            .copied()
            .ok_or_else(|| TsclustError::MissingAttribute {
                dataset: path.to_string(),
                attr: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_scalar("dims/n", 3).unwrap();
        store.insert_f64("values", vec![5], vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        store.insert_i64("labels", vec![2, 3], vec![0, 0, 1, -1, 2, 2]).unwrap();
        store
            .insert_strings("names", vec!["a".into(), "b".into()])
            .unwrap();
        store.set_attr("labels", "param_step", 0.5).unwrap();
        store
    }

    #[test]
    fn test_shape_checked_on_insert() {
        let mut store = MemoryStore::new();
        let result = store.insert_f64("bad", vec![2, 2], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(TsclustError::ShapeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_scalar_and_attr() {
        let store = create_test_store();
        assert_eq!(store.read_scalar("dims/n").unwrap(), 3.0);
        assert_eq!(store.read_attr("labels", "param_step").unwrap(), 0.5);
        assert!(matches!(
            store.read_attr("labels", "param_min"),
            Err(TsclustError::MissingAttribute { .. })
        ));
        assert!(store.read_scalar("values").is_err());
    }

    #[test]
    fn test_ranged_reads() {
        let store = create_test_store();
        let mut out = [0.0; 2];
        assert_eq!(store.read_f64_into("values", 1, &mut out).unwrap(), 2);
        assert_eq!(out, [2.0, 3.0]);

        // Tail read is short
        let mut out = [0.0; 4];
        assert_eq!(store.read_f64_into("values", 3, &mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[4.0, 5.0]);

        // Past the end
        assert_eq!(store.read_f64_into("values", 9, &mut out).unwrap(), 0);

        // Integers widen to floats
        let mut out = [0.0; 3];
        assert_eq!(store.read_f64_into("labels", 3, &mut out).unwrap(), 3);
        assert_eq!(out, [-1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_row_reads() {
        let store = create_test_store();
        assert_eq!(store.read_i64_row("labels", 0).unwrap(), vec![0, 0, 1]);
        assert_eq!(store.read_i64_row("labels", 1).unwrap(), vec![-1, 2, 2]);
        assert!(store.read_i64_row("labels", 2).is_err());
        assert!(store.read_i64_row("values", 0).is_err());
    }

    #[test]
    fn test_type_errors() {
        let store = create_test_store();
        let mut out = [0i64; 1];
        assert!(matches!(
            store.read_i64_into("values", 0, &mut out),
            Err(TsclustError::Store(_))
        ));
        assert!(store.read_strings("values").is_err());
        assert!(matches!(
            store.read_strings("missing"),
            Err(TsclustError::MissingDataset(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let store = create_test_store();
        let file = NamedTempFile::new().unwrap();
        store.to_json_file(file.path()).unwrap();
        let loaded = MemoryStore::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, store);
    }
}
