//! Delimited cluster and time-series tables for export.

use crate::data::{AbundanceMatrix, ClusterLabels, SequenceTable};
use crate::error::{Result, TsclustError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const CLUSTER_HEADER: [&str; 5] = [
    "sequence_id",
    "abundance_sum",
    "taxonomy",
    "phylo_cluster",
    "time_cluster",
];

/// Field separator for written tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Tsv,
    Csv,
}

impl Delimiter {
    /// Pick from a file extension; anything other than `.csv` is tab separated.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Delimiter::Csv,
            _ => Delimiter::Tsv,
        }
    }

    fn byte(&self) -> u8 {
        match self {
            Delimiter::Tsv => b'\t',
            Delimiter::Csv => b',',
        }
    }
}

/// One member sequence of an exported cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub sequence_id: String,
    pub abundance_sum: f64,
    pub taxonomy: String,
    pub phylo_cluster: i64,
    pub time_cluster: i64,
}

impl ClusterRow {
    fn record(&self) -> Vec<String> {
        vec![
            self.sequence_id.clone(),
            self.abundance_sum.to_string(),
            self.taxonomy.clone(),
            self.phylo_cluster.to_string(),
            self.time_cluster.to_string(),
        ]
    }
}

/// Members of one time-series cluster, in sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTable {
    pub label: i64,
    pub epsilon: f64,
    /// Position of each row in the full sequence table.
    pub positions: Vec<usize>,
    pub rows: Vec<ClusterRow>,
}

impl ClusterTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write as delimited text with a header row.
    pub fn write<W: Write>(&self, writer: W, delimiter: Delimiter) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(delimiter.byte())
            .from_writer(writer);
        out.write_record(CLUSTER_HEADER)?;
        for row in &self.rows {
            out.write_record(row.record())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write to a file, choosing the delimiter from its extension.
    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let delimiter = Delimiter::from_path(&path);
        self.write(File::create(path)?, delimiter)
    }
}

/// A cluster table with each member's raw time series appended.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub table: ClusterTable,
    /// Time value heading each series column.
    pub time: Vec<f64>,
    /// Raw abundances, one row per table row.
    pub series: DMatrix<f64>,
}

impl WideTable {
    /// Header row: the cluster columns followed by the time values.
    pub fn header(&self) -> Vec<String> {
        CLUSTER_HEADER
            .iter()
            .map(|s| s.to_string())
            .chain(self.time.iter().map(|t| t.to_string()))
            .collect()
    }

    pub fn write<W: Write>(&self, writer: W, delimiter: Delimiter) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(delimiter.byte())
            .from_writer(writer);
        out.write_record(self.header())?;
        for (i, row) in self.table.rows.iter().enumerate() {
            let mut record = row.record();
            record.extend(self.series.row(i).iter().map(|v| v.to_string()));
            out.write_record(record)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let delimiter = Delimiter::from_path(&path);
        self.write(File::create(path)?, delimiter)
    }
}

/// Write a sequences x samples matrix with sequence ids as the first column
/// and time values as the header.
pub fn write_matrix<W: Write>(
    writer: W,
    delimiter: Delimiter,
    ids: &[&str],
    time: &[f64],
    matrix: &DMatrix<f64>,
) -> Result<()> {
    if ids.len() != matrix.nrows() {
        return Err(TsclustError::ShapeMismatch {
            array: "sequence ids".to_string(),
            expected: matrix.nrows(),
            actual: ids.len(),
        });
    }
    if time.len() != matrix.ncols() {
        return Err(TsclustError::ShapeMismatch {
            array: "time".to_string(),
            expected: matrix.ncols(),
            actual: time.len(),
        });
    }
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .from_writer(writer);
    let header: Vec<String> = std::iter::once("sequence_id".to_string())
        .chain(time.iter().map(|t| t.to_string()))
        .collect();
    out.write_record(&header)?;
    for (i, id) in ids.iter().enumerate() {
        let record: Vec<String> = std::iter::once(id.to_string())
            .chain(matrix.row(i).iter().map(|v| v.to_string()))
            .collect();
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

fn check_aligned(labels: &ClusterLabels, sequences: &SequenceTable, abundance: &AbundanceMatrix) -> Result<()> {
    if sequences.len() != labels.len() {
        return Err(TsclustError::ShapeMismatch {
            array: "sequences".to_string(),
            expected: labels.len(),
            actual: sequences.len(),
        });
    }
    if abundance.n_sequences() != labels.len() {
        return Err(TsclustError::ShapeMismatch {
            array: "abundance".to_string(),
            expected: labels.len(),
            actual: abundance.n_sequences(),
        });
    }
    Ok(())
}

/// Build the cluster table for `label`.
///
/// An unknown label yields an empty table.
pub fn cluster_table(
    labels: &ClusterLabels,
    sequences: &SequenceTable,
    abundance: &AbundanceMatrix,
    label: i64,
) -> Result<ClusterTable> {
    check_aligned(labels, sequences, abundance)?;
    let positions = labels.members(label);
    let rows = positions
        .iter()
        .filter_map(|&i| sequences.get(i).map(|record| (i, record)))
        .map(|(i, record)| ClusterRow {
            sequence_id: record.id.clone(),
            abundance_sum: abundance.matrix().row(i).sum(),
            taxonomy: record.taxonomy.as_str().to_string(),
            phylo_cluster: record.phylo_cluster,
            time_cluster: label,
        })
        .collect();
    Ok(ClusterTable {
        label,
        epsilon: labels.epsilon,
        positions,
        rows,
    })
}

/// Build the wide table for `label`.
pub fn wide_table(
    labels: &ClusterLabels,
    sequences: &SequenceTable,
    abundance: &AbundanceMatrix,
    time: &[f64],
    label: i64,
) -> Result<WideTable> {
    if time.len() != abundance.n_samples() {
        return Err(TsclustError::ShapeMismatch {
            array: "time".to_string(),
            expected: abundance.n_samples(),
            actual: time.len(),
        });
    }
    let table = cluster_table(labels, sequences, abundance, label)?;
    let series = abundance.select_rows(&table.positions)?;
    Ok(WideTable {
        table,
        time: time.to_vec(),
        series,
    })
}
