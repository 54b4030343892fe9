//! Genome summary table with copy-on-filter semantics.

use crate::data::record::{
    is_null_token, GenomeRecord, GenomeStatus, Metric, Value, GENOME_ID, GENOME_NAME,
    GENOME_STATUS,
};
use crate::error::{QcError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// An ordered collection of genome records plus the column layout they came with.
///
/// Every selection returns a fresh table; no operation hands out a view into
/// another table's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeTable {
    /// Column names in input order.
    columns: Vec<String>,
    /// Rows in input order.
    records: Vec<GenomeRecord>,
}

impl GenomeTable {
    /// Create a table from explicit columns and records.
    pub fn new(columns: Vec<String>, records: Vec<GenomeRecord>) -> Result<Self> {
        if !columns.iter().any(|c| c == GENOME_ID) {
            return Err(QcError::missing_column(GENOME_ID, "load"));
        }
        Ok(Self { columns, records })
    }

    /// Create a table with the full known schema.
    pub fn from_records(records: Vec<GenomeRecord>) -> Self {
        Self {
            columns: Self::default_columns(),
            records,
        }
    }

    /// Known schema columns in canonical order.
    pub fn default_columns() -> Vec<String> {
        let mut columns = vec![
            GENOME_ID.to_string(),
            GENOME_NAME.to_string(),
            GENOME_STATUS.to_string(),
        ];
        columns.extend(Metric::ALL.iter().map(|m| m.column().to_string()));
        columns
    }

    /// An empty table with the same columns.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            records: Vec::new(),
        }
    }

    /// Load a table from a TSV file.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), b'\t')
    }

    /// Load a table from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), b',')
    }

    /// Load a table from any delimited reader.
    ///
    /// The first row is the header and must contain `genome_id`. Cells such as
    /// `NA` or empty strings become missing values; unknown columns are kept
    /// verbatim.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if columns.is_empty() {
            return Err(QcError::EmptyData("Table has no header".to_string()));
        }
        if !columns.iter().any(|c| c == GENOME_ID) {
            return Err(QcError::missing_column(GENOME_ID, "load"));
        }

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let mut record = GenomeRecord::default();
            for (column, cell) in columns.iter().zip(row.iter()) {
                let cell = cell.trim();
                match column.as_str() {
                    GENOME_ID => record.genome_id = cell.to_string(),
                    GENOME_NAME => {
                        record.genome_name = (!is_null_token(cell)).then(|| cell.to_string())
                    }
                    GENOME_STATUS => {
                        record.genome_status =
                            (!is_null_token(cell)).then(|| GenomeStatus::from(cell))
                    }
                    other => match Metric::from_column(other) {
                        Some(metric) => *record.metric_mut(metric) = Value::parse(cell),
                        None => {
                            record.extra.insert(other.to_string(), cell.to_string());
                        }
                    },
                }
            }
            records.push(record);
        }

        Ok(Self { columns, records })
    }

    /// Write the table as TSV, keeping the input column order.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_delimited(BufWriter::new(file), b'\t')
    }

    /// Write the table to any writer with the given delimiter.
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        wtr.write_record(&self.columns)?;
        for record in &self.records {
            wtr.write_record(self.columns.iter().map(|c| record.cell(c)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn records(&self) -> &[GenomeRecord] {
        &self.records
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, GenomeRecord> {
        self.records.iter()
    }

    /// Genome identifiers in row order.
    pub fn genome_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.genome_id.as_str()).collect()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fail with `MissingRequiredColumn` unless the column exists.
    pub fn require(&self, column: &str, stage: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(QcError::missing_column(column, stage))
        }
    }

    /// New table with the rows matching a predicate.
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&GenomeRecord) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// Split into (matching, non-matching) tables.
    pub fn partition<F>(&self, mut pred: F) -> (Self, Self)
    where
        F: FnMut(&GenomeRecord) -> bool,
    {
        let (yes, no): (Vec<_>, Vec<_>) = self.records.iter().cloned().partition(|r| pred(r));
        (
            Self {
                columns: self.columns.clone(),
                records: yes,
            },
            Self {
                columns: self.columns.clone(),
                records: no,
            },
        )
    }

    /// Append another table's rows. Columns only present in `other` are added at the end.
    pub fn concat(mut self, other: GenomeTable) -> Self {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.records.extend(other.records);
        self
    }

    /// New table without rows missing the given metric.
    pub fn drop_missing(&self, metric: Metric, stage: &str) -> Result<Self> {
        self.require(metric.column(), stage)?;
        Ok(self.filter(|r| !r.metric(metric).is_missing()))
    }

    /// Coerce a metric column to integers. Fails on the first non-numeric cell.
    pub fn coerce_int(self, metric: Metric, stage: &str) -> Result<Self> {
        self.coerce_with(metric, stage, Value::to_int)
    }

    /// Coerce a metric column to floats. Fails on the first non-numeric cell.
    pub fn coerce_float(self, metric: Metric, stage: &str) -> Result<Self> {
        self.coerce_with(metric, stage, Value::to_float)
    }

    /// Coerce a metric column to floats, replacing non-numeric cells with missing values.
    pub fn coerce_numeric(mut self, metric: Metric, stage: &str) -> Result<Self> {
        self.require(metric.column(), stage)?;
        for record in &mut self.records {
            let value = record.metric(metric).to_float_or_missing();
            *record.metric_mut(metric) = value;
        }
        Ok(self)
    }

    fn coerce_with<F>(mut self, metric: Metric, stage: &str, convert: F) -> Result<Self>
    where
        F: Fn(&Value, &str, usize) -> Result<Value>,
    {
        self.require(metric.column(), stage)?;
        let coerced: Vec<Value> = self
            .records
            .iter()
            .enumerate()
            .map(|(row, r)| convert(r.metric(metric), metric.column(), row))
            .collect::<Result<_>>()?;
        for (record, value) in self.records.iter_mut().zip(coerced) {
            *record.metric_mut(metric) = value;
        }
        Ok(self)
    }

    /// Present numeric values of a metric, in row order.
    pub fn metric_values(&self, metric: Metric) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.metric(metric).as_f64())
            .filter(|v| v.is_finite())
            .collect()
    }
}

impl<'a> IntoIterator for &'a GenomeTable {
    type Item = &'a GenomeRecord;
    type IntoIter = std::slice::Iter<'a, GenomeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
