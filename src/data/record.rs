//! Genome summary records and their cell values.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier column, required by every loaded table.
pub const GENOME_ID: &str = "genome_id";
/// Free-text organism name used for species matching.
pub const GENOME_NAME: &str = "genome_name";
/// Assembly status column (Complete, WGS, ...).
pub const GENOME_STATUS: &str = "genome_status";

/// A single cell value that may be numeric, textual, or missing.
///
/// Loaders hand over whatever they parsed; stages coerce the columns they
/// validate to their canonical numeric type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Integer count.
    Int(i64),
    /// Floating-point percentage or ratio.
    Float(f64),
    /// Unparsed text.
    Text(String),
    /// Missing value.
    #[default]
    Missing,
}

impl Value {
    /// Parse a raw cell, recognizing the usual null spellings.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_null_token(raw) {
            return Value::Missing;
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Value::Int(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Float(v),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Check if this is a missing value. Non-finite floats count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(v) => !v.is_finite(),
            _ => false,
        }
    }

    /// Integer view, only for values already coerced to integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of an integer or float value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Coerce to an integer, truncating fractional parts. Missing stays missing.
    pub fn to_int(&self, column: &str, row: usize) -> Result<Value> {
        match self {
            Value::Int(v) => Ok(Value::Int(*v)),
            Value::Float(v) if v.is_finite() => Ok(Value::Int(v.trunc() as i64)),
            Value::Text(s) => match Value::parse(s) {
                Value::Int(v) => Ok(Value::Int(v)),
                Value::Float(v) => Ok(Value::Int(v.trunc() as i64)),
                _ => Err(invalid(column, row, s, "an integer")),
            },
            Value::Float(_) | Value::Missing => Ok(Value::Missing),
        }
    }

    /// Coerce to a float. Missing stays missing.
    pub fn to_float(&self, column: &str, row: usize) -> Result<Value> {
        match self {
            Value::Int(v) => Ok(Value::Float(*v as f64)),
            Value::Float(v) if v.is_finite() => Ok(Value::Float(*v)),
            Value::Text(s) => Value::parse(s)
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| invalid(column, row, s, "a number")),
            Value::Float(_) | Value::Missing => Ok(Value::Missing),
        }
    }

    /// Coerce to a float, turning anything non-numeric into a missing value.
    pub fn to_float_or_missing(&self) -> Value {
        self.as_f64()
            .or_else(|| match self {
                Value::Text(s) => Value::parse(s).as_f64(),
                _ => None,
            })
            .filter(|v| v.is_finite())
            .map(Value::Float)
            .unwrap_or(Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Whole floats keep a ".0" so they reload as floats
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            Value::Float(v) if v.is_finite() => write!(f, "{}", v),
            Value::Float(_) => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Missing
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

pub(crate) fn is_null_token(raw: &str) -> bool {
    matches!(raw, "" | "NA" | "na" | "NaN" | "nan" | "None" | "null")
}

fn invalid(column: &str, row: usize, value: &str, expected: &'static str) -> QcError {
    QcError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
        expected,
    }
}

/// Numeric quality metrics carried by each genome record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    GenomeLength,
    PatricCds,
    Contigs,
    ContigL50,
    ContigN50,
    GcContent,
    CheckmContamination,
    CheckmCompleteness,
}

impl Metric {
    /// All metrics in canonical column order.
    pub const ALL: [Metric; 8] = [
        Metric::GenomeLength,
        Metric::PatricCds,
        Metric::Contigs,
        Metric::ContigL50,
        Metric::ContigN50,
        Metric::GcContent,
        Metric::CheckmContamination,
        Metric::CheckmCompleteness,
    ];

    /// Column name in summary tables.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::GenomeLength => "genome_length",
            Metric::PatricCds => "patric_cds",
            Metric::Contigs => "contigs",
            Metric::ContigL50 => "contig_l50",
            Metric::ContigN50 => "contig_n50",
            Metric::GcContent => "gc_content",
            Metric::CheckmContamination => "checkm_contamination",
            Metric::CheckmCompleteness => "checkm_completeness",
        }
    }

    /// Look up a metric by column name.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.column() == name)
    }
}

/// Assembly status of a genome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GenomeStatus {
    /// Closed assembly.
    Complete,
    /// Whole-genome shotgun draft assembly.
    Wgs,
    /// Any other status (Plasmid, ...), kept verbatim.
    Other(String),
}

impl GenomeStatus {
    /// Status label as it appears in summary tables.
    pub fn as_str(&self) -> &str {
        match self {
            GenomeStatus::Complete => "Complete",
            GenomeStatus::Wgs => "WGS",
            GenomeStatus::Other(s) => s,
        }
    }
}

impl From<&str> for GenomeStatus {
    fn from(s: &str) -> Self {
        match s {
            "Complete" => GenomeStatus::Complete,
            "WGS" => GenomeStatus::Wgs,
            other => GenomeStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for GenomeStatus {
    fn from(s: String) -> Self {
        GenomeStatus::from(s.as_str())
    }
}

impl From<GenomeStatus> for String {
    fn from(status: GenomeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for GenomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a genome summary table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenomeRecord {
    pub genome_id: String,
    pub genome_name: Option<String>,
    pub genome_status: Option<GenomeStatus>,
    pub genome_length: Value,
    pub patric_cds: Value,
    pub contigs: Value,
    pub contig_l50: Value,
    pub contig_n50: Value,
    pub gc_content: Value,
    pub checkm_contamination: Value,
    pub checkm_completeness: Value,
    /// Columns outside the known schema, carried through untouched.
    pub extra: HashMap<String, String>,
}

impl GenomeRecord {
    /// Create an empty record with the given identifier.
    pub fn new(genome_id: &str) -> Self {
        Self {
            genome_id: genome_id.to_string(),
            ..Default::default()
        }
    }

    /// Set the genome name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.genome_name = Some(name.to_string());
        self
    }

    /// Set the genome status.
    pub fn with_status(mut self, status: GenomeStatus) -> Self {
        self.genome_status = Some(status);
        self
    }

    /// Set a metric value.
    pub fn with_metric(mut self, metric: Metric, value: impl Into<Value>) -> Self {
        *self.metric_mut(metric) = value.into();
        self
    }

    /// Get a metric value.
    pub fn metric(&self, metric: Metric) -> &Value {
        match metric {
            Metric::GenomeLength => &self.genome_length,
            Metric::PatricCds => &self.patric_cds,
            Metric::Contigs => &self.contigs,
            Metric::ContigL50 => &self.contig_l50,
            Metric::ContigN50 => &self.contig_n50,
            Metric::GcContent => &self.gc_content,
            Metric::CheckmContamination => &self.checkm_contamination,
            Metric::CheckmCompleteness => &self.checkm_completeness,
        }
    }

    /// Get a mutable metric value.
    pub fn metric_mut(&mut self, metric: Metric) -> &mut Value {
        match metric {
            Metric::GenomeLength => &mut self.genome_length,
            Metric::PatricCds => &mut self.patric_cds,
            Metric::Contigs => &mut self.contigs,
            Metric::ContigL50 => &mut self.contig_l50,
            Metric::ContigN50 => &mut self.contig_n50,
            Metric::GcContent => &mut self.gc_content,
            Metric::CheckmContamination => &mut self.checkm_contamination,
            Metric::CheckmCompleteness => &mut self.checkm_completeness,
        }
    }

    /// Check whether the record has the given status.
    pub fn has_status(&self, status: &GenomeStatus) -> bool {
        self.genome_status.as_ref() == Some(status)
    }

    /// Render the cell for an arbitrary column name.
    pub fn cell(&self, column: &str) -> String {
        match column {
            GENOME_ID => self.genome_id.clone(),
            GENOME_NAME => self.genome_name.clone().unwrap_or_default(),
            GENOME_STATUS => self
                .genome_status
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default(),
            other => match Metric::from_column(other) {
                Some(metric) => self.metric(metric).to_string(),
                None => self.extra.get(other).cloned().unwrap_or_default(),
            },
        }
    }
}
