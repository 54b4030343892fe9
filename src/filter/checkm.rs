//! CheckM contamination and completeness filters.
//!
//! Rows are split into those with a score and those without. Scored rows are
//! compared against a cutoff (explicit, or detected on the sorted scores);
//! unscored rows are handled by the [`MissingPolicy`].

use crate::cutoff::{CurveMode, Cutoff};
use crate::data::{GenomeTable, Metric};
use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const STAGE: &str = "CheckM_completeness_contamination";

/// What to do with rows that have no CheckM score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Pass unscored rows through unfiltered.
    #[default]
    Keep,
    /// Discard unscored rows.
    Drop,
}

impl MissingPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            MissingPolicy::Keep => "keep",
            MissingPolicy::Drop => "drop",
        }
    }
}

impl FromStr for MissingPolicy {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(MissingPolicy::Keep),
            "drop" => Ok(MissingPolicy::Drop),
            _ => Err(QcError::InvalidParameter(format!(
                "checkm_missing must be 'keep' or 'drop', got '{}'",
                s
            ))),
        }
    }
}

/// Outcome of one CheckM filter.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckmFiltered {
    /// Surviving rows: passing scored rows, then any kept unscored rows.
    pub table: GenomeTable,
    /// Cutoff applied to scored rows; `None` when the input was empty.
    pub cutoff: Option<Cutoff>,
    /// Scored rows that passed the cutoff.
    pub n_passed: usize,
    /// Rows without a score.
    pub n_missing: usize,
}

/// Keep rows with contamination strictly below the cutoff.
///
/// Without an explicit cutoff, the elbow of the ascending contamination
/// curve is used.
pub fn filter_checkm_contamination(
    table: &GenomeTable,
    contamination_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<GenomeTable> {
    filter_checkm_contamination_detailed(table, contamination_cutoff, missing).map(|f| f.table)
}

/// Keep rows with completeness strictly above the cutoff.
///
/// Without an explicit cutoff, the knee of the descending completeness
/// curve is used.
pub fn filter_checkm_completeness(
    table: &GenomeTable,
    completeness_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<GenomeTable> {
    filter_checkm_completeness_detailed(table, completeness_cutoff, missing).map(|f| f.table)
}

/// [`filter_checkm_contamination`] with the cutoff and counts.
pub fn filter_checkm_contamination_detailed(
    table: &GenomeTable,
    contamination_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<CheckmFiltered> {
    filter_checkm(
        table,
        Metric::CheckmContamination,
        contamination_cutoff,
        CurveMode::Elbow,
        missing,
        |score, cutoff| score < cutoff,
    )
}

/// [`filter_checkm_completeness`] with the cutoff and counts.
pub fn filter_checkm_completeness_detailed(
    table: &GenomeTable,
    completeness_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<CheckmFiltered> {
    filter_checkm(
        table,
        Metric::CheckmCompleteness,
        completeness_cutoff,
        CurveMode::Knee,
        missing,
        |score, cutoff| score > cutoff,
    )
}

fn filter_checkm<F>(
    table: &GenomeTable,
    metric: Metric,
    explicit: Option<f64>,
    mode: CurveMode,
    missing: MissingPolicy,
    passes: F,
) -> Result<CheckmFiltered>
where
    F: Fn(f64, f64) -> bool,
{
    if table.is_empty() {
        return Ok(CheckmFiltered {
            table: table.clone(),
            cutoff: None,
            n_passed: 0,
            n_missing: 0,
        });
    }
    table.require(metric.column(), STAGE)?;

    let (scored, unscored) = table.partition(|r| !r.metric(metric).is_missing());
    let scored = scored.coerce_float(metric, STAGE)?;

    let cutoff = Cutoff::resolve(explicit, &scored.metric_values(metric), mode);
    let passed = scored.filter(|r| {
        r.metric(metric)
            .as_f64()
            .is_some_and(|score| passes(score, cutoff.value))
    });

    let n_passed = passed.len();
    let n_missing = unscored.len();
    let table = match missing {
        MissingPolicy::Keep => passed.concat(unscored),
        MissingPolicy::Drop => passed,
    };

    Ok(CheckmFiltered {
        table,
        cutoff: Some(cutoff),
        n_passed,
        n_missing,
    })
}
