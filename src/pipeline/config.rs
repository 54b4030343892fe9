//! Serializable configuration for genome quality filtration.

use crate::data::GenomeStatus;
use crate::error::{QcError, Result};
use crate::filter::{MissingPolicy, DEFAULT_L50_TARGET};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and policies for one filtration run.
///
/// Any threshold left unset (or set to zero) falls back to the stage's
/// automatic behavior: no N50 floor, IQR/median contig outlier removal, and
/// elbow/knee cutoffs for CheckM scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Keep Complete genomes with N50 strictly above this.
    pub min_thresh_n50: Option<i64>,
    /// Keep WGS genomes with at most this many contigs.
    pub max_contig: Option<i64>,
    /// Keep genomes with CheckM contamination strictly below this.
    pub contamination_cutoff: Option<f64>,
    /// Keep genomes with CheckM completeness strictly above this.
    pub completeness_cutoff: Option<f64>,
    /// Statuses the CheckM filters apply to; `None` applies them to every row.
    pub checkm_filter_statuses: Option<Vec<GenomeStatus>>,
    /// Handling of rows without CheckM scores.
    pub checkm_missing: MissingPolicy,
    /// Required L50 for Complete genomes.
    pub l50_target: i64,
    /// Whether to return the filtration ledger.
    pub return_stats: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_thresh_n50: None,
            max_contig: None,
            contamination_cutoff: None,
            completeness_cutoff: None,
            checkm_filter_statuses: Some(vec![GenomeStatus::Wgs]),
            checkm_missing: MissingPolicy::Keep,
            l50_target: DEFAULT_L50_TARGET,
            return_stats: true,
        }
    }
}

impl QualityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum N50 for Complete genomes.
    pub fn min_thresh_n50(mut self, value: i64) -> Self {
        self.min_thresh_n50 = Some(value);
        self
    }

    /// Set the maximum contig count for WGS genomes.
    pub fn max_contig(mut self, value: i64) -> Self {
        self.max_contig = Some(value);
        self
    }

    /// Set an explicit contamination cutoff.
    pub fn contamination_cutoff(mut self, value: f64) -> Self {
        self.contamination_cutoff = Some(value);
        self
    }

    /// Set an explicit completeness cutoff.
    pub fn completeness_cutoff(mut self, value: f64) -> Self {
        self.completeness_cutoff = Some(value);
        self
    }

    /// Restrict CheckM filtering to the given statuses.
    pub fn checkm_statuses(mut self, statuses: Vec<GenomeStatus>) -> Self {
        self.checkm_filter_statuses = Some(statuses);
        self
    }

    /// Apply CheckM filtering to every status.
    pub fn checkm_all_statuses(mut self) -> Self {
        self.checkm_filter_statuses = None;
        self
    }

    /// Set the missing-score policy.
    pub fn checkm_missing(mut self, policy: MissingPolicy) -> Self {
        self.checkm_missing = policy;
        self
    }

    /// Set the required L50 value.
    pub fn l50_target(mut self, value: i64) -> Self {
        self.l50_target = value;
        self
    }

    /// Choose whether the ledger is returned.
    pub fn return_stats(mut self, value: bool) -> Self {
        self.return_stats = value;
        self
    }

    /// Whether CheckM filtering applies to a genome with this status.
    pub fn checkm_applies_to(&self, status: Option<&GenomeStatus>) -> bool {
        match &self.checkm_filter_statuses {
            None => true,
            Some(statuses) => status.is_some_and(|s| statuses.contains(s)),
        }
    }

    /// Reject thresholds that cannot describe a real assembly.
    pub fn validate(&self) -> Result<()> {
        if self.l50_target < 1 {
            return Err(QcError::InvalidParameter(format!(
                "l50_target must be at least 1, got {}",
                self.l50_target
            )));
        }
        for (name, value) in [
            ("min_thresh_n50", self.min_thresh_n50),
            ("max_contig", self.max_contig),
        ] {
            if let Some(v) = value.filter(|v| *v < 0) {
                return Err(QcError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, v
                )));
            }
        }
        for (name, value) in [
            ("contamination_cutoff", self.contamination_cutoff),
            ("completeness_cutoff", self.completeness_cutoff),
        ] {
            if let Some(v) = value.filter(|v| !v.is_finite() || *v < 0.0) {
                return Err(QcError::InvalidParameter(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }
        // Contamination can exceed 100% on heavily mixed genomes; completeness cannot
        if let Some(v) = self.completeness_cutoff.filter(|v| *v > 100.0) {
            return Err(QcError::InvalidParameter(format!(
                "completeness_cutoff must be at most 100, got {}",
                v
            )));
        }
        Ok(())
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(QcError::from)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(QcError::from)
    }
}
