//! Filtering stages for genome summary tables.

pub mod assembly;
pub mod checkm;
pub mod contig;
pub mod species;

pub use assembly::{filter_l50, filter_l50_n50, filter_n50, DEFAULT_L50_TARGET};
pub use checkm::{
    filter_checkm_completeness, filter_checkm_completeness_detailed, filter_checkm_contamination,
    filter_checkm_contamination_detailed, CheckmFiltered, MissingPolicy,
};
pub use contig::{
    filter_by_contig, filter_by_contig_with_bounds, remove_contig_outliers, ContigOutlierBounds,
};
pub use species::filter_by_species;

use crate::data::GenomeTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Row counts around a single filter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Rows before filtering.
    pub n_before: usize,
    /// Rows after filtering.
    pub n_after: usize,
    /// Rows removed.
    pub n_removed: usize,
}

impl StageCounts {
    /// Counts between an input and output table.
    pub fn between(before: &GenomeTable, after: &GenomeTable) -> Self {
        let n_before = before.len();
        let n_after = after.len();
        Self {
            n_before,
            n_after,
            n_removed: n_before.saturating_sub(n_after),
        }
    }

    /// Proportion of rows retained.
    pub fn retention_rate(&self) -> f64 {
        if self.n_before == 0 {
            return 0.0;
        }
        self.n_after as f64 / self.n_before as f64
    }
}

impl std::fmt::Display for StageCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Filter Result")?;
        writeln!(f, "  Before:    {} genomes", self.n_before)?;
        writeln!(f, "  After:     {} genomes", self.n_after)?;
        writeln!(f, "  Removed:   {} genomes", self.n_removed)?;
        writeln!(f, "  Retained:  {:.1}%", self.retention_rate() * 100.0)?;
        Ok(())
    }
}

/// Run any stage and report how many rows it removed.
///
/// ```
/// use genome_qcqa::data::GenomeTable;
/// use genome_qcqa::filter::{filter_by_contig, with_stats};
///
/// let table = GenomeTable::from_records(vec![]);
/// let (filtered, counts) = with_stats(&table, |t| filter_by_contig(t, Some(200))).unwrap();
/// assert_eq!(counts.n_removed, 0);
/// assert!(filtered.is_empty());
/// ```
pub fn with_stats<F>(table: &GenomeTable, stage: F) -> Result<(GenomeTable, StageCounts)>
where
    F: FnOnce(&GenomeTable) -> Result<GenomeTable>,
{
    let filtered = stage(table)?;
    let counts = StageCounts::between(table, &filtered);
    Ok((filtered, counts))
}

/// Species filter with counts.
pub fn filter_by_species_with_stats(
    table: &GenomeTable,
    species_name: &str,
) -> Result<(GenomeTable, StageCounts)> {
    with_stats(table, |t| filter_by_species(t, species_name))
}

/// L50/N50 filter with counts.
pub fn filter_l50_n50_with_stats(
    table: &GenomeTable,
    l50_target: i64,
    min_thresh_n50: Option<i64>,
) -> Result<(GenomeTable, StageCounts)> {
    with_stats(table, |t| filter_l50_n50(t, l50_target, min_thresh_n50))
}

/// Contig-count filter with counts.
pub fn filter_by_contig_with_stats(
    table: &GenomeTable,
    max_contig: Option<i64>,
) -> Result<(GenomeTable, StageCounts)> {
    with_stats(table, |t| filter_by_contig(t, max_contig))
}

/// Contamination filter with counts.
pub fn filter_checkm_contamination_with_stats(
    table: &GenomeTable,
    contamination_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<(GenomeTable, StageCounts)> {
    with_stats(table, |t| {
        filter_checkm_contamination(t, contamination_cutoff, missing)
    })
}

/// Completeness filter with counts.
pub fn filter_checkm_completeness_with_stats(
    table: &GenomeTable,
    completeness_cutoff: Option<f64>,
    missing: MissingPolicy,
) -> Result<(GenomeTable, StageCounts)> {
    with_stats(table, |t| {
        filter_checkm_completeness(t, completeness_cutoff, missing)
    })
}
