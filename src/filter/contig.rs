//! Contig-count filtering for draft (WGS) assemblies.

use crate::data::{GenomeTable, Metric};
use crate::error::Result;
use crate::profile::{median, quantile_sorted};
use serde::{Deserialize, Serialize};

const STAGE: &str = "contig_count";

/// Multiplier on the interquartile range for the upper fence.
pub const IQR_FENCE_FACTOR: f64 = 1.5;
/// Multiplier on the post-fence median for the second pass.
pub const MEDIAN_LIMIT_FACTOR: f64 = 2.5;

/// Bounds used by the automatic two-pass outlier removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContigOutlierBounds {
    pub q1: f64,
    pub q3: f64,
    /// `q3 + 1.5 * (q3 - q1)`.
    pub upper_fence: f64,
    /// Median of the counts that survived the fence.
    pub median_after_fence: f64,
    /// `2.5 * median_after_fence`.
    pub median_limit: f64,
    pub removed_by_fence: usize,
    pub removed_by_median: usize,
}

impl std::fmt::Display for ContigOutlierBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Contig Outlier Bounds")?;
        writeln!(f, "  Q1:           {:.2}", self.q1)?;
        writeln!(f, "  Q3:           {:.2}", self.q3)?;
        writeln!(f, "  Upper fence:  {:.2} ({} removed)", self.upper_fence, self.removed_by_fence)?;
        writeln!(
            f,
            "  Median limit: {:.2} ({} removed)",
            self.median_limit, self.removed_by_median
        )?;
        Ok(())
    }
}

/// Filter genomes by contig count.
///
/// Rows missing a contig count are dropped and the column is coerced to
/// integers. With `max_contig` set (and non-zero), rows at or below it are
/// kept; otherwise [`remove_contig_outliers`] picks the bound. An empty input
/// is returned unchanged.
pub fn filter_by_contig(table: &GenomeTable, max_contig: Option<i64>) -> Result<GenomeTable> {
    filter_by_contig_with_bounds(table, max_contig).map(|(filtered, _)| filtered)
}

/// Like [`filter_by_contig`], also returning the automatic bounds when they were used.
pub fn filter_by_contig_with_bounds(
    table: &GenomeTable,
    max_contig: Option<i64>,
) -> Result<(GenomeTable, Option<ContigOutlierBounds>)> {
    if table.is_empty() {
        return Ok((table.clone(), None));
    }

    let present = table
        .drop_missing(Metric::Contigs, STAGE)?
        .coerce_int(Metric::Contigs, STAGE)?;

    match max_contig.filter(|m| *m != 0) {
        Some(max) => {
            let kept = present.filter(|r| r.contigs.as_int().is_some_and(|c| c <= max));
            Ok((kept, None))
        }
        None => {
            let (kept, bounds) = remove_contig_outliers(&present);
            Ok((kept, Some(bounds)))
        }
    }
}

/// Two-pass upper outlier removal on contig counts.
///
/// 1. Drop rows above `Q3 + 1.5 * IQR`.
/// 2. Drop rows above `2.5 *` the median of the survivors.
///
/// Rows without a numeric contig count never pass.
pub fn remove_contig_outliers(table: &GenomeTable) -> (GenomeTable, ContigOutlierBounds) {
    let mut counts = table.metric_values(Metric::Contigs);
    counts.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile_sorted(&counts, 0.25);
    let q3 = quantile_sorted(&counts, 0.75);
    let upper_fence = q3 + IQR_FENCE_FACTOR * (q3 - q1);

    let within = |limit: f64| move |c: f64| c <= limit;

    let fenced = table.filter(|r| r.contigs.as_f64().is_some_and(within(upper_fence)));
    let median_after_fence = median(&fenced.metric_values(Metric::Contigs));
    let median_limit = MEDIAN_LIMIT_FACTOR * median_after_fence;
    let kept = fenced.filter(|r| r.contigs.as_f64().is_some_and(within(median_limit)));

    let bounds = ContigOutlierBounds {
        q1,
        q3,
        upper_fence,
        median_after_fence,
        median_limit,
        removed_by_fence: table.len() - fenced.len(),
        removed_by_median: fenced.len() - kept.len(),
    };
    (kept, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenomeRecord, GenomeStatus};
    use approx::assert_relative_eq;

    fn wgs_table(counts: &[Option<i64>]) -> GenomeTable {
        let records = counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                GenomeRecord::new(&format!("wgs_{}", i))
                    .with_status(GenomeStatus::Wgs)
                    .with_metric(Metric::Contigs, *c)
            })
            .collect();
        GenomeTable::from_records(records)
    }

    fn heavy_tail() -> GenomeTable {
        wgs_table(&[1, 2, 2, 3, 3, 4, 4, 5, 50, 60].map(Some))
    }

    #[test]
    fn test_auto_outlier_removal() {
        let (filtered, bounds) = filter_by_contig_with_bounds(&heavy_tail(), None).unwrap();
        let bounds = bounds.unwrap();

        assert_eq!(filtered.len(), 8);
        assert_relative_eq!(bounds.upper_fence, 8.5);
        assert_relative_eq!(bounds.median_after_fence, 3.0);
        assert_relative_eq!(bounds.median_limit, 7.5);
        assert_eq!(bounds.removed_by_fence, 2);
        assert_eq!(bounds.removed_by_median, 0);
        assert!(filtered.iter().all(|r| r.contigs.as_int().unwrap() <= 5));
    }

    #[test]
    fn test_auto_outlier_removal_is_idempotent() {
        let once = filter_by_contig(&heavy_tail(), None).unwrap();
        let twice = filter_by_contig(&once, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_median_pass_trims_after_fence() {
        // The fence keeps the 10s, but they sit above 2.5x the median.
        let table = wgs_table(&[1, 1, 1, 1, 10, 10, 10].map(Some));
        let (filtered, bounds) = remove_contig_outliers(&table);

        assert_relative_eq!(bounds.upper_fence, 23.5);
        assert_relative_eq!(bounds.median_limit, 2.5);
        assert_eq!(bounds.removed_by_fence, 0);
        assert_eq!(bounds.removed_by_median, 3);
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_explicit_max_contig() {
        let filtered = filter_by_contig(&heavy_tail(), Some(4)).unwrap();
        assert_eq!(filtered.len(), 7);
    }

    #[test]
    fn test_drops_missing_counts() {
        let table = wgs_table(&[Some(10), None, Some(12)]);
        let filtered = filter_by_contig(&table, Some(100)).unwrap();
        assert_eq!(filtered.genome_ids(), vec!["wgs_0", "wgs_2"]);
    }

    #[test]
    fn test_empty_is_noop() {
        let empty = GenomeTable::new(vec!["genome_id".to_string()], vec![]).unwrap();
        let (filtered, bounds) = filter_by_contig_with_bounds(&empty, None).unwrap();
        assert!(filtered.is_empty());
        assert!(bounds.is_none());
    }
}
