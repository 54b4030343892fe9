//! Contiguity filters for complete assemblies.

use crate::data::{GenomeTable, Metric};
use crate::error::Result;

const STAGE: &str = "L50/N50";

/// L50 value of a single-contig assembly.
pub const DEFAULT_L50_TARGET: i64 = 1;

/// Keep genomes whose L50 equals `l50_target`.
///
/// Rows missing L50 are dropped first; the column is coerced to integers.
pub fn filter_l50(table: &GenomeTable, l50_target: i64) -> Result<GenomeTable> {
    let present = table
        .drop_missing(Metric::ContigL50, STAGE)?
        .coerce_int(Metric::ContigL50, STAGE)?;
    Ok(present.filter(|r| r.contig_l50.as_int() == Some(l50_target)))
}

/// Drop genomes missing N50, then keep those strictly above `min_thresh_n50`.
///
/// Without a threshold (or with a zero threshold) every row with an N50 passes.
pub fn filter_n50(table: &GenomeTable, min_thresh_n50: Option<i64>) -> Result<GenomeTable> {
    let present = table
        .drop_missing(Metric::ContigN50, STAGE)?
        .coerce_int(Metric::ContigN50, STAGE)?;
    match min_thresh_n50.filter(|t| *t != 0) {
        Some(threshold) => Ok(present.filter(|r| {
            r.contig_n50.as_int().is_some_and(|n50| n50 > threshold)
        })),
        None => Ok(present),
    }
}

/// L50 then N50 filtering, as applied to the Complete partition.
pub fn filter_l50_n50(
    table: &GenomeTable,
    l50_target: i64,
    min_thresh_n50: Option<i64>,
) -> Result<GenomeTable> {
    filter_n50(&filter_l50(table, l50_target)?, min_thresh_n50)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenomeRecord, Value};

    fn record(id: &str, l50: Option<i64>, n50: Option<f64>) -> GenomeRecord {
        GenomeRecord::new(id)
            .with_metric(Metric::ContigL50, l50)
            .with_metric(Metric::ContigN50, n50)
    }

    fn create_test_table() -> GenomeTable {
        GenomeTable::from_records(vec![
            record("a", Some(1), Some(5_000_000.0)),
            record("b", Some(2), Some(2_000_000.0)),
            record("c", None, Some(4_000_000.0)),
            record("d", Some(1), None),
            record("e", Some(1), Some(900_000.0)),
        ])
    }

    #[test]
    fn test_filter_l50_default_target() {
        let table = create_test_table();
        let filtered = filter_l50(&table, DEFAULT_L50_TARGET).unwrap();

        assert_eq!(filtered.genome_ids(), vec!["a", "d", "e"]);
        assert!(filtered.iter().all(|r| r.contig_l50 == Value::Int(1)));
    }

    #[test]
    fn test_filter_l50_drops_nan() {
        let table = GenomeTable::from_records(vec![
            record("c", Some(1), Some(5_000_000.0)),
            GenomeRecord {
                contig_l50: Value::Float(f64::NAN),
                ..record("d", None, Some(5_000_000.0))
            },
        ]);
        let filtered = filter_l50(&table, DEFAULT_L50_TARGET).unwrap();
        assert_eq!(filtered.genome_ids(), vec!["c"]);

        let n50 = filter_n50(&table, None).unwrap();
        assert_eq!(n50.len(), 2);
    }

    #[test]
    fn test_filter_l50_other_target() {
        let table = create_test_table();
        let filtered = filter_l50(&table, 2).unwrap();
        assert_eq!(filtered.genome_ids(), vec!["b"]);
    }

    #[test]
    fn test_filter_n50_drops_missing_without_threshold() {
        let table = create_test_table();
        let filtered = filter_n50(&table, None).unwrap();

        assert_eq!(filtered.genome_ids(), vec!["a", "b", "c", "e"]);
        assert_eq!(filtered.records()[0].contig_n50, Value::Int(5_000_000));
    }

    #[test]
    fn test_filter_n50_threshold_is_strict() {
        let table = create_test_table();
        let filtered = filter_n50(&table, Some(2_000_000)).unwrap();
        assert_eq!(filtered.genome_ids(), vec!["a", "c"]);

        let unfiltered = filter_n50(&table, Some(0)).unwrap();
        assert_eq!(unfiltered.len(), 4);
    }

    #[test]
    fn test_filter_l50_n50() {
        let table = create_test_table();
        let filtered = filter_l50_n50(&table, DEFAULT_L50_TARGET, Some(1_000_000)).unwrap();
        assert_eq!(filtered.genome_ids(), vec!["a"]);
    }
}
