//! Orchestration of the genome quality filtration stages.

use crate::data::{FiltrationLedger, GenomeStatus, GenomeTable, Metric, GENOME_STATUS};
use crate::error::{QcError, Result};
use crate::filter::{
    filter_by_contig_with_bounds, filter_by_species, filter_checkm_completeness_detailed,
    filter_checkm_contamination_detailed, filter_l50_n50, CheckmFiltered,
};
use crate::pipeline::config::QualityConfig;
use crate::report::{FiltrationReporter, SilentReporter};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

static SILENT: SilentReporter = SilentReporter;

/// Filtration stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Split by genome status into Complete and WGS partitions.
    Prefiltration,
    /// L50/N50 filtering of the Complete partition.
    L50N50,
    /// Contig-count filtering of the WGS partition.
    ContigCount,
    /// CheckM contamination then completeness filtering.
    Checkm,
    /// Type normalization of the final table.
    Done,
}

impl Stage {
    /// Ledger name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Prefiltration => "prefiltration",
            Stage::L50N50 => "L50/N50",
            Stage::ContigCount => "contig_count",
            Stage::Checkm => "CheckM_completeness_contamination",
            Stage::Done => "done",
        }
    }

    /// Following stage, if any.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Prefiltration => Some(Stage::L50N50),
            Stage::L50N50 => Some(Stage::ContigCount),
            Stage::ContigCount => Some(Stage::Checkm),
            Stage::Checkm => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

/// Result of a filtration run.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityOutcome {
    /// Surviving genomes with normalized numeric columns.
    pub table: GenomeTable,
    /// Per-stage counts, when requested.
    pub ledger: Option<FiltrationLedger>,
}

/// Runs the filtration stages with a fixed configuration and reporter.
///
/// Each run works on its own copy of the input, so one filter can be shared
/// across threads.
pub struct QualityFilter<'a> {
    config: QualityConfig,
    reporter: &'a dyn FiltrationReporter,
}

impl QualityFilter<'static> {
    /// Create a filter that reports nothing.
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            reporter: &SILENT,
        }
    }
}

impl<'a> QualityFilter<'a> {
    /// Use a different reporter.
    pub fn with_reporter<'b>(self, reporter: &'b dyn FiltrationReporter) -> QualityFilter<'b> {
        QualityFilter {
            config: self.config,
            reporter,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Filter a species table through every stage.
    pub fn run(&self, table: &GenomeTable) -> Result<QualityOutcome> {
        self.config.validate()?;

        let mut state = RunState::new(table, &self.config, self.reporter)?;
        while let Some(running) = state.stage.next() {
            state = state.step().map_err(|e| match e {
                QcError::MissingRequiredColumn { .. } | QcError::InvalidValue { .. } => e,
                other => QcError::Pipeline(format!("Stage {} failed: {}", running.name(), other)),
            })?;
        }
        state.finalize()
    }

    /// Select a species, then filter it.
    pub fn run_species(&self, table: &GenomeTable, species_name: &str) -> Result<QualityOutcome> {
        let species = filter_by_species(table, species_name)?;
        self.run(&species)
    }

    /// Filter several species in parallel, one independent run per species.
    pub fn run_per_species(
        &self,
        table: &GenomeTable,
        species: &[String],
    ) -> Vec<(String, Result<QualityOutcome>)> {
        species
            .par_iter()
            .map(|name| (name.clone(), self.run_species(table, name)))
            .collect()
    }
}

/// Filter a table by genome quality.
///
/// Convenience wrapper around [`QualityFilter`].
pub fn filter_by_genome_quality(
    table: &GenomeTable,
    config: &QualityConfig,
    reporter: &dyn FiltrationReporter,
) -> Result<QualityOutcome> {
    QualityFilter::new(config.clone())
        .with_reporter(reporter)
        .run(table)
}

/// Internal state during a run.
struct RunState<'a> {
    stage: Stage,
    config: &'a QualityConfig,
    reporter: &'a dyn FiltrationReporter,
    complete: GenomeTable,
    wgs: GenomeTable,
    filtered: Option<GenomeTable>,
    ledger: FiltrationLedger,
}

impl<'a> RunState<'a> {
    /// Prefiltration: split into Complete and WGS partitions.
    ///
    /// Rows with any other status leave the run here. They are counted in the
    /// initial total and show up as removed by the next stage.
    fn new(
        table: &GenomeTable,
        config: &'a QualityConfig,
        reporter: &'a dyn FiltrationReporter,
    ) -> Result<Self> {
        let stage = Stage::Prefiltration;
        table.require(GENOME_STATUS, stage.name())?;
        reporter.stage_started(stage.name(), table.len());

        let complete = table.filter(|r| r.has_status(&GenomeStatus::Complete));
        let wgs = table.filter(|r| r.has_status(&GenomeStatus::Wgs));
        let excluded = table.len() - complete.len() - wgs.len();
        if excluded > 0 {
            reporter.note(
                stage.name(),
                &format!("{} genomes are neither Complete nor WGS and are excluded", excluded),
            );
        }

        let ledger = FiltrationLedger::start(stage.name(), table.len());
        if let Some(entry) = ledger.last() {
            reporter.stage_finished(entry);
        }

        Ok(Self {
            stage,
            config,
            reporter,
            complete,
            wgs,
            filtered: None,
            ledger,
        })
    }

    /// Run the stage after the current one. A finished run is left as is.
    fn step(mut self) -> Result<Self> {
        let next = match self.stage {
            Stage::Done => return Ok(self),
            Stage::Prefiltration => {
                self.begin(Stage::L50N50);
                self.complete = filter_l50_n50(
                    &self.complete,
                    self.config.l50_target,
                    self.config.min_thresh_n50,
                )?;
                Stage::L50N50
            }
            Stage::L50N50 => {
                self.begin(Stage::ContigCount);
                let (wgs, bounds) = filter_by_contig_with_bounds(&self.wgs, self.config.max_contig)?;
                if let Some(bounds) = bounds {
                    self.reporter.note(
                        Stage::ContigCount.name(),
                        &format!(
                            "upper fence {:.2} removed {}, median limit {:.2} removed {}",
                            bounds.upper_fence,
                            bounds.removed_by_fence,
                            bounds.median_limit,
                            bounds.removed_by_median
                        ),
                    );
                }
                self.wgs = wgs;
                Stage::ContigCount
            }
            Stage::ContigCount => {
                self.begin(Stage::Checkm);
                let empty = self.complete.empty_like();
                let complete = std::mem::replace(&mut self.complete, empty.clone());
                let wgs = std::mem::replace(&mut self.wgs, empty);
                let merged = complete.concat(wgs);
                let config = self.config;
                let (eligible, exempt) =
                    merged.partition(|r| config.checkm_applies_to(r.genome_status.as_ref()));

                let contamination = filter_checkm_contamination_detailed(
                    &eligible,
                    config.contamination_cutoff,
                    config.checkm_missing,
                )?;
                self.report_cutoff(Metric::CheckmContamination, &contamination);

                let completeness = filter_checkm_completeness_detailed(
                    &contamination.table,
                    config.completeness_cutoff,
                    config.checkm_missing,
                )?;
                self.report_cutoff(Metric::CheckmCompleteness, &completeness);

                self.filtered = Some(completeness.table.concat(exempt));
                Stage::Checkm
            }
            Stage::Checkm => {
                self.begin(Stage::Done);
                let table = self.filtered.take().ok_or_else(|| {
                    QcError::Pipeline("CheckM stage must run before done".to_string())
                })?;
                self.filtered = Some(normalize_columns(table)?);
                self.stage = Stage::Done;
                return Ok(self);
            }
        };

        let remaining = self.rows();
        let entry = self.ledger.append_entry(next.name(), remaining)?;
        self.reporter.stage_finished(entry);
        self.stage = next;
        Ok(self)
    }

    fn begin(&self, stage: Stage) {
        self.reporter.stage_started(stage.name(), self.rows());
    }

    fn rows(&self) -> usize {
        match &self.filtered {
            Some(table) => table.len(),
            None => self.complete.len() + self.wgs.len(),
        }
    }

    fn report_cutoff(&self, metric: Metric, filtered: &CheckmFiltered) {
        if let Some(cutoff) = &filtered.cutoff {
            self.reporter.cutoff_selected(metric, cutoff);
        }
    }

    fn finalize(self) -> Result<QualityOutcome> {
        if self.stage != Stage::Done {
            return Err(QcError::Pipeline(format!(
                "Run stopped at stage {}",
                self.stage.name()
            )));
        }
        let table = self
            .filtered
            .ok_or_else(|| QcError::Pipeline("No filtered table produced".to_string()))?;
        let ledger = self.config.return_stats.then_some(self.ledger);
        Ok(QualityOutcome { table, ledger })
    }
}

/// Coerce contiguity and CheckM columns to their canonical numeric types.
fn normalize_columns(table: GenomeTable) -> Result<GenomeTable> {
    let stage = Stage::Done.name();
    table
        .coerce_int(Metric::ContigL50, stage)?
        .coerce_int(Metric::ContigN50, stage)?
        .coerce_int(Metric::Contigs, stage)?
        .coerce_numeric(Metric::CheckmContamination, stage)?
        .coerce_numeric(Metric::CheckmCompleteness, stage)?
        .coerce_float(Metric::GcContent, stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenomeRecord, Value};
    use crate::filter::MissingPolicy;

    fn complete(id: &str, l50: i64, n50: i64) -> GenomeRecord {
        GenomeRecord::new(id)
            .with_status(GenomeStatus::Complete)
            .with_metric(Metric::ContigL50, l50)
            .with_metric(Metric::ContigN50, n50)
            .with_metric(Metric::Contigs, 1)
            .with_metric(Metric::GcContent, 50.5)
    }

    fn wgs(id: &str, contigs: i64) -> GenomeRecord {
        GenomeRecord::new(id)
            .with_status(GenomeStatus::Wgs)
            .with_metric(Metric::ContigL50, 8)
            .with_metric(Metric::ContigN50, 200_000)
            .with_metric(Metric::Contigs, contigs)
            .with_metric(Metric::GcContent, 50.7)
    }

    fn create_test_table() -> GenomeTable {
        GenomeTable::from_records(vec![
            complete("c1", 1, 5_000_000),
            complete("c2", 2, 3_000_000),
            complete("c3", 1, 4_900_000),
            wgs("w1", 40).with_metric(Metric::CheckmContamination, 0.5),
            wgs("w2", 55).with_metric(Metric::CheckmContamination, 1.2),
            wgs("w3", 60),
            wgs("w4", 900).with_metric(Metric::CheckmContamination, 0.1),
            GenomeRecord::new("p1").with_status(GenomeStatus::Other("Plasmid".to_string())),
        ])
    }

    #[test]
    fn test_stage_sequence() {
        let mut stage = Stage::Prefiltration;
        let mut names = vec![stage.name()];
        while let Some(next) = stage.next() {
            names.push(next.name());
            stage = next;
        }
        assert_eq!(
            names,
            vec![
                "prefiltration",
                "L50/N50",
                "contig_count",
                "CheckM_completeness_contamination",
                "done"
            ]
        );
    }

    #[test]
    fn test_run_ledger_is_chained() {
        let table = create_test_table();
        let config = QualityConfig::new()
            .max_contig(100)
            .contamination_cutoff(1.0)
            .completeness_cutoff(50.0);
        let outcome = QualityFilter::new(config).run(&table).unwrap();
        let ledger = outcome.ledger.unwrap();
        let entries = ledger.entries();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].initial, table.len());
        for pair in entries.windows(2) {
            assert_eq!(pair[1].initial, pair[0].remaining);
        }
        // Plasmid and c2 leave at L50/N50, w4 at contig count, w2 at CheckM
        assert_eq!(entries[0].remaining, 8);
        assert_eq!(entries[1].remaining, 6);
        assert_eq!(entries[2].remaining, 5);
        assert_eq!(entries[3].remaining, 4);
        assert_eq!(outcome.table.genome_ids(), vec!["w1", "w3", "c1", "c3"]);
    }

    #[test]
    fn test_checkm_exempt_rows_pass_through() {
        let table = create_test_table();
        let config = QualityConfig::new()
            .max_contig(100)
            .contamination_cutoff(1.0)
            .checkm_missing(MissingPolicy::Drop);
        let outcome = QualityFilter::new(config).run(&table).unwrap();

        // Complete genomes have no CheckM scores but are exempt by default
        let ids = outcome.table.genome_ids();
        assert!(ids.contains(&"c1"));
        assert!(ids.contains(&"c3"));
        assert!(!ids.contains(&"w3"));
    }

    #[test]
    fn test_complete_rows_ignore_failing_scores_by_default() {
        let table = GenomeTable::from_records(vec![
            complete("c1", 1, 5_000_000)
                .with_metric(Metric::CheckmContamination, 50.0)
                .with_metric(Metric::CheckmCompleteness, 40.0),
            wgs("w1", 40)
                .with_metric(Metric::CheckmContamination, 50.0)
                .with_metric(Metric::CheckmCompleteness, 99.0),
            wgs("w2", 45)
                .with_metric(Metric::CheckmContamination, 0.5)
                .with_metric(Metric::CheckmCompleteness, 99.0),
        ]);
        let config = QualityConfig::new()
            .contamination_cutoff(5.0)
            .completeness_cutoff(90.0);

        let outcome = QualityFilter::new(config.clone()).run(&table).unwrap();
        assert_eq!(outcome.table.genome_ids(), vec!["w2", "c1"]);

        let all = QualityFilter::new(config.checkm_all_statuses())
            .run(&table)
            .unwrap();
        assert_eq!(all.table.genome_ids(), vec!["w2"]);
    }

    #[test]
    fn test_contamination_cutoff_above_100() {
        let table = GenomeTable::from_records(vec![
            wgs("w1", 40).with_metric(Metric::CheckmContamination, 150.0),
            wgs("w2", 45).with_metric(Metric::CheckmContamination, 250.0),
        ]);
        let outcome = QualityFilter::new(QualityConfig::new().contamination_cutoff(200.0))
            .run(&table)
            .unwrap();
        assert_eq!(outcome.table.genome_ids(), vec!["w1"]);
    }

    #[test]
    fn test_step_after_done_is_noop() {
        let table = create_test_table();
        let config = QualityConfig::default();
        let mut state = RunState::new(&table, &config, &SILENT).unwrap();
        while state.stage != Stage::Done {
            state = state.step().unwrap();
        }
        let entries = state.ledger.len();
        let rows = state.rows();

        let state = state.step().unwrap();
        assert_eq!(state.stage, Stage::Done);
        assert_eq!(state.ledger.len(), entries);
        assert_eq!(state.rows(), rows);
    }

    #[test]
    fn test_return_stats_false_omits_ledger() {
        let table = create_test_table();
        let outcome = QualityFilter::new(QualityConfig::new().return_stats(false))
            .run(&table)
            .unwrap();
        assert!(outcome.ledger.is_none());
    }

    #[test]
    fn test_columns_normalized() {
        let table = GenomeTable::from_records(vec![
            GenomeRecord::new("c1")
                .with_status(GenomeStatus::Complete)
                .with_metric(Metric::ContigL50, 1.0)
                .with_metric(Metric::ContigN50, "4500000")
                .with_metric(Metric::Contigs, 1.0)
                .with_metric(Metric::GcContent, 51)
                .with_metric(Metric::CheckmCompleteness, "n/a"),
        ]);
        let outcome = QualityFilter::new(QualityConfig::default()).run(&table).unwrap();
        let record = &outcome.table.records()[0];

        assert_eq!(record.contig_l50, Value::Int(1));
        assert_eq!(record.contig_n50, Value::Int(4_500_000));
        assert_eq!(record.contigs, Value::Int(1));
        assert_eq!(record.gc_content, Value::Float(51.0));
        assert_eq!(record.checkm_completeness, Value::Missing);
    }

    #[test]
    fn test_missing_status_column() {
        let table = GenomeTable::new(vec!["genome_id".to_string()], vec![]).unwrap();
        let err = QualityFilter::new(QualityConfig::default())
            .run(&table)
            .unwrap_err();
        match err {
            QcError::MissingRequiredColumn { column, stage } => {
                assert_eq!(column, "genome_status");
                assert_eq!(stage, "prefiltration");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let table = create_test_table();
        let result = QualityFilter::new(QualityConfig::new().l50_target(0)).run(&table);
        assert!(matches!(result, Err(QcError::InvalidParameter(_))));
    }
}
