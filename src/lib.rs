//! Genome Assembly Quality Filtration Library
//!
//! This library filters tables of genome assembly summaries down to
//! high-quality genomes using hard thresholds and data-driven cutoffs.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (GenomeRecord, GenomeTable, FiltrationLedger)
//! - **profile**: Distribution summaries and quantiles
//! - **cutoff**: Explicit thresholds and elbow/knee detection
//! - **filter**: Species, L50/N50, contig count and CheckM filters
//! - **report**: Progress reporting hooks
//! - **pipeline**: Staged filtration with a per-stage ledger
//!
//! # Example
//!
//! ```no_run
//! use genome_qcqa::prelude::*;
//!
//! let table = GenomeTable::from_tsv("genome_summary.tsv").unwrap();
//! let species = filter_by_species(&table, "Pseudomonas aeruginosa").unwrap();
//!
//! let config = QualityConfig::new().min_thresh_n50(1_000_000).max_contig(250);
//! let outcome = QualityFilter::new(config).run(&species).unwrap();
//!
//! outcome.table.to_tsv("filtered.tsv").unwrap();
//! if let Some(ledger) = outcome.ledger {
//!     println!("{}", ledger);
//! }
//! ```

pub mod cutoff;
pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod profile;
pub mod report;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cutoff::{
        find_inflection, inflection_cutoff, inflection_cutoff_named, CurveMode, Cutoff,
        CutoffSource,
    };
    pub use crate::data::{
        FiltrationLedger, GenomeRecord, GenomeStatus, GenomeTable, LedgerEntry, Metric, Value,
    };
    pub use crate::error::{QcError, Result};
    pub use crate::filter::{
        // Species
        filter_by_species, filter_by_species_with_stats,
        // Contiguity
        filter_l50, filter_l50_n50, filter_n50,
        // Contig count
        filter_by_contig, remove_contig_outliers, ContigOutlierBounds,
        // CheckM
        filter_checkm_completeness, filter_checkm_contamination, MissingPolicy,
        with_stats, StageCounts, filter_by_contig_with_stats, filter_checkm_completeness_with_stats,
        filter_checkm_contamination_with_stats, filter_l50_n50_with_stats,
    };
    pub use crate::pipeline::{
        filter_by_genome_quality, QualityConfig, QualityFilter, QualityOutcome, Stage,
    };
    pub use crate::profile::{median, profile_metric, quantile, DistributionProfile};
    pub use crate::report::{FiltrationReporter, SilentReporter, TracingReporter};
}
