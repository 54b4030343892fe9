//! Genome quality filtration pipeline: configuration and execution.

mod config;
mod runner;

pub use config::QualityConfig;
pub use runner::{filter_by_genome_quality, QualityFilter, QualityOutcome, Stage};
