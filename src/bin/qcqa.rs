//! QCQA - Genome assembly quality filtration CLI
//!
//! Command-line interface for filtering genome summary tables.

use clap::{Parser, Subcommand, ValueEnum};
use genome_qcqa::cutoff::{inflection_cutoff, CurveMode};
use genome_qcqa::data::{GenomeStatus, GenomeTable, Metric, Value};
use genome_qcqa::error::{QcError, Result};
use genome_qcqa::filter::MissingPolicy;
use genome_qcqa::pipeline::{QualityConfig, QualityFilter, QualityOutcome};
use genome_qcqa::profile::profile_metric;
use genome_qcqa::report::TracingReporter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// CLI-friendly missing-score policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissing {
    /// Pass genomes without CheckM scores through
    Keep,
    /// Discard genomes without CheckM scores
    Drop,
}

impl From<CliMissing> for MissingPolicy {
    fn from(policy: CliMissing) -> Self {
        match policy {
            CliMissing::Keep => MissingPolicy::Keep,
            CliMissing::Drop => MissingPolicy::Drop,
        }
    }
}

/// CLI-friendly curve mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCurve {
    /// Values sorted ascending, minimum of the rotated curve
    Elbow,
    /// Values sorted descending, maximum of the rotated curve
    Knee,
}

impl From<CliCurve> for CurveMode {
    fn from(curve: CliCurve) -> Self {
        match curve {
            CliCurve::Elbow => CurveMode::Elbow,
            CliCurve::Knee => CurveMode::Knee,
        }
    }
}

/// Genome assembly quality filtration
#[derive(Parser)]
#[command(name = "qcqa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a genome summary table by assembly quality
    Filter {
        /// Path to genome summary TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Species name to select first (repeatable; species run in parallel)
        #[arg(short, long)]
        species: Vec<String>,

        /// Path to a quality configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep Complete genomes with N50 above this
        #[arg(long)]
        min_n50: Option<i64>,

        /// Keep WGS genomes with at most this many contigs
        #[arg(long)]
        max_contig: Option<i64>,

        /// Keep genomes with CheckM contamination below this
        #[arg(long)]
        contamination: Option<f64>,

        /// Keep genomes with CheckM completeness above this
        #[arg(long)]
        completeness: Option<f64>,

        /// Statuses the CheckM filters apply to: "all" or a comma list (e.g. WGS,Complete)
        #[arg(long)]
        checkm_statuses: Option<String>,

        /// Handling of genomes without CheckM scores
        #[arg(long, value_enum)]
        checkm_missing: Option<CliMissing>,

        /// Output path for the filtered TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Output path for the per-stage ledger TSV
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Detect an elbow or knee cutoff on one column
    Cutoff {
        /// Path to genome summary TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Column to analyze
        #[arg(long)]
        column: String,

        /// Curve shape to detect
        #[arg(long, value_enum)]
        curve: CliCurve,
    },

    /// Summarize metric distributions
    Profile {
        /// Path to genome summary TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output format: text, json, or yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("genome_qcqa=info,qcqa=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            input,
            species,
            config,
            min_n50,
            max_contig,
            contamination,
            completeness,
            checkm_statuses,
            checkm_missing,
            output,
            stats,
        } => build_config(
            config.as_deref(),
            min_n50,
            max_contig,
            contamination,
            completeness,
            checkm_statuses.as_deref(),
            checkm_missing,
        )
        .and_then(|config| cmd_filter(&input, &species, config, &output, stats.as_deref())),

        Commands::Cutoff {
            input,
            column,
            curve,
        } => cmd_cutoff(&input, &column, curve.into()),

        Commands::Profile { input, format } => cmd_profile(&input, &format),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Merge the YAML configuration (if any) with command-line overrides.
fn build_config(
    path: Option<&Path>,
    min_n50: Option<i64>,
    max_contig: Option<i64>,
    contamination: Option<f64>,
    completeness: Option<f64>,
    checkm_statuses: Option<&str>,
    checkm_missing: Option<CliMissing>,
) -> Result<QualityConfig> {
    let mut config = match path {
        Some(path) => QualityConfig::from_yaml_file(path)?,
        None => QualityConfig::default(),
    };
    if let Some(v) = min_n50 {
        config = config.min_thresh_n50(v);
    }
    if let Some(v) = max_contig {
        config = config.max_contig(v);
    }
    if let Some(v) = contamination {
        config = config.contamination_cutoff(v);
    }
    if let Some(v) = completeness {
        config = config.completeness_cutoff(v);
    }
    if let Some(list) = checkm_statuses {
        config = if list.eq_ignore_ascii_case("all") {
            config.checkm_all_statuses()
        } else {
            config.checkm_statuses(
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(GenomeStatus::from)
                    .collect(),
            )
        };
    }
    if let Some(policy) = checkm_missing {
        config = config.checkm_missing(policy.into());
    }
    config.validate()?;
    Ok(config)
}

fn cmd_filter(
    input: &Path,
    species: &[String],
    config: QualityConfig,
    output: &Path,
    stats: Option<&Path>,
) -> Result<()> {
    info!(path = %input.display(), "loading genome summary");
    let table = GenomeTable::from_tsv(input)?;
    info!(genomes = table.len(), columns = table.columns().len(), "loaded");

    match species {
        [] => {
            let reporter = TracingReporter::new();
            let outcome = QualityFilter::new(config).with_reporter(&reporter).run(&table)?;
            write_outcome(&outcome, output, stats)
        }
        [name] => {
            let reporter = TracingReporter::with_label(name);
            let outcome = QualityFilter::new(config)
                .with_reporter(&reporter)
                .run_species(&table, name)?;
            write_outcome(&outcome, output, stats)
        }
        _ => {
            let reporter = TracingReporter::new();
            let filter = QualityFilter::new(config).with_reporter(&reporter);
            let mut failed = 0;
            for (name, result) in filter.run_per_species(&table, species) {
                let suffix = species_suffix(&name);
                let result = result.and_then(|outcome| {
                    write_outcome(
                        &outcome,
                        &with_suffix(output, &suffix),
                        stats.map(|p| with_suffix(p, &suffix)).as_deref(),
                    )
                });
                if let Err(e) = result {
                    warn!(species = %name, "filtration failed: {}", e);
                    failed += 1;
                }
            }
            if failed > 0 {
                return Err(QcError::Pipeline(format!(
                    "{} of {} species failed",
                    failed,
                    species.len()
                )));
            }
            Ok(())
        }
    }
}

fn write_outcome(outcome: &QualityOutcome, output: &Path, stats: Option<&Path>) -> Result<()> {
    outcome.table.to_tsv(output)?;
    info!(path = %output.display(), genomes = outcome.table.len(), "wrote filtered table");

    if let Some(ledger) = &outcome.ledger {
        eprintln!("{}", ledger);
        if let Some(path) = stats {
            ledger.to_tsv(path)?;
            info!(path = %path.display(), "wrote ledger");
        }
    }
    Ok(())
}

fn species_suffix(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tsv".to_string());
    path.with_file_name(format!("{}.{}.{}", stem, suffix, ext))
}

fn cmd_cutoff(input: &Path, column: &str, curve: CurveMode) -> Result<()> {
    let table = GenomeTable::from_tsv(input)?;
    table.require(column, "cutoff")?;

    let values: Vec<f64> = table
        .iter()
        .filter_map(|r| Value::parse(&r.cell(column)).as_f64())
        .collect();
    if values.is_empty() {
        return Err(QcError::EmptyData(format!(
            "Column '{}' has no numeric values",
            column
        )));
    }

    let cutoff = inflection_cutoff(&values, curve);
    info!(column, curve = %curve, n = values.len(), cutoff, "detected cutoff");
    println!("{}", cutoff);
    Ok(())
}

fn cmd_profile(input: &Path, format: &str) -> Result<()> {
    let table = GenomeTable::from_tsv(input)?;
    let profiles: Vec<_> = Metric::ALL
        .iter()
        .filter(|m| table.has_column(m.column()))
        .map(|m| profile_metric(&table, *m))
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&profiles)?),
        "yaml" => println!("{}", serde_yaml::to_string(&profiles)?),
        _ => {
            println!("Genome Summary Profile");
            println!("======================");
            println!();
            println!("Genomes: {}", table.len());
            println!();
            for profile in &profiles {
                println!("{}", profile);
            }
        }
    }
    Ok(())
}
