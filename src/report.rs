//! Reporting hooks the filtration pipeline calls as it runs.
//!
//! The pipeline never configures global logging. Callers pass in a
//! [`FiltrationReporter`]; [`TracingReporter`] forwards to `tracing` and
//! [`SilentReporter`] discards everything.

use crate::cutoff::Cutoff;
use crate::data::{LedgerEntry, Metric};
use tracing::{debug, info};

/// Receives progress events from a filtration run.
///
/// All hooks default to no-ops so implementors only override what they need.
pub trait FiltrationReporter: Send + Sync {
    /// A stage is about to run on `rows` input rows.
    fn stage_started(&self, _stage: &str, _rows: usize) {}

    /// A stage finished and its ledger entry was recorded.
    fn stage_finished(&self, _entry: &LedgerEntry) {}

    /// A cutoff was chosen for a metric.
    fn cutoff_selected(&self, _metric: Metric, _cutoff: &Cutoff) {}

    /// Free-form diagnostic from inside a stage.
    fn note(&self, _stage: &str, _message: &str) {}
}

/// Reporter that emits structured `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    /// Label attached to every event, e.g. the species being filtered.
    pub label: Option<String>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a label to every event.
    pub fn with_label(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
        }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("-")
    }
}

impl FiltrationReporter for TracingReporter {
    fn stage_started(&self, stage: &str, rows: usize) {
        debug!(label = self.label(), stage, rows, "stage started");
    }

    fn stage_finished(&self, entry: &LedgerEntry) {
        info!(
            label = self.label(),
            stage = %entry.stage,
            initial = entry.initial,
            removed = entry.removed,
            remaining = entry.remaining,
            "stage finished"
        );
    }

    fn cutoff_selected(&self, metric: Metric, cutoff: &Cutoff) {
        info!(
            label = self.label(),
            metric = metric.column(),
            cutoff = cutoff.value,
            source = %cutoff.source,
            "cutoff selected"
        );
    }

    fn note(&self, stage: &str, message: &str) {
        debug!(label = self.label(), stage, "{}", message);
    }
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl FiltrationReporter for SilentReporter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutoff::{CurveMode, CutoffSource};

    #[test]
    fn test_reporters_accept_events() {
        let entry = LedgerEntry {
            stage: "contig_count".to_string(),
            initial: 10,
            removed: 2,
            remaining: 8,
        };
        let cutoff = Cutoff {
            value: 1.5,
            source: CutoffSource::Detected(CurveMode::Elbow),
        };
        let reporters: Vec<Box<dyn FiltrationReporter>> = vec![
            Box::new(TracingReporter::with_label("Escherichia coli")),
            Box::new(SilentReporter),
        ];
        for reporter in &reporters {
            reporter.stage_started("contig_count", 10);
            reporter.stage_finished(&entry);
            reporter.cutoff_selected(Metric::CheckmContamination, &cutoff);
            reporter.note("contig_count", "fence 8.5");
        }
    }
}
