//! Per-stage filtration accounting.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Counts for one filtration stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Stage name.
    pub stage: String,
    /// Rows entering the stage.
    pub initial: usize,
    /// Rows removed by the stage.
    #[serde(rename = "num_filtered")]
    pub removed: usize,
    /// Rows leaving the stage.
    pub remaining: usize,
}

/// Ordered record of before/after counts for each stage.
///
/// Entries are chained: every entry's `initial` equals the previous entry's
/// `remaining`, and `initial == removed + remaining` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltrationLedger {
    entries: Vec<LedgerEntry>,
}

impl FiltrationLedger {
    /// Start a ledger with an entry that removes nothing.
    pub fn start(stage: &str, initial: usize) -> Self {
        Self {
            entries: vec![LedgerEntry {
                stage: stage.to_string(),
                initial,
                removed: 0,
                remaining: initial,
            }],
        }
    }

    /// Append a stage whose input is the previous stage's output.
    pub fn append_entry(&mut self, stage: &str, remaining: usize) -> Result<&LedgerEntry> {
        let initial = self
            .entries
            .last()
            .map(|e| e.remaining)
            .ok_or_else(|| QcError::EmptyData("Ledger has no starting entry".to_string()))?;
        if remaining > initial {
            return Err(QcError::InvalidParameter(format!(
                "Stage '{}' reports {} remaining rows but only {} entered",
                stage, remaining, initial
            )));
        }
        self.entries.push(LedgerEntry {
            stage: stage.to_string(),
            initial,
            removed: initial - remaining,
            remaining,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Entries in stage order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by stage name.
    pub fn get(&self, stage: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.stage == stage)
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    /// Rows removed across all stages.
    pub fn total_removed(&self) -> usize {
        self.entries.iter().map(|e| e.removed).sum()
    }

    /// Fraction of the starting rows that survived every stage.
    pub fn retention_rate(&self) -> f64 {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) if first.initial > 0 => {
                last.remaining as f64 / first.initial as f64
            }
            _ => 0.0,
        }
    }

    /// Write the ledger as TSV with one row per stage.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the TSV rendering to any writer.
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "stage\tinitial\tnum_filtered\tremaining")?;
        for e in &self.entries {
            writeln!(writer, "{}\t{}\t{}\t{}", e.stage, e.initial, e.removed, e.remaining)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for FiltrationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|e| e.stage.len())
            .max()
            .unwrap_or(5)
            .max(5);
        writeln!(
            f,
            "{:<width$}  {:>8}  {:>12}  {:>9}",
            "stage",
            "initial",
            "num_filtered",
            "remaining",
            width = width
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "{:<width$}  {:>8}  {:>12}  {:>9}",
                e.stage,
                e.initial,
                e.removed,
                e.remaining,
                width = width
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_entries() {
        let mut ledger = FiltrationLedger::start("prefiltration", 10);
        ledger.append_entry("L50/N50", 8).unwrap();
        ledger.append_entry("contig_count", 6).unwrap();

        let entries = ledger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].removed, 0);
        assert_eq!(entries[1].initial, 10);
        assert_eq!(entries[1].removed, 2);
        assert_eq!(entries[2].initial, entries[1].remaining);
        for e in entries {
            assert_eq!(e.initial, e.removed + e.remaining);
        }
        assert_eq!(ledger.total_removed(), 4);
        assert!((ledger.retention_rate() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_append_rejects_growth() {
        let mut ledger = FiltrationLedger::start("prefiltration", 3);
        assert!(ledger.append_entry("manual", 4).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_append_on_empty_ledger() {
        let mut ledger = FiltrationLedger::default();
        assert!(matches!(
            ledger.append_entry("manual", 0),
            Err(QcError::EmptyData(_))
        ));
    }

    #[test]
    fn test_tsv_and_display() {
        let mut ledger = FiltrationLedger::start("prefiltration", 5);
        ledger.append_entry("manual_curation", 4).unwrap();

        let mut out = Vec::new();
        ledger.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "stage\tinitial\tnum_filtered\tremaining\nprefiltration\t5\t0\t5\nmanual_curation\t5\t1\t4\n"
        );

        let shown = ledger.to_string();
        assert!(shown.contains("manual_curation"));
        assert_eq!(shown.lines().count(), 3);
    }

    #[test]
    fn test_serializes_num_filtered() {
        let ledger = FiltrationLedger::start("prefiltration", 2);
        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"num_filtered\":0"));
    }
}
