//! Data structures for genome quality filtration.

mod ledger;
mod record;
mod table;

pub use ledger::{FiltrationLedger, LedgerEntry};
pub use record::{GenomeRecord, GenomeStatus, Metric, Value, GENOME_ID, GENOME_NAME, GENOME_STATUS};
pub use table::GenomeTable;
