//! Species selection.

use crate::data::{GenomeTable, Metric, GENOME_NAME};
use crate::error::Result;

const STAGE: &str = "species";

/// Keep genomes whose name contains `species_name` (case-sensitive).
///
/// Rows missing genome length or CDS count are then dropped and both
/// columns are coerced to integers.
/// An empty result is not an error.
pub fn filter_by_species(table: &GenomeTable, species_name: &str) -> Result<GenomeTable> {
    table.require(GENOME_NAME, STAGE)?;

    let matched = table.filter(|r| {
        r.genome_name
            .as_deref()
            .is_some_and(|name| name.contains(species_name))
    });

    matched
        .drop_missing(Metric::GenomeLength, STAGE)?
        .drop_missing(Metric::PatricCds, STAGE)?
        .coerce_int(Metric::GenomeLength, STAGE)?
        .coerce_int(Metric::PatricCds, STAGE)
}
