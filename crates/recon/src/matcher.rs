use tracing::{debug, warn};

use crate::error::ReconError;
use crate::model::{ComparisonUnit, MatchOutcome};
use crate::sink::Sink;

/// Result of one keyed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub outcome: MatchOutcome,
    pub sink_rows: usize,
}

/// Look `unit` up in `table`, filtering on every key column.
///
/// `columns` pairs positionally with the unit's key values. Sink failures
/// propagate; there are no retries.
pub fn match_unit(
    sink: &dyn Sink,
    table: &str,
    columns: &[String],
    unit: &ComparisonUnit,
) -> Result<Lookup, ReconError> {
    let values = unit.key.values();
    if columns.len() != values.len() {
        return Err(ReconError::ConfigValidation(format!(
            "{}: {} key column(s) configured for a key of arity {}",
            unit.category,
            columns.len(),
            values.len()
        )));
    }

    let predicate: Vec<(&str, &str)> = columns
        .iter()
        .map(String::as_str)
        .zip(values.iter().map(String::as_str))
        .collect();

    let rows = sink.lookup(table, &predicate)?;
    let outcome = MatchOutcome::from_row_count(rows.len());
    match outcome {
        MatchOutcome::Ambiguous => warn!(
            category = %unit.category,
            key = %unit.key,
            rows = rows.len(),
            "ambiguous match"
        ),
        _ => debug!(category = %unit.category, key = %unit.key, %outcome, "lookup"),
    }

    Ok(Lookup {
        outcome,
        sink_rows: rows.len(),
    })
}
