use crate::model::{BrokenEquality, CategoryTally, CountVerdict, Discrepancy};

/// Judge a finished tally: valid iff `units_seen == sink_row_total == exact_matches`.
///
/// Every pairwise equality that fails is reported, together with the most
/// likely reading of the failure.
pub fn reconcile_counts(tally: &CategoryTally) -> CountVerdict {
    let units = tally.units_seen;
    let sink = tally.sink_row_total;
    let matches = tally.exact_matches;

    let mut broken = Vec::new();
    if units != sink {
        broken.push(BrokenEquality::UnitsVsSinkRows);
    }
    if units != matches {
        broken.push(BrokenEquality::UnitsVsMatches);
    }
    if sink != matches {
        broken.push(BrokenEquality::SinkRowsVsMatches);
    }

    let discrepancy = if sink < units {
        Some(Discrepancy::SinkShort)
    } else if sink > units {
        Some(Discrepancy::SinkSurplus)
    } else if matches != units {
        Some(Discrepancy::KeyMismatch)
    } else {
        None
    };

    CountVerdict {
        valid: broken.is_empty(),
        broken,
        discrepancy,
    }
}
