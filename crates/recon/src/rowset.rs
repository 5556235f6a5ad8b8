use std::collections::HashMap;

use crate::model::{ComparisonMode, DimensionReport, Row};

/// Compare an authoritative row sequence with the sink table's rows.
///
/// `Multiset` ignores order and reports the symmetric difference; `Ordered`
/// compares position by position. Field equality is exact and typed, so a
/// numeric sink cell never equals the loader's text for the same digits.
/// At most `max_samples` differing rows per side are kept.
pub fn reconcile_rows(
    dimension: &str,
    table: &str,
    file_rows: &[Row],
    sink_rows: &[Row],
    mode: ComparisonMode,
    max_samples: usize,
) -> DimensionReport {
    let (only_file, only_sink) = match mode {
        ComparisonMode::Multiset => multiset_difference(file_rows, sink_rows),
        ComparisonMode::Ordered => ordered_difference(file_rows, sink_rows),
    };

    DimensionReport {
        dimension: dimension.to_string(),
        table: table.to_string(),
        mode,
        file_rows: file_rows.len() as u64,
        sink_rows: sink_rows.len() as u64,
        identical: only_file.is_empty() && only_sink.is_empty(),
        only_in_file: only_file.len() as u64,
        only_in_sink: only_sink.len() as u64,
        sample_only_in_file: only_file.into_iter().take(max_samples).cloned().collect(),
        sample_only_in_sink: only_sink.into_iter().take(max_samples).cloned().collect(),
    }
}

/// Rows left over on each side after cancelling equal rows one for one.
fn multiset_difference<'a>(left: &'a [Row], right: &'a [Row]) -> (Vec<&'a Row>, Vec<&'a Row>) {
    let mut balance: HashMap<&Row, i64> = HashMap::new();
    for r in left {
        *balance.entry(r).or_insert(0) += 1;
    }
    for r in right {
        *balance.entry(r).or_insert(0) -= 1;
    }

    let mut only_left = Vec::new();
    for r in left {
        if let Some(n) = balance.get_mut(r) {
            if *n > 0 {
                *n -= 1;
                only_left.push(r);
            }
        }
    }
    let mut only_right = Vec::new();
    for r in right {
        if let Some(n) = balance.get_mut(r) {
            if *n < 0 {
                *n += 1;
                only_right.push(r);
            }
        }
    }
    (only_left, only_right)
}

fn ordered_difference<'a>(left: &'a [Row], right: &'a [Row]) -> (Vec<&'a Row>, Vec<&'a Row>) {
    let mut only_left = Vec::new();
    let mut only_right = Vec::new();
    let common = left.len().min(right.len());
    for (l, r) in left[..common].iter().zip(&right[..common]) {
        if l != r {
            only_left.push(l);
            only_right.push(r);
        }
    }
    only_left.extend(&left[common..]);
    only_right.extend(&right[common..]);
    (only_left, only_right)
}
