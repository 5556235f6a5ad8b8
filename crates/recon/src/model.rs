use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Real-time entity category. Each one maps to a single sink table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TripUpdate,
    Alert,
    VehiclePosition,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::TripUpdate, Self::Alert, Self::VehiclePosition];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TripUpdate => "trip_update",
            Self::Alert => "alert",
            Self::VehiclePosition => "vehicle_position",
        }
    }

    /// Table the ingestion pipeline writes this category into.
    pub fn default_table(&self) -> &'static str {
        match self {
            Self::TripUpdate => "rt_trip_update",
            Self::Alert => "rt_alert",
            Self::VehiclePosition => "rt_vehicle_position",
        }
    }

    /// Sink columns holding the composite key, in key order.
    pub fn default_key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::TripUpdate => &[
                "entity.id",
                "entity.trip_update.trip.trip_id",
                "entity.trip_update.trip.route_id",
                "entity.trip_update.stop_time_update.stop_sequence",
            ],
            Self::Alert => &["entity.id", "entity.alert.informed_entity.route_id"],
            Self::VehiclePosition => &[
                "entity.id",
                "entity.vehicle_position.vehicle_descriptor.id",
                "entity.vehicle_position.trip.trip_id",
                "entity.vehicle_position.trip.route_id",
            ],
        }
    }

    /// Source field paths of the composite key, in key order.
    pub fn key_fields(&self) -> &'static [&'static str] {
        match self {
            Self::TripUpdate => &[
                "entity.id",
                "trip.trip_id",
                "trip.route_id",
                "stop_time_update.stop_sequence",
            ],
            Self::Alert => &["entity.id", "informed_entity.route_id"],
            Self::VehiclePosition => &[
                "entity.id",
                "vehicle.id",
                "trip.trip_id",
                "trip.route_id",
            ],
        }
    }

    pub fn arity(&self) -> usize {
        self.key_fields().len()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Keys + units
// ---------------------------------------------------------------------------

/// Ordered tuple of key values. Equality is exact: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// The atomic record being verified: one entity, or one nested element of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonUnit {
    pub category: Category,
    pub key: CompositeKey,
}

impl ComparisonUnit {
    /// Every key starts with the parent entity's id.
    pub fn entity_id(&self) -> &str {
        self.key.values().first().map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A single typed cell, as stored in the sink or read from a static file.
///
/// Equality is typed: `Integer(1)` and `Text("1")` differ. Reals compare by
/// bit pattern so rows can be hashed into multisets.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Integer(v) => v.hash(state),
            Self::Real(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
            Self::Blob(v) => v.hash(state),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Blob(v) => {
                f.write_str("x'")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// One record, keyed by column name. Column order is irrelevant to equality.
pub type Row = BTreeMap<String, FieldValue>;

/// Build a row from `(column, value)` pairs.
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// No sink row carries the key.
    Missing,
    /// Exactly one sink row carries the key.
    Matched,
    /// More than one sink row carries the key.
    Ambiguous,
}

impl MatchOutcome {
    pub fn from_row_count(rows: usize) -> Self {
        match rows {
            0 => Self::Missing,
            1 => Self::Matched,
            _ => Self::Ambiguous,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Matched => write!(f, "matched"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// A unit that did not match exactly one sink row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitDiagnostic {
    pub key: CompositeKey,
    pub outcome: MatchOutcome,
    pub sink_rows: usize,
}

// ---------------------------------------------------------------------------
// Tallies + verdicts
// ---------------------------------------------------------------------------

/// Per-category counters, accumulated while iterating units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub units_seen: u64,
    /// All rows in the sink table, matched or not.
    pub sink_row_total: u64,
    pub exact_matches: u64,
    pub missing: u64,
    pub ambiguous: u64,
    pub entities_seen: u64,
    /// Entities carrying no payload for this category.
    pub entities_without_payload: u64,
    /// Entities whose payload has an empty nested list.
    pub entities_without_units: u64,
    /// Units whose key was already produced by an earlier unit.
    pub duplicate_unit_keys: u64,
}

impl CategoryTally {
    pub fn record(&mut self, outcome: MatchOutcome) {
        self.units_seen += 1;
        match outcome {
            MatchOutcome::Matched => self.exact_matches += 1,
            MatchOutcome::Missing => self.missing += 1,
            MatchOutcome::Ambiguous => self.ambiguous += 1,
        }
    }
}

/// One of the three pairwise equalities behind `units == sink rows == matches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenEquality {
    UnitsVsSinkRows,
    UnitsVsMatches,
    SinkRowsVsMatches,
}

impl fmt::Display for BrokenEquality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitsVsSinkRows => write!(f, "units != sink rows"),
            Self::UnitsVsMatches => write!(f, "units != matches"),
            Self::SinkRowsVsMatches => write!(f, "sink rows != matches"),
        }
    }
}

/// Interpretation of a failed count check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrepancy {
    /// Sink holds fewer rows than the source produced units.
    SinkShort,
    /// Sink holds more rows than the source produced units.
    SinkSurplus,
    /// Cardinalities agree but some keys do not.
    KeyMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountVerdict {
    pub valid: bool,
    pub broken: Vec<BrokenEquality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<Discrepancy>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub table: String,
    pub tally: CategoryTally,
    pub verdict: CountVerdict,
    pub diagnostics: Vec<UnitDiagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Unordered multiset equality (symmetric difference must be empty).
    #[default]
    Multiset,
    /// Row-by-row comparison; only valid when both sides keep file order.
    Ordered,
}

/// Full-row comparison of one static file against its sink table.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionReport {
    pub dimension: String,
    pub table: String,
    pub mode: ComparisonMode,
    pub file_rows: u64,
    pub sink_rows: u64,
    pub identical: bool,
    /// Total rows on the file side without a counterpart in the sink.
    pub only_in_file: u64,
    /// Total rows on the sink side without a counterpart in the file.
    pub only_in_sink: u64,
    pub sample_only_in_file: Vec<Row>,
    pub sample_only_in_sink: Vec<Row>,
}

impl DimensionReport {
    /// File rows minus sink rows.
    pub fn row_delta(&self) -> i64 {
        self.file_rows as i64 - self.sink_rows as i64
    }
}

/// One line of a run report, in processing order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEntry {
    Category(CategoryReport),
    Dimension(DimensionReport),
    /// The entry could not be reconciled (decode, load or sink failure).
    Aborted { name: String, error: String },
}

impl ReportEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Category(c) => c.category.as_str(),
            Self::Dimension(d) => &d.dimension,
            Self::Aborted { name, .. } => name,
        }
    }

    /// True for a valid category or an identical dimension.
    pub fn passed(&self) -> bool {
        match self {
            Self::Category(c) => c.verdict.valid,
            Self::Dimension(d) => d.identical,
            Self::Aborted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_columns_match_arity() {
        for c in Category::ALL {
            assert_eq!(c.default_key_columns().len(), c.arity(), "{c}");
        }
    }

    #[test]
    fn field_value_equality_is_typed() {
        assert_ne!(FieldValue::Integer(1), FieldValue::Text("1".into()));
        assert_eq!(FieldValue::Real(0.5), FieldValue::Real(0.5));
        assert_ne!(FieldValue::Null, FieldValue::Text(String::new()));

        let set: HashSet<FieldValue> = [FieldValue::Real(1.0), FieldValue::Real(1.0)].into();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn outcome_from_row_count() {
        assert_eq!(MatchOutcome::from_row_count(0), MatchOutcome::Missing);
        assert_eq!(MatchOutcome::from_row_count(1), MatchOutcome::Matched);
        assert_eq!(MatchOutcome::from_row_count(4), MatchOutcome::Ambiguous);
    }

    #[test]
    fn tally_records_outcomes() {
        let mut t = CategoryTally::default();
        t.record(MatchOutcome::Matched);
        t.record(MatchOutcome::Missing);
        t.record(MatchOutcome::Ambiguous);
        assert_eq!(t.units_seen, 3);
        assert_eq!(t.exact_matches, 1);
        assert_eq!(t.missing, 1);
        assert_eq!(t.ambiguous, 1);
    }

    #[test]
    fn key_display() {
        let k = CompositeKey::new(vec!["T1".into(), "trip1".into()]);
        assert_eq!(k.to_string(), "(T1, trip1)");
    }
}
