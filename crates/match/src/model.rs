use std::borrow::Cow;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single cell. `Null` covers absent cells and blank CSV fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

static NULL: Value = Value::Null;

/// 2^63, the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Lossless integer/float equality: the float must be integral, in `i64`
/// range, and convert back to the same integer.
fn integer_eq_float(i: i64, f: f64) -> bool {
    f.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&f) && f as i64 == i
}

impl Value {
    /// NaN floats count as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Equality used by exact comparison. Integers and floats compare
    /// numerically; values of different kinds are never equal.
    pub fn exact_eq(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                integer_eq_float(*a, *b)
            }
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Canonical string form fed to fuzzy methods. `None` for missing values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        if self.is_null() {
            return None;
        }
        match self {
            Self::Null => None,
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
            Self::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_text() {
            Some(s) => write!(f, "{s}"),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

// ---------------------------------------------------------------------------
// Record sets
// ---------------------------------------------------------------------------

/// Which of the two record sets an error or column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    /// Set A, whose records are ranked against.
    Source,
    /// Set B, the candidate pool.
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "A"),
            Self::Target => write!(f, "B"),
        }
    }
}

/// Ordered rows over a fixed column schema. A row's position is its
/// identity for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Cells past the end of a short row read as null.
    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn with_row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_row(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column); null when either is out of range.
    pub fn value(&self, row: usize, column: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Named cell lookup, mainly for callers inspecting results.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?;
        Some(self.value(row, col))
    }

    /// Check the invariants a matching run relies on.
    pub fn validate(&self, side: Side) -> Result<(), MatchError> {
        if self.rows.is_empty() {
            return Err(MatchError::schema(side, "record set is empty"));
        }
        for (i, name) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(name) {
                return Err(MatchError::schema(
                    side,
                    format!("duplicate column '{name}'"),
                ));
            }
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() > self.columns.len())
        {
            return Err(MatchError::schema(
                side,
                format!(
                    "row {i} has {} values but the schema has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// One record from A paired with one record from B, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidatePair {
    pub index_a: usize,
    pub index_b: usize,
}

/// Per-column similarities for a candidate pair, in spec order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub pair: CandidatePair,
    pub scores: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// A retained candidate joined with both records' attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub index_a: usize,
    pub index_b: usize,
    pub scores: Vec<f64>,
    pub overall_similarity: f64,
    /// A's columns then B's, colliding names suffixed `_1` / `_2`.
    #[serde(serialize_with = "serialize_attributes")]
    pub attributes: Vec<(String, Value)>,
}

impl RankedMatch {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

fn serialize_attributes<S: Serializer>(
    attributes: &[(String, Value)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(attributes.len()))?;
    for (name, value) in attributes {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub candidate_pairs: usize,
    pub above_threshold: usize,
    pub emitted: usize,
    pub source_records_matched: usize,
    pub source_records_unmatched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub threshold: f64,
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub meta: MatchMeta,
    /// Display label per column spec, in spec order.
    pub labels: Vec<String>,
    /// Joined attribute column names, in the order of `RankedMatch::attributes`.
    pub columns: Vec<String>,
    pub summary: MatchSummary,
    pub matches: Vec<RankedMatch>,
}

impl MatchResult {
    pub fn to_json(&self) -> Result<String, MatchError> {
        serde_json::to_string_pretty(self).map_err(|e| MatchError::Io(e.to_string()))
    }
}
