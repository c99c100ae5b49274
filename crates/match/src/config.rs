use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::similarity::Method;

pub const DEFAULT_THRESHOLD: f64 = 0.45;
pub const DEFAULT_TOP_N: usize = 3;

/// Allowed drift of a weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Column specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Exact,
    Fuzzy(Method),
}

/// One column pair to compare: `source_column` in A against `target_column` in B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatchSpec {
    pub source_column: String,
    pub target_column: String,
    pub compare: Compare,
}

impl ColumnMatchSpec {
    pub fn exact(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_column: source.into(),
            target_column: target.into(),
            compare: Compare::Exact,
        }
    }

    pub fn fuzzy(source: impl Into<String>, target: impl Into<String>, method: Method) -> Self {
        Self {
            source_column: source.into(),
            target_column: target.into(),
            compare: Compare::Fuzzy(method),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.compare == Compare::Exact
    }

    pub fn method(&self) -> Option<Method> {
        match self.compare {
            Compare::Exact => None,
            Compare::Fuzzy(m) => Some(m),
        }
    }

    /// Display label for this column's score.
    pub fn label(&self) -> String {
        let prefix = if self.is_exact() { "Exact_" } else { "" };
        format!(
            "{prefix}{}, {}_similarity",
            self.source_column, self.target_column
        )
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Non-negative weights, one per column spec, summing to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    pub fn new(weights: Vec<f64>) -> Result<Self, MatchError> {
        if weights.is_empty() {
            return Err(MatchError::InvalidWeights("no weights given".into()));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(MatchError::InvalidWeights(format!(
                "weight {} is {w}; weights must be finite and non-negative",
                i + 1
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::InvalidWeights(format!(
                "weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(Self(weights))
    }

    /// `n` equal shares. The last share absorbs rounding.
    pub fn equal(n: usize) -> Result<Self, MatchError> {
        if n == 0 {
            return Err(MatchError::InvalidWeights("no weights given".into()));
        }
        let share = 1.0 / n as f64;
        let mut weights = vec![share; n];
        weights[n - 1] = 1.0 - share * (n - 1) as f64;
        Self::new(weights)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Count check against the specs the scores came from.
    pub fn check_len(&self, specs: usize) -> Result<(), MatchError> {
        if self.0.len() != specs {
            return Err(MatchError::InvalidWeights(format!(
                "{} weight(s) for {specs} column spec(s)",
                self.0.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    pub source: String,
    pub target: String,
    #[serde(default = "default_exact")]
    pub exact: bool,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

fn default_name() -> String {
    "match".into()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_exact() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.columns.is_empty() {
            return Err(MatchError::Config("at least one column is required".into()));
        }
        if !self.threshold.is_finite() {
            return Err(MatchError::Config(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        self.specs()?;
        self.weights()?;
        Ok(())
    }

    /// Typed column specs. `method` is only read for fuzzy columns.
    pub fn specs(&self) -> Result<Vec<ColumnMatchSpec>, MatchError> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| -> Result<ColumnMatchSpec, MatchError> {
                if col.exact {
                    return Ok(ColumnMatchSpec::exact(&col.source, &col.target));
                }
                let name = col.method.as_deref().ok_or_else(|| {
                    MatchError::Config(format!(
                        "column {} ({} -> {}): method is required when exact = false",
                        i + 1,
                        col.source,
                        col.target
                    ))
                })?;
                Ok(ColumnMatchSpec::fuzzy(&col.source, &col.target, name.parse()?))
            })
            .collect()
    }

    /// Per-column weights, or equal shares when no column sets one.
    pub fn weights(&self) -> Result<WeightVector, MatchError> {
        let given: Vec<f64> = self.columns.iter().filter_map(|c| c.weight).collect();
        if given.is_empty() {
            return WeightVector::equal(self.columns.len());
        }
        if given.len() != self.columns.len() {
            return Err(MatchError::InvalidWeights(format!(
                "{} of {} columns set a weight; set all or none",
                given.len(),
                self.columns.len()
            )));
        }
        WeightVector::new(given)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Customers"
threshold = 0.5
top_n = 2

[[columns]]
source = "name"
target = "full_name"
exact = false
method = "jarowinkler"
weight = 0.6

[[columns]]
source = "dob"
target = "birth_date"
weight = 0.4
"#;

    #[test]
    fn parse_valid() {
        let config = MatchConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Customers");
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.top_n, 2);

        let specs = config.specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].method(), Some(Method::JaroWinkler));
        assert!(specs[1].is_exact());
        assert_eq!(config.weights().unwrap().as_slice(), &[0.6, 0.4]);
    }

    #[test]
    fn defaults_apply() {
        let config = MatchConfig::from_toml(
            r#"
[[columns]]
source = "a"
target = "b"

[[columns]]
source = "c"
target = "d"

[[columns]]
source = "e"
target = "f"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "match");
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        let w = config.weights().unwrap();
        assert_eq!(w.len(), 3);
        assert!((w.as_slice().iter().sum::<f64>() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn method_ignored_when_exact() {
        let config = MatchConfig::from_toml(
            r#"
[[columns]]
source = "a"
target = "b"
exact = true
method = "not_a_method"
"#,
        )
        .unwrap();
        assert!(config.specs().unwrap()[0].is_exact());
    }

    #[test]
    fn reject_unsupported_method() {
        let err = MatchConfig::from_toml(
            r#"
[[columns]]
source = "a"
target = "b"
exact = false
method = "soundex"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedMethod(ref m) if m == "soundex"));
    }

    #[test]
    fn reject_missing_method() {
        let err = MatchConfig::from_toml(
            r#"
[[columns]]
source = "a"
target = "b"
exact = false
"#,
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::Config(_)));
        assert!(err.to_string().contains("method is required"));
    }

    #[test]
    fn reject_partial_weights() {
        let err = MatchConfig::from_toml(
            r#"
[[columns]]
source = "a"
target = "b"
weight = 1.0

[[columns]]
source = "c"
target = "d"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::InvalidWeights(_)));
    }

    #[test]
    fn reject_no_columns() {
        let err = MatchConfig::from_toml("columns = []").unwrap_err();
        assert!(err.to_string().contains("at least one column"));
    }

    #[test]
    fn reject_malformed_toml() {
        let err = MatchConfig::from_toml("columns = [[").unwrap_err();
        assert!(matches!(err, MatchError::Config(_)));
    }

    #[test]
    fn weight_sum_must_be_one() {
        let err = WeightVector::new(vec![0.5, 0.4]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidWeights(_)));
        assert!(err.to_string().contains("0.9"));

        // Float summation drift is tolerated.
        assert!(WeightVector::new(vec![0.1; 10]).is_ok());
        assert!(WeightVector::new(vec![0.7, 0.2, 0.1]).is_ok());
    }

    #[test]
    fn weights_reject_negative_and_nan() {
        assert!(WeightVector::new(vec![1.5, -0.5]).is_err());
        assert!(WeightVector::new(vec![f64::NAN, 1.0]).is_err());
        assert!(WeightVector::new(vec![]).is_err());
    }

    #[test]
    fn equal_weights_sum_to_one() {
        for n in 1..=12 {
            let w = WeightVector::equal(n).unwrap();
            assert_eq!(w.len(), n);
        }
        assert!(WeightVector::equal(0).is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(
            ColumnMatchSpec::exact("name", "name").label(),
            "Exact_name, name_similarity"
        );
        assert_eq!(
            ColumnMatchSpec::fuzzy("addr", "address", Method::Qgram).label(),
            "addr, address_similarity"
        );
    }
}
