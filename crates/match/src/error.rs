use thiserror::Error;

use crate::model::Side;

#[derive(Debug, Error)]
pub enum MatchError {
    /// A record set does not have the shape the run needs (missing column,
    /// empty set, duplicate header, out-of-range pair index).
    #[error("schema mismatch in record set {side}: {detail}")]
    SchemaMismatch { side: Side, detail: String },
    /// Weight count mismatch, negative/non-finite weight, or sum != 1.0.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
    /// Fuzzy method name outside the supported set.
    #[error("unsupported method: '{0}'")]
    UnsupportedMethod(String),
    /// TOML parse error or invalid config field.
    #[error("config error: {0}")]
    Config(String),
    /// CSV read/write error.
    #[error("IO error: {0}")]
    Io(String),
}

impl MatchError {
    pub(crate) fn schema(side: Side, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            side,
            detail: detail.into(),
        }
    }
}

impl From<csv::Error> for MatchError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<std::io::Error> for MatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
