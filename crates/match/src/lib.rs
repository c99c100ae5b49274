//! `mdm-match`: record matching engine for master-data demos.
//!
//! Pure engine crate: receives two pre-loaded record sets plus column match
//! specs, scores the full cross product, and returns the top candidates per
//! source record. No UI, storage, or data generation.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod ranker;
pub mod scorer;
pub mod similarity;
pub mod summary;
pub mod table;

pub use config::{ColumnMatchSpec, Compare, MatchConfig, WeightVector};
pub use engine::run;
pub use error::MatchError;
pub use model::{CandidatePair, MatchResult, RankedMatch, RecordSet, ScoreRow, Side, Value};
pub use ranker::rank;
pub use scorer::compute_scores;
pub use similarity::Method;
