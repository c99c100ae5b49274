use std::collections::BTreeSet;

use crate::config::WeightVector;
use crate::model::{MatchSummary, RankedMatch, ScoreRow};
use crate::ranker::overall_similarity;

/// Compute summary statistics for one run.
pub fn compute_summary(
    scores: &[ScoreRow],
    ranked: &[RankedMatch],
    weights: &WeightVector,
    threshold: f64,
    source_records: usize,
) -> MatchSummary {
    let above_threshold = scores
        .iter()
        .filter(|r| overall_similarity(&r.scores, weights) > threshold)
        .count();
    let matched: BTreeSet<usize> = ranked.iter().map(|m| m.index_a).collect();

    MatchSummary {
        candidate_pairs: scores.len(),
        above_threshold,
        emitted: ranked.len(),
        source_records_matched: matched.len(),
        source_records_unmatched: source_records.saturating_sub(matched.len()),
    }
}
