use std::cmp::Ordering;

use crate::config::WeightVector;
use crate::error::MatchError;
use crate::model::{RankedMatch, RecordSet, ScoreRow, Side};

/// Weighted sum of per-column scores, in spec order.
pub fn overall_similarity(scores: &[f64], weights: &WeightVector) -> f64 {
    scores
        .iter()
        .zip(weights.as_slice())
        .map(|(s, w)| s * w)
        .sum()
}

/// Attribute names of the joined output: A's columns then B's. Names present
/// in both sets get `_1` (A) and `_2` (B) suffixes.
pub fn joined_columns(set_a: &RecordSet, set_b: &RecordSet) -> Vec<String> {
    let (a, b) = suffixed_names(set_a, set_b);
    a.into_iter().chain(b).collect()
}

fn suffixed_names(set_a: &RecordSet, set_b: &RecordSet) -> (Vec<String>, Vec<String>) {
    let a = set_a
        .columns()
        .iter()
        .map(|c| match set_b.column_index(c) {
            Some(_) => format!("{c}_1"),
            None => c.clone(),
        })
        .collect();
    let b = set_b
        .columns()
        .iter()
        .map(|c| match set_a.column_index(c) {
            Some(_) => format!("{c}_2"),
            None => c.clone(),
        })
        .collect();
    (a, b)
}

/// Keep pairs scoring strictly above `threshold` and return the best `top_n`
/// per A record, joined with both records' attributes.
///
/// Output is grouped by ascending `index_a`, best-first within a group.
/// Equal scores within a group order by ascending `index_b`.
pub fn rank(
    scores: &[ScoreRow],
    set_a: &RecordSet,
    set_b: &RecordSet,
    weights: &WeightVector,
    threshold: f64,
    top_n: usize,
) -> Result<Vec<RankedMatch>, MatchError> {
    for row in scores {
        weights.check_len(row.scores.len())?;
        if row.pair.index_a >= set_a.len() {
            return Err(MatchError::schema(
                Side::Source,
                format!("pair index {} out of range ({} records)", row.pair.index_a, set_a.len()),
            ));
        }
        if row.pair.index_b >= set_b.len() {
            return Err(MatchError::schema(
                Side::Target,
                format!("pair index {} out of range ({} records)", row.pair.index_b, set_b.len()),
            ));
        }
    }

    let mut kept: Vec<(&ScoreRow, f64)> = scores
        .iter()
        .map(|row| (row, overall_similarity(&row.scores, weights)))
        .filter(|(_, overall)| *overall > threshold)
        .collect();

    log::debug!(
        "{} of {} candidate pairs above threshold {threshold}",
        kept.len(),
        scores.len()
    );

    kept.sort_by(|(x, xo), (y, yo)| {
        x.pair
            .index_a
            .cmp(&y.pair.index_a)
            .then_with(|| yo.partial_cmp(xo).unwrap_or(Ordering::Equal))
            .then_with(|| x.pair.index_b.cmp(&y.pair.index_b))
    });

    let (names_a, names_b) = suffixed_names(set_a, set_b);
    let mut ranked = Vec::new();
    let mut group: Option<usize> = None;
    let mut taken = 0;

    for (row, overall) in kept {
        let index_a = row.pair.index_a;
        if group != Some(index_a) {
            group = Some(index_a);
            taken = 0;
        }
        if taken >= top_n {
            continue;
        }
        taken += 1;

        let index_b = row.pair.index_b;
        let attributes = names_a
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), set_a.value(index_a, col).clone()))
            .chain(
                names_b
                    .iter()
                    .enumerate()
                    .map(|(col, name)| (name.clone(), set_b.value(index_b, col).clone())),
            )
            .collect();

        ranked.push(RankedMatch {
            index_a,
            index_b,
            scores: row.scores.clone(),
            overall_similarity: overall,
            attributes,
        });
    }

    Ok(ranked)
}
