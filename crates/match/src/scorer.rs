use crate::config::{ColumnMatchSpec, Compare};
use crate::error::MatchError;
use crate::model::{CandidatePair, RecordSet, ScoreRow, Side, Value};

/// Column positions for one spec, resolved once per run.
struct ResolvedSpec {
    source: usize,
    target: usize,
    compare: Compare,
}

/// Score every (A, B) pair on every spec.
///
/// The candidate space is the full cross product, emitted row-major
/// (A outer, B inner). Missing or null cells score 0.0.
pub fn compute_scores(
    set_a: &RecordSet,
    set_b: &RecordSet,
    specs: &[ColumnMatchSpec],
) -> Result<Vec<ScoreRow>, MatchError> {
    let resolved = resolve_specs(set_a, set_b, specs)?;

    log::debug!(
        "scoring {} x {} candidate pairs on {} column(s)",
        set_a.len(),
        set_b.len(),
        resolved.len()
    );

    let mut rows = Vec::with_capacity(set_a.len() * set_b.len());
    for index_a in 0..set_a.len() {
        for index_b in 0..set_b.len() {
            let scores = resolved
                .iter()
                .map(|spec| {
                    score_values(
                        spec.compare,
                        set_a.value(index_a, spec.source),
                        set_b.value(index_b, spec.target),
                    )
                })
                .collect();
            rows.push(ScoreRow {
                pair: CandidatePair { index_a, index_b },
                scores,
            });
        }
    }
    Ok(rows)
}

/// Similarity of two cells under one comparison.
pub fn score_values(compare: Compare, a: &Value, b: &Value) -> f64 {
    match compare {
        Compare::Exact => {
            if a.exact_eq(b) {
                1.0
            } else {
                0.0
            }
        }
        Compare::Fuzzy(method) => match (a.as_text(), b.as_text()) {
            (Some(a), Some(b)) => method.similarity(&a, &b),
            _ => 0.0,
        },
    }
}

fn resolve_specs(
    set_a: &RecordSet,
    set_b: &RecordSet,
    specs: &[ColumnMatchSpec],
) -> Result<Vec<ResolvedSpec>, MatchError> {
    set_a.validate(Side::Source)?;
    set_b.validate(Side::Target)?;
    if specs.is_empty() {
        return Err(MatchError::schema(Side::Source, "no column specs to score"));
    }

    specs
        .iter()
        .map(|spec| -> Result<ResolvedSpec, MatchError> {
            let source = set_a.column_index(&spec.source_column).ok_or_else(|| {
                MatchError::schema(
                    Side::Source,
                    format!("missing column '{}'", spec.source_column),
                )
            })?;
            let target = set_b.column_index(&spec.target_column).ok_or_else(|| {
                MatchError::schema(
                    Side::Target,
                    format!("missing column '{}'", spec.target_column),
                )
            })?;
            Ok(ResolvedSpec {
                source,
                target,
                compare: spec.compare,
            })
        })
        .collect()
}
