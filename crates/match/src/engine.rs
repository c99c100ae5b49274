use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::model::{MatchMeta, MatchResult, RecordSet};
use crate::ranker::{joined_columns, rank};
use crate::scorer::compute_scores;
use crate::summary::compute_summary;

/// Candidate spaces above this size get a warning; the run still proceeds.
pub const LARGE_RUN_PAIRS: usize = 10_000_000;

/// Run one match per config. All validation happens before any scoring.
pub fn run(
    config: &MatchConfig,
    set_a: &RecordSet,
    set_b: &RecordSet,
) -> Result<MatchResult, MatchError> {
    config.validate()?;
    let specs = config.specs()?;
    let weights = config.weights()?;
    weights.check_len(specs.len())?;

    let pairs = set_a.len().saturating_mul(set_b.len());
    log::info!(
        "match '{}': {} x {} records, {} column(s)",
        config.name,
        set_a.len(),
        set_b.len(),
        specs.len()
    );
    if pairs > LARGE_RUN_PAIRS {
        log::warn!(
            "match '{}': {pairs} candidate pairs; the full cross product is scored",
            config.name
        );
    }

    let scores = compute_scores(set_a, set_b, &specs)?;
    let matches = rank(
        &scores,
        set_a,
        set_b,
        &weights,
        config.threshold,
        config.top_n,
    )?;
    let summary = compute_summary(&scores, &matches, &weights, config.threshold, set_a.len());

    log::info!(
        "match '{}': {} of {} pairs above {}, {} emitted",
        config.name,
        summary.above_threshold,
        summary.candidate_pairs,
        config.threshold,
        summary.emitted
    );

    Ok(MatchResult {
        meta: MatchMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            threshold: config.threshold,
            top_n: config.top_n,
        },
        labels: specs.iter().map(|s| s.label()).collect(),
        columns: joined_columns(set_a, set_b),
        summary,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn config(toml: &str) -> MatchConfig {
        MatchConfig::from_toml(toml).unwrap()
    }

    fn sets() -> (RecordSet, RecordSet) {
        let a = RecordSet::new(["name", "zip"])
            .with_row(["Jon Smith", "10001"])
            .with_row(["Ann Lee", "94110"]);
        let b = RecordSet::new(["name", "postcode"])
            .with_row(["Jon Smith", "10001"])
            .with_row(["Jan Smith", "10001"])
            .with_row(["Anne Lee", "94110"]);
        (a, b)
    }

    #[test]
    fn run_produces_report() {
        let cfg = config(
            r#"
name = "demo"
top_n = 1

[[columns]]
source = "name"
target = "name"
exact = false
method = "jaro_winkler"
weight = 0.5

[[columns]]
source = "zip"
target = "postcode"
weight = 0.5
"#,
        );
        let (a, b) = sets();
        let result = run(&cfg, &a, &b).unwrap();

        assert_eq!(result.meta.config_name, "demo");
        assert_eq!(
            result.labels,
            vec!["name, name_similarity", "Exact_zip, postcode_similarity"]
        );
        assert_eq!(result.columns, vec!["name_1", "zip", "name_2", "postcode"]);
        assert_eq!(result.summary.candidate_pairs, 6);
        assert_eq!(result.summary.source_records_matched, 2);
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].index_b, 0);
        assert_eq!(result.matches[1].index_b, 2);
        assert_eq!(
            result.matches[1].attribute("name_2"),
            Some(&Value::from("Anne Lee"))
        );
    }

    #[test]
    fn schema_errors_surface() {
        let cfg = config(
            r#"
[[columns]]
source = "name"
target = "surname"
"#,
        );
        let (a, b) = sets();
        let err = run(&cfg, &a, &b).unwrap_err();
        assert!(err.to_string().contains("missing column 'surname'"));
    }

    #[test]
    fn report_serializes() {
        let cfg = config(
            r#"
threshold = 0.0

[[columns]]
source = "name"
target = "name"
exact = false
method = "levenshtein"
"#,
        );
        let (a, b) = sets();
        let json = run(&cfg, &a, &b).unwrap().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["meta"]["top_n"], 3);
        assert_eq!(v["matches"][0]["attributes"]["name_1"], "Jon Smith");
        assert_eq!(v["matches"][0]["overall_similarity"], 1.0);
    }
}
