//! CSV adapters at the edges of a run: record sets in, ranked table out.

use std::io::Write;

use chrono::NaiveDate;

use crate::error::MatchError;
use crate::model::{MatchResult, RecordSet, Value};

/// Load a headed CSV document into a record set.
///
/// Cells are trimmed, then typed by inspection: blank → null, integer,
/// decimal float, `YYYY-MM-DD` date, else text. Digit strings with a leading
/// zero (zip codes, phone fragments) or too long for `i64` (account and card
/// numbers) stay text.
pub fn load_csv_records(csv_data: &str) -> Result<RecordSet, MatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut set = RecordSet::new(headers);

    for record in reader.records() {
        let record = record?;
        set.push_row(record.iter().map(infer_value).collect());
    }

    Ok(set)
}

fn infer_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    if !leading_zero {
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        let decimal = trimmed.contains('.')
            && trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-');
        if decimal {
            if let Ok(f) = trimmed.parse::<f64>() {
                return Value::Float(f);
            }
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Value::Date(d);
    }
    Value::Text(trimmed.to_string())
}

/// Write the ranked table: pair indices, per-column scores, overall score,
/// then the joined attributes.
pub fn write_matches_csv<W: Write>(result: &MatchResult, writer: W) -> Result<(), MatchError> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["index_a".to_string(), "index_b".to_string()];
    header.extend(result.labels.iter().cloned());
    header.push("overall_similarity".into());
    header.extend(result.columns.iter().cloned());
    out.write_record(&header)?;

    for m in &result.matches {
        let mut record = vec![m.index_a.to_string(), m.index_b.to_string()];
        record.extend(m.scores.iter().map(|s| s.to_string()));
        record.push(m.overall_similarity.to_string());
        record.extend(m.attributes.iter().map(|(_, v)| v.to_string()));
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}
