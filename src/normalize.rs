use crate::error::ReportError;
use crate::model::{AnalysisResult, BiasRecord, RawAnalysisPayload, RawBiasRecord, Sentiment};
use serde_json::Value;

pub const DEFAULT_FILENAME_HINT: &str = "Unknown File";
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Outcome of normalizing one payload delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Nothing was supplied; the "no result" state.
    NoResult,
    /// The service answered with an error message instead of results.
    ServiceError(String),
    Ready(AnalysisResult),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NormalizeStats {
    pub defaulted_fields: usize,
    pub skipped_records: usize,
}

/// Parses payload text into the untrusted payload shape. Only text that is
/// not a JSON object at all is an error; field contents are not checked here.
pub fn parse_payload(text: &str) -> Result<RawAnalysisPayload, ReportError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ReportError::PayloadParse(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// Total mapping from the untrusted payload to the canonical result. Missing
/// or wrong-typed fields fall back to their defaults and never fail.
pub fn normalize_payload(raw: &RawAnalysisPayload, filename_hint: &str) -> AnalysisResult {
    normalize_payload_with_stats(raw, filename_hint).0
}

/// Full pipeline for one delivery. `None` and blank text both mean no
/// payload was supplied.
pub fn normalize(payload: Option<&str>, filename_hint: &str) -> Result<Normalized, ReportError> {
    Ok(normalize_with_stats(payload, filename_hint)?.0)
}

pub(crate) fn normalize_with_stats(
    payload: Option<&str>,
    filename_hint: &str,
) -> Result<(Normalized, NormalizeStats), ReportError> {
    let Some(text) = payload.filter(|text| !text.trim().is_empty()) else {
        return Ok((Normalized::NoResult, NormalizeStats::default()));
    };
    let raw = parse_payload(text)?;
    if let Some(message) = raw.service_error() {
        return Ok((
            Normalized::ServiceError(message.to_string()),
            NormalizeStats::default(),
        ));
    }
    let (result, stats) = normalize_payload_with_stats(&raw, filename_hint);
    Ok((Normalized::Ready(result), stats))
}

pub(crate) fn normalize_payload_with_stats(
    raw: &RawAnalysisPayload,
    filename_hint: &str,
) -> (AnalysisResult, NormalizeStats) {
    let mut stats = NormalizeStats::default();

    let filename = non_empty_string(raw.filename.as_ref())
        .unwrap_or_else(|| {
            stats.defaulted_fields += 1;
            filename_hint.to_string()
        });
    let upload_time = match raw.upload_time.as_ref() {
        Some(Value::String(value)) => value.clone(),
        _ => {
            stats.defaulted_fields += 1;
            String::new()
        }
    };
    let total_words = count_or_default(raw.total_words.as_ref(), &mut stats);
    let analysis_time_ms = match number(raw.analysis_time.as_ref()) {
        Some(seconds) => round_half_up(seconds * 1000.0).max(0) as u64,
        None => {
            stats.defaulted_fields += 1;
            0
        }
    };
    let overall_sentiment = match raw.overall_sentiment.as_ref().and_then(Value::as_str) {
        Some(label) => Sentiment::parse(label).unwrap_or_else(|| {
            stats.defaulted_fields += 1;
            Sentiment::Neutral
        }),
        None => {
            stats.defaulted_fields += 1;
            Sentiment::Neutral
        }
    };

    let mut records = Vec::new();
    match raw.results.as_ref() {
        Some(Value::Array(entries)) => {
            for entry in entries {
                if !entry.is_object() {
                    stats.skipped_records += 1;
                    continue;
                }
                match serde_json::from_value::<RawBiasRecord>(entry.clone()) {
                    Ok(raw_record) => records.push(normalize_record(&raw_record, &mut stats)),
                    Err(_) => stats.skipped_records += 1,
                }
            }
        }
        _ => stats.defaulted_fields += 1,
    }

    let result = AnalysisResult::new(
        filename,
        upload_time,
        total_words,
        analysis_time_ms,
        overall_sentiment,
        records,
    );
    (result, stats)
}

fn normalize_record(raw: &RawBiasRecord, stats: &mut NormalizeStats) -> BiasRecord {
    let group = match raw.religion.as_ref().and_then(Value::as_str) {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => {
            stats.defaulted_fields += 1;
            UNKNOWN_GROUP.to_string()
        }
    };
    let positivity = percentage(raw.positivity.as_ref(), stats);
    let neutrality = percentage(raw.neutral.as_ref(), stats);
    let negativity = percentage(raw.negativity.as_ref(), stats);
    let total_mentions = match number(raw.total_mentions.as_ref()).map(round_half_up) {
        Some(count) if count >= 1 => count as u64,
        _ => {
            stats.defaulted_fields += 1;
            1
        }
    };
    let examples = match raw.examples.as_ref() {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => {
            stats.defaulted_fields += 1;
            Vec::new()
        }
    };
    BiasRecord::new(
        group,
        positivity,
        neutrality,
        negativity,
        total_mentions,
        examples,
    )
}

/// Rounded to the nearest integer; values outside 0..=100 pass through.
fn percentage(value: Option<&Value>, stats: &mut NormalizeStats) -> i64 {
    match number(value) {
        Some(value) => round_half_up(value),
        None => {
            stats.defaulted_fields += 1;
            0
        }
    }
}

fn count_or_default(value: Option<&Value>, stats: &mut NormalizeStats) -> u64 {
    match number(value) {
        Some(value) => round_half_up(value).max(0) as u64,
        None => {
            stats.defaulted_fields += 1;
            0
        }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    value?.as_f64().filter(|value| value.is_finite())
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Halves round towards positive infinity: 2.5 -> 3, -2.5 -> -2.
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(payload: &str) -> AnalysisResult {
        match normalize(Some(payload), DEFAULT_FILENAME_HINT).expect("normalize") {
            Normalized::Ready(result) => result,
            other => panic!("expected a result, got {other:?}"),
        }
    }

    fn groups(result: &AnalysisResult) -> Vec<&str> {
        result.records().iter().map(|r| r.group.as_str()).collect()
    }

    #[test]
    fn absence_is_no_result_not_an_error() {
        assert_eq!(normalize(None, "x").expect("ok"), Normalized::NoResult);
        assert_eq!(normalize(Some("   \n"), "x").expect("ok"), Normalized::NoResult);
    }

    #[test]
    fn unparsable_payload_is_a_parse_error() {
        for payload in ["{not json", "[1, 2]", "null", "\"text\""] {
            let err = normalize(Some(payload), "x").expect_err("must fail");
            assert!(matches!(err, ReportError::PayloadParse(_)), "{payload}");
        }
    }

    #[test]
    fn records_sort_by_descending_negativity_with_stable_ties() {
        let result = ready(
            r#"{"results": [
                {"religion": "A", "negativity": 30},
                {"religion": "B", "negativity": 80},
                {"religion": "C", "negativity": 80}
            ]}"#,
        );
        assert_eq!(groups(&result), vec!["B", "C", "A"]);
        let high: Vec<&str> = result.high_bias_records().map(|r| r.group.as_str()).collect();
        assert_eq!(high, vec!["B", "C"]);
    }

    #[test]
    fn empty_object_takes_every_default() {
        let result = ready("{}");
        assert_eq!(result.filename, DEFAULT_FILENAME_HINT);
        assert_eq!(result.upload_time, "");
        assert_eq!(result.total_words, 0);
        assert_eq!(result.analysis_time_ms, 0);
        assert_eq!(result.overall_sentiment, Sentiment::Neutral);
        assert!(result.records().is_empty());
    }

    #[test]
    fn wrong_typed_fields_are_defaulted_individually() {
        let result = ready(
            r#"{
                "filename": 42,
                "uploadTime": "2024-05-01T10:00:00Z",
                "totalWords": "many",
                "overallSentiment": "ecstatic",
                "results": [{"religion": "A", "negativity": "high", "positivity": 62.5,
                             "totalMentions": "x", "examples": "not a list"}]
            }"#,
        );
        assert_eq!(result.filename, DEFAULT_FILENAME_HINT);
        assert_eq!(result.upload_time, "2024-05-01T10:00:00Z");
        assert_eq!(result.total_words, 0);
        assert_eq!(result.overall_sentiment, Sentiment::Neutral);
        let record = &result.records()[0];
        assert_eq!(record.negativity, 0);
        assert_eq!(record.positivity, 63);
        assert_eq!(record.total_mentions, 1);
        assert!(record.examples.is_empty());
    }

    #[test]
    fn empty_filename_uses_the_caller_hint() {
        let result = match normalize(Some(r#"{"filename": ""}"#), "upload.txt").expect("ok") {
            Normalized::Ready(result) => result,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(result.filename, "upload.txt");
    }

    #[test]
    fn percentages_round_half_up_and_are_not_clamped() {
        let result = ready(
            r#"{"results": [{"religion": "A", "positivity": 2.5, "neutral": -2.5, "negativity": 140.4}]}"#,
        );
        let record = &result.records()[0];
        assert_eq!(record.positivity, 3);
        assert_eq!(record.neutrality, -2);
        assert_eq!(record.negativity, 140);
        assert!(record.high_bias);
    }

    #[test]
    fn analysis_time_seconds_become_milliseconds() {
        assert_eq!(ready(r#"{"analysisTime": 1.2346}"#).analysis_time_ms, 1235);
        assert_eq!(ready(r#"{"analysisTime": -4}"#).analysis_time_ms, 0);
    }

    #[test]
    fn missing_total_mentions_defaults_to_one() {
        let result = ready(
            r#"{"results": [{"religion": "A"}, {"religion": "B", "totalMentions": 0},
                            {"religion": "C", "totalMentions": 7}]}"#,
        );
        let mentions: Vec<u64> = result.records().iter().map(|r| r.total_mentions).collect();
        assert_eq!(mentions, vec![1, 1, 7]);
    }

    #[test]
    fn examples_keep_only_strings_in_order() {
        let result = ready(
            r#"{"results": [{"religion": "A", "examples": ["one", 2, "three", null, "four"]}]}"#,
        );
        assert_eq!(result.records()[0].examples, vec!["one", "three", "four"]);
    }

    #[test]
    fn blank_or_missing_group_label_becomes_unknown() {
        let result = ready(r#"{"results": [{"negativity": 10}, {"religion": "  "}]}"#);
        assert_eq!(groups(&result), vec![UNKNOWN_GROUP, UNKNOWN_GROUP]);
    }

    #[test]
    fn non_object_result_entries_are_skipped() {
        let (normalized, stats) = normalize_with_stats(
            Some(r#"{"results": [null, 3, {"religion": "A"}]}"#),
            "x",
        )
        .expect("ok");
        match normalized {
            Normalized::Ready(result) => assert_eq!(groups(&result), vec!["A"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stats.skipped_records, 2);
    }

    #[test]
    fn service_error_payload_is_reported_separately() {
        assert_eq!(
            normalize(Some(r#"{"error": "Unsupported file type"}"#), "x").expect("ok"),
            Normalized::ServiceError("Unsupported file type".to_string())
        );
    }

    #[test]
    fn extra_fields_are_ignored() {
        let result = ready(
            r#"{"filename": "a.txt", "predictedReligion": "X", "religionsDetected": 3,
                "results": [{"religion": "A", "probabilities": {"x": 0.1}}]}"#,
        );
        assert_eq!(result.filename, "a.txt");
        assert_eq!(groups(&result), vec!["A"]);
    }

    #[test]
    fn overall_sentiment_absent_is_neutral() {
        assert_eq!(ready(r#"{"filename": "a"}"#).overall_sentiment, Sentiment::Neutral);
        assert_eq!(
            ready(r#"{"overallSentiment": "negative"}"#).overall_sentiment,
            Sentiment::Negative
        );
    }
}
