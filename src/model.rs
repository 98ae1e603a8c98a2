use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Negativity strictly above this percentage marks a group as high-bias.
pub const HIGH_BIAS_THRESHOLD: i64 = 50;

/// The analysis service response exactly as received. Every field is kept as
/// an untyped JSON value so that a wrong type on one field can be defaulted
/// without rejecting the rest of the payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAnalysisPayload {
    pub filename: Option<Value>,
    pub upload_time: Option<Value>,
    pub total_words: Option<Value>,
    pub analysis_time: Option<Value>,
    pub overall_sentiment: Option<Value>,
    pub results: Option<Value>,
    pub error: Option<Value>,
}

impl RawAnalysisPayload {
    /// The upstream service reports rejected input as `{"error": "..."}`
    /// without any results.
    pub fn service_error(&self) -> Option<&str> {
        let message = self.error.as_ref()?.as_str()?;
        match self.results {
            Some(Value::Array(_)) => None,
            _ => Some(message),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBiasRecord {
    pub religion: Option<Value>,
    pub positivity: Option<Value>,
    pub neutral: Option<Value>,
    pub negativity: Option<Value>,
    pub total_mentions: Option<Value>,
    pub examples: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Case-insensitive match on the three labels; anything else is `None`.
    pub fn parse(label: &str) -> Option<Sentiment> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiasRecord {
    pub group: String,
    pub positivity: i64,
    pub neutrality: i64,
    pub negativity: i64,
    pub total_mentions: u64,
    pub examples: Vec<String>,
    pub high_bias: bool,
}

impl BiasRecord {
    pub fn new(
        group: impl Into<String>,
        positivity: i64,
        neutrality: i64,
        negativity: i64,
        total_mentions: u64,
        examples: Vec<String>,
    ) -> Self {
        Self {
            group: group.into(),
            positivity,
            neutrality,
            negativity,
            total_mentions: total_mentions.max(1),
            examples,
            high_bias: negativity > HIGH_BIAS_THRESHOLD,
        }
    }

    pub fn key_phrases(&self) -> &[String] {
        &self.examples[..self.examples.len().min(crate::view::KEY_PHRASE_LIMIT)]
    }
}

/// Canonical analysis result. Built once by the normalizer with `records`
/// already in descending-negativity order and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub filename: String,
    pub upload_time: String,
    pub total_words: u64,
    pub analysis_time_ms: u64,
    pub overall_sentiment: Sentiment,
    records: Vec<BiasRecord>,
}

impl AnalysisResult {
    /// Records are stably sorted by descending negativity here, so every
    /// constructed result satisfies the ordering invariant.
    pub fn new(
        filename: impl Into<String>,
        upload_time: impl Into<String>,
        total_words: u64,
        analysis_time_ms: u64,
        overall_sentiment: Sentiment,
        mut records: Vec<BiasRecord>,
    ) -> Self {
        records.sort_by(|a, b| b.negativity.cmp(&a.negativity));
        Self {
            filename: filename.into(),
            upload_time: upload_time.into(),
            total_words,
            analysis_time_ms,
            overall_sentiment,
            records,
        }
    }

    pub fn records(&self) -> &[BiasRecord] {
        &self.records
    }

    pub fn high_bias_records(&self) -> impl Iterator<Item = &BiasRecord> {
        self.records.iter().filter(|record| record.high_bias)
    }

    pub fn high_bias_count(&self) -> usize {
        self.high_bias_records().count()
    }
}
