use crate::model::{AnalysisResult, BiasRecord, HIGH_BIAS_THRESHOLD};

/// Examples shown per group, both on screen and in the exported table.
pub const KEY_PHRASE_LIMIT: usize = 3;

pub const NO_RESULT_TITLE: &str = "No Results Found";
pub const NO_RESULT_MESSAGE: &str = "Unable to load analysis results";
pub const FAILED_TITLE: &str = "Analysis Unavailable";
pub const FAILED_MESSAGE: &str = "The analysis results could not be read. Please try again.";
pub const RETRY_LABEL: &str = "Try Again";

/// Readable fallback shown instead of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
    pub action: &'static str,
}

impl Notice {
    pub fn no_result() -> Self {
        Self {
            title: NO_RESULT_TITLE,
            message: NO_RESULT_MESSAGE.to_string(),
            action: RETRY_LABEL,
        }
    }

    pub fn failed(message: Option<&str>) -> Self {
        Self {
            title: FAILED_TITLE,
            message: message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or(FAILED_MESSAGE)
                .to_string(),
            action: RETRY_LABEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighBiasBanner {
    pub count: usize,
}

impl HighBiasBanner {
    pub fn text(&self) -> String {
        format!(
            "High bias detected: {} group(s) show negativity above {}% threshold.",
            self.count, HIGH_BIAS_THRESHOLD
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCard<'a> {
    pub record: &'a BiasRecord,
    pub key_phrases: &'a [String],
}

impl GroupCard<'_> {
    pub fn mentions_label(&self) -> String {
        format!("{} mentions found", self.record.total_mentions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewBar<'a> {
    pub group: &'a str,
    pub negativity: i64,
    pub highlighted: bool,
}

/// Presentation-ready projection of one result. Borrows the canonical model
/// and never reorders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView<'a> {
    pub result: &'a AnalysisResult,
    pub high_bias_records: Vec<&'a BiasRecord>,
    pub banner: Option<HighBiasBanner>,
    pub cards: Vec<GroupCard<'a>>,
    pub overview: Vec<OverviewBar<'a>>,
}

impl<'a> ResultsView<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        let high_bias_records: Vec<&BiasRecord> = result.high_bias_records().collect();
        let banner = (!high_bias_records.is_empty()).then(|| HighBiasBanner {
            count: high_bias_records.len(),
        });
        let cards = result
            .records()
            .iter()
            .map(|record| GroupCard {
                record,
                key_phrases: record.key_phrases(),
            })
            .collect();
        let overview = result
            .records()
            .iter()
            .map(|record| OverviewBar {
                group: &record.group,
                negativity: record.negativity,
                highlighted: record.high_bias,
            })
            .collect();
        Self {
            result,
            high_bias_records,
            banner,
            cards,
            overview,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsScreen<'a> {
    NoResult(Notice),
    Failed(Notice),
    Ready(ResultsView<'a>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;

    fn sample() -> AnalysisResult {
        let examples: Vec<String> = (1..=5).map(|i| format!("example {i}")).collect();
        AnalysisResult::new(
            "notes.txt",
            "2024-05-01T10:00:00Z",
            1200,
            350,
            Sentiment::Negative,
            vec![
                BiasRecord::new("A", 40, 30, 30, 4, Vec::new()),
                BiasRecord::new("B", 10, 10, 80, 9, examples),
                BiasRecord::new("C", 10, 39, 51, 1, vec!["only".to_string()]),
                BiasRecord::new("D", 25, 25, 50, 2, Vec::new()),
            ],
        )
    }

    #[test]
    fn high_bias_subset_keeps_canonical_order() {
        let result = sample();
        let view = ResultsView::new(&result);
        let high: Vec<&str> = view.high_bias_records.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(high, vec!["B", "C"]);
        assert_eq!(view.banner, Some(HighBiasBanner { count: 2 }));
        assert_eq!(
            view.banner.map(|banner| banner.text()).as_deref(),
            Some("High bias detected: 2 group(s) show negativity above 50% threshold.")
        );
    }

    #[test]
    fn banner_hidden_without_high_bias_groups() {
        let result = AnalysisResult::new(
            "a",
            "",
            0,
            0,
            Sentiment::Neutral,
            vec![BiasRecord::new("A", 0, 50, 50, 1, Vec::new())],
        );
        assert_eq!(ResultsView::new(&result).banner, None);
    }

    #[test]
    fn cards_show_three_key_phrases_but_model_keeps_all() {
        let result = sample();
        let view = ResultsView::new(&result);
        let card = &view.cards[0];
        assert_eq!(card.record.group, "B");
        assert_eq!(card.key_phrases, &["example 1", "example 2", "example 3"]);
        assert_eq!(card.record.examples.len(), 5);
        assert_eq!(card.mentions_label(), "9 mentions found");
        assert_eq!(view.cards[1].key_phrases, &["only"]);
    }

    #[test]
    fn overview_has_one_bar_per_record() {
        let result = sample();
        let bars = ResultsView::new(&result).overview;
        let summary: Vec<(&str, i64, bool)> = bars
            .iter()
            .map(|bar| (bar.group, bar.negativity, bar.highlighted))
            .collect();
        assert_eq!(
            summary,
            vec![("B", 80, true), ("C", 51, true), ("D", 50, false), ("A", 30, false)]
        );
    }

    #[test]
    fn failed_notice_falls_back_to_generic_text() {
        assert_eq!(Notice::failed(None).message, FAILED_MESSAGE);
        assert_eq!(Notice::failed(Some("  ")).message, FAILED_MESSAGE);
        assert_eq!(Notice::failed(Some("Unsupported file type")).message, "Unsupported file type");
        assert_eq!(Notice::no_result().title, NO_RESULT_TITLE);
    }
}
