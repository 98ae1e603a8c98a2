use crate::model::AnalysisResult;
use crate::normalize::Normalized;
use crate::view::{Notice, ResultsScreen, ResultsView};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Empty,
    Failed(Option<String>),
    Ready(Arc<AnalysisResult>),
}

/// The result currently on display. Each delivery replaces the whole state;
/// a result is never edited after it is shown.
#[derive(Debug, Clone, Default)]
pub struct ResultsSession {
    state: SessionState,
}

impl ResultsSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Shared handle to the displayed result, if any. Holders keep seeing the
    /// result they took even after the session moves on.
    pub fn current(&self) -> Option<Arc<AnalysisResult>> {
        match &self.state {
            SessionState::Ready(result) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    pub fn show(&mut self, normalized: Normalized) {
        self.state = match normalized {
            Normalized::NoResult => SessionState::Empty,
            Normalized::ServiceError(message) => SessionState::Failed(Some(message)),
            Normalized::Ready(result) => SessionState::Ready(Arc::new(result)),
        };
    }

    /// Replaces the displayed result with a generic failure notice.
    pub fn show_failure(&mut self) {
        self.state = SessionState::Failed(None);
    }

    pub fn screen(&self) -> ResultsScreen<'_> {
        match &self.state {
            SessionState::Empty => ResultsScreen::NoResult(Notice::no_result()),
            SessionState::Failed(message) => ResultsScreen::Failed(Notice::failed(message.as_deref())),
            SessionState::Ready(result) => ResultsScreen::Ready(ResultsView::new(result)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BiasRecord, Sentiment};
    use crate::view::{FAILED_MESSAGE, NO_RESULT_MESSAGE};

    fn result(name: &str) -> AnalysisResult {
        AnalysisResult::new(
            name,
            "",
            10,
            0,
            Sentiment::Neutral,
            vec![BiasRecord::new("A", 0, 0, 70, 1, Vec::new())],
        )
    }

    #[test]
    fn new_session_shows_no_result() {
        let session = ResultsSession::new();
        match session.screen() {
            ResultsScreen::NoResult(notice) => assert_eq!(notice.message, NO_RESULT_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
        assert!(session.current().is_none());
    }

    #[test]
    fn new_delivery_replaces_previous_result_wholesale() {
        let mut session = ResultsSession::new();
        session.show(Normalized::Ready(result("first.txt")));
        let held = session.current().expect("first result");

        session.show(Normalized::Ready(result("second.txt")));
        assert_eq!(held.filename, "first.txt");
        assert_eq!(session.current().expect("second").filename, "second.txt");

        session.show(Normalized::NoResult);
        assert!(session.current().is_none());
        assert_eq!(held.filename, "first.txt");
    }

    #[test]
    fn failures_render_readable_notices() {
        let mut session = ResultsSession::new();
        session.show(Normalized::Ready(result("a.txt")));
        session.show_failure();
        match session.screen() {
            ResultsScreen::Failed(notice) => assert_eq!(notice.message, FAILED_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
        assert!(session.current().is_none());

        session.show(Normalized::ServiceError("Unsupported file type".to_string()));
        assert_eq!(
            session.state(),
            &SessionState::Failed(Some("Unsupported file type".to_string()))
        );
    }

    #[test]
    fn ready_screen_projects_the_current_result() {
        let mut session = ResultsSession::new();
        session.show(Normalized::Ready(result("a.txt")));
        match session.screen() {
            ResultsScreen::Ready(view) => {
                assert_eq!(view.result.filename, "a.txt");
                assert_eq!(view.banner.map(|b| b.count), Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
