use crate::canvas::{Canvas, Document};
use crate::debug::DebugLogger;
use crate::error::ReportError;
use crate::flowable::{Flowable, TABLE_ROWS_META_KEY};
use crate::frame::AddResult;
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::PageTemplate;
use serde_json::json;
use std::collections::VecDeque;
use std::time::Instant;

pub struct DocTemplate {
    page_templates: Vec<PageTemplate>,
    story: Vec<Box<dyn Flowable>>,
    debug: Option<DebugLogger>,
}

impl DocTemplate {
    pub fn new(page_templates: Vec<PageTemplate>) -> Self {
        Self {
            page_templates,
            story: Vec::new(),
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Option<DebugLogger>) -> Self {
        self.debug = debug;
        self
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    pub fn build(self) -> Result<Document, ReportError> {
        Ok(self.build_with_metrics()?.0)
    }

    pub fn build_with_metrics(self) -> Result<(Document, DocumentMetrics), ReportError> {
        if self.page_templates.is_empty() {
            return Err(ReportError::InvalidConfiguration(
                "no page template configured".to_string(),
            ));
        }
        if let Some(template) = self.page_templates.iter().find(|t| t.frames().is_empty()) {
            return Err(ReportError::InvalidConfiguration(format!(
                "page template '{}' has no frames",
                template.name
            )));
        }

        let debug = self.debug.clone();
        let log_page_break = |from_page: usize, reason: &str, flowable_name: &str| {
            let Some(logger) = debug.as_ref() else {
                return;
            };
            logger.log_event(json!({
                "type": "layout.page_break",
                "reason": reason,
                "from_page": from_page,
                "to_page": from_page + 1,
                "flowable": flowable_name,
            }));
            logger.increment("layout.page_break", 1);
        };

        // Page n uses templates[n - 1]; the last template repeats.
        fn select_template(page_templates: &[PageTemplate], page_number: usize) -> &PageTemplate {
            let idx = page_number
                .saturating_sub(1)
                .min(page_templates.len() - 1);
            &page_templates[idx]
        }

        let started = Instant::now();
        let template = select_template(&self.page_templates, 1);
        let mut canvas = Canvas::new(template.page_size);
        let mut page_number = 1usize;
        let mut frames = template.instantiate_frames();
        let mut frame_index = 0usize;
        let mut placed_on_page = false;
        let mut page_blocks = 0usize;
        let mut metrics = DocumentMetrics::default();

        let finish_page = |canvas: &mut Canvas,
                           page_number: usize,
                           page_blocks: &mut usize,
                           metrics: &mut DocumentMetrics| {
            let table_rows = canvas
                .current_meta_values(TABLE_ROWS_META_KEY)
                .filter_map(|value| value.parse::<usize>().ok())
                .sum();
            metrics.pages.push(PageMetrics {
                page_number,
                command_count: canvas.current_command_count(),
                block_count: *page_blocks,
                table_rows,
                content_bytes: 0,
            });
            canvas.show_page();
            *page_blocks = 0;
        };

        let mut break_reason = "frame_exhausted";
        let mut story: VecDeque<Box<dyn Flowable>> = self.story.into_iter().collect();
        while let Some(flowable) = story.pop_front() {
            let mut current = flowable;
            loop {
                let current_name = current.debug_name();
                if frame_index >= frames.len() {
                    log_page_break(page_number, break_reason, current_name);
                    finish_page(&mut canvas, page_number, &mut page_blocks, &mut metrics);
                    page_number += 1;
                    frames = select_template(&self.page_templates, page_number).instantiate_frames();
                    frame_index = 0;
                    placed_on_page = false;
                }

                let is_last_frame = frame_index + 1 >= frames.len();
                let frame_rect = frames[frame_index].rect();
                let unplaceable_details = if !placed_on_page && is_last_frame {
                    let size = current.wrap(frame_rect.width, frame_rect.height);
                    Some(format!(
                        "{} size={}x{}pt frame={}x{}pt",
                        current_name,
                        size.width.to_f32(),
                        size.height.to_f32(),
                        frame_rect.width.to_f32(),
                        frame_rect.height.to_f32(),
                    ))
                } else {
                    None
                };

                match frames[frame_index].add(current, &mut canvas) {
                    AddResult::Placed => {
                        placed_on_page = true;
                        page_blocks += 1;
                        break;
                    }
                    AddResult::Split(remaining) => {
                        placed_on_page = true;
                        page_blocks += 1;
                        break_reason = "block_split";
                        current = remaining;
                        frame_index += 1;
                    }
                    AddResult::Overflow(remaining) => {
                        if !placed_on_page && is_last_frame {
                            let details = unplaceable_details.unwrap_or_else(|| "unknown".to_string());
                            return Err(ReportError::UnplaceableContent(details));
                        }
                        break_reason = "frame_overflow";
                        current = remaining;
                        frame_index += 1;
                    }
                }
            }
        }

        if !canvas.is_current_empty() || metrics.pages.is_empty() {
            finish_page(&mut canvas, page_number, &mut page_blocks, &mut metrics);
        }
        metrics.layout_ms = started.elapsed().as_secs_f64() * 1000.0;

        Ok((canvas.finish_without_show(), metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::test_support::temp_log_path;
    use crate::flowable::{Paragraph, Spacer, TableFlowable};
    use crate::types::{Margins, Size};

    fn a4_template() -> PageTemplate {
        PageTemplate::within_margins("report", Size::a4(), &Margins::all_mm(14.0))
            .expect("content rect")
    }

    #[test]
    fn empty_story_still_produces_one_page() {
        let (doc, metrics) = DocTemplate::new(vec![a4_template()])
            .build_with_metrics()
            .expect("build");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(metrics.page_count(), 1);
    }

    #[test]
    fn missing_templates_are_a_configuration_error() {
        let err = DocTemplate::new(Vec::new()).build().err().expect("error");
        assert!(matches!(err, ReportError::InvalidConfiguration(_)));

        let frameless = PageTemplate::new("bare", Size::a4());
        let err = DocTemplate::new(vec![frameless]).build().err().expect("error");
        assert!(matches!(err, ReportError::InvalidConfiguration(_)));
    }

    #[test]
    fn long_table_paginates_and_counts_rows_once() {
        let rows: Vec<Vec<String>> = (0..120).map(|i| vec![format!("row {i}")]).collect();
        let table = TableFlowable::new(vec!["Group".to_string()], rows, vec![1]).repeat_header(true);
        let path = temp_log_path("doc_template_breaks");
        let logger = DebugLogger::new(&path).expect("logger");

        let mut template = DocTemplate::new(vec![a4_template()]).with_debug(Some(logger.clone()));
        template.add_flowable(Box::new(Paragraph::new("Title")));
        template.add_flowable(Box::new(table));
        let (doc, metrics) = template.build_with_metrics().expect("build");
        logger.flush();

        assert!(doc.pages.len() > 1);
        assert_eq!(metrics.table_rows(), 120);
        for page in &doc.pages {
            assert_eq!(page.text_runs().filter(|t| *t == "Group").count(), 1);
        }
        let log = std::fs::read_to_string(&path).expect("read log");
        let breaks = log.lines().filter(|l| l.contains("layout.page_break")).count();
        assert_eq!(breaks, doc.pages.len() - 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn content_taller_than_an_empty_page_is_reported() {
        let mut template = DocTemplate::new(vec![a4_template()]);
        template.add_flowable(Box::new(Paragraph::new("Title")));
        template.add_flowable(Box::new(Spacer::new(2000.0)));
        match template.build() {
            Err(ReportError::UnplaceableContent(details)) => {
                assert!(details.contains("Spacer"), "{details}");
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("oversized spacer must not be placed"),
        }
    }
}
