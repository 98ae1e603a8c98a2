mod canvas;
mod debug;
mod doc_template;
mod error;
mod flowable;
mod font;
mod frame;
mod metrics;
mod model;
mod normalize;
mod page_template;
mod pdf;
mod pdfinspect;
mod report;
mod session;
mod types;
mod view;

pub use canvas::{Canvas, Command, Document, Page};
pub use doc_template::DocTemplate;
pub use error::ReportError;
pub use flowable::{
    BreakInside, Flowable, Pagination, Paragraph, Spacer, TableFlowable, TableStyle, TextAlign,
    TextStyle,
};
pub use frame::{AddResult, Frame};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use model::{
    AnalysisResult, BiasRecord, HIGH_BIAS_THRESHOLD, RawAnalysisPayload, RawBiasRecord, Sentiment,
};
pub use normalize::{
    DEFAULT_FILENAME_HINT, Normalized, UNKNOWN_GROUP, normalize, normalize_payload, parse_payload,
};
pub use page_template::PageTemplate;
pub use pdf::{PdfOptions, PdfWriteStats, document_to_pdf, document_to_pdf_with_metrics};
pub use pdfinspect::{
    PageText, PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes,
    inspect_pdf_path,
};
pub use report::{
    COLUMN_WEIGHTS, DocumentBuilder, ExportedReport, KEY_PHRASE_SEPARATOR, PdfDocumentBuilder,
    REPORT_TITLE, RenderedPdf, ReportSettings, TABLE_HEADER, export_report, render_report,
    report_file_name, table_rows,
};
pub use session::{ResultsSession, SessionState};
pub use types::{Color, Margins, Pt, Rect, Size};
pub use view::{
    GroupCard, HighBiasBanner, KEY_PHRASE_LIMIT, Notice, OverviewBar, ResultsScreen, ResultsView,
};

use debug::{DebugLogger, truncate_preview};
use serde_json::json;
use std::path::PathBuf;

/// Entry point: normalizes analysis payloads into a session and exports the
/// displayed result as a PDF report.
pub struct BiasReport {
    settings: ReportSettings,
    filename_hint: String,
    debug: Option<DebugLogger>,
}

#[derive(Clone)]
pub struct BiasReportBuilder {
    page_size: Size,
    margins: Margins,
    filename_hint: String,
    document_title: String,
    debug_path: Option<PathBuf>,
}

impl Default for BiasReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BiasReportBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all_mm(14.0),
            filename_hint: DEFAULT_FILENAME_HINT.to_string(),
            document_title: REPORT_TITLE.to_string(),
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    /// Filename used when a payload does not carry one.
    pub fn filename_hint(mut self, hint: impl Into<String>) -> Self {
        self.filename_hint = hint.into();
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = title.into();
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<BiasReport, ReportError> {
        if self.page_size.width <= Pt::ZERO || self.page_size.height <= Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(format!(
                "page size must be positive, got {}x{}pt",
                self.page_size.width.to_f32(),
                self.page_size.height.to_f32()
            )));
        }
        PageTemplate::within_margins("report", self.page_size, &self.margins)?;
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(BiasReport {
            settings: ReportSettings {
                page_size: self.page_size,
                margins: self.margins,
                document_title: self.document_title,
            },
            filename_hint: self.filename_hint,
            debug,
        })
    }
}

impl BiasReport {
    pub fn builder() -> BiasReportBuilder {
        BiasReportBuilder::new()
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Normalizes one payload delivery, logging the outcome.
    pub fn normalize(&self, payload: Option<&str>) -> Result<Normalized, ReportError> {
        let (normalized, stats) = match normalize::normalize_with_stats(payload, &self.filename_hint)
        {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("[bias_report][normalize] {err}");
                self.log(|logger| {
                    logger.log_event(json!({
                        "type": "normalize.parse_error",
                        "message": err.to_string(),
                        "preview": truncate_preview(payload.unwrap_or_default(), 80),
                    }));
                    logger.increment("normalize.parse_error", 1);
                });
                return Err(err);
            }
        };
        self.log(|logger| match &normalized {
            Normalized::NoResult => {
                logger.log_event(json!({"type": "normalize.no_payload"}));
                logger.increment("normalize.no_payload", 1);
            }
            Normalized::ServiceError(message) => {
                logger.log_event(json!({
                    "type": "normalize.service_error",
                    "message": message,
                }));
                logger.increment("normalize.service_error", 1);
            }
            Normalized::Ready(result) => {
                logger.log_event(json!({
                    "type": "normalize.complete",
                    "filename": result.filename,
                    "records": result.records().len(),
                    "high_bias": result.high_bias_count(),
                    "defaulted_fields": stats.defaulted_fields,
                    "skipped_records": stats.skipped_records,
                }));
                logger.increment("normalize.complete", 1);
                logger.increment("normalize.defaulted_fields", stats.defaulted_fields as u64);
            }
        });
        Ok(normalized)
    }

    /// Replaces what `session` displays with the outcome of `payload`. A
    /// payload that cannot be parsed shows a failure notice instead of
    /// propagating the error.
    pub fn ingest(&self, session: &mut ResultsSession, payload: Option<&str>) {
        match self.normalize(payload) {
            Ok(normalized) => session.show(normalized),
            Err(_) => session.show_failure(),
        }
    }

    /// Exports `result` as a PDF. `Ok(None)` when there is nothing to export.
    pub fn export(
        &self,
        result: Option<&AnalysisResult>,
    ) -> Result<Option<ExportedReport>, ReportError> {
        let Some(result) = result else {
            self.log(|logger| {
                logger.log_event(json!({"type": "export.skipped", "reason": "no_result"}));
                logger.increment("export.skipped", 1);
            });
            return Ok(None);
        };
        let exported =
            report::export_report_with_debug(Some(result), &self.settings, self.debug.clone())?;
        if let Some(report) = exported.as_ref() {
            self.log(|logger| {
                logger.log_event(json!({
                    "type": "export.complete",
                    "file_name": report.file_name,
                    "pages": report.page_count(),
                    "table_rows": report.metrics.table_rows(),
                    "bytes": report.bytes.len(),
                    "layout_ms": report.metrics.layout_ms,
                    "sha256": report.fingerprint,
                }));
                logger.increment("export.complete", 1);
            });
        }
        Ok(exported)
    }

    pub fn export_session(
        &self,
        session: &ResultsSession,
    ) -> Result<Option<ExportedReport>, ReportError> {
        let current = session.current();
        self.export(current.as_deref())
    }

    /// Writes the counter summary line and flushes the debug log.
    pub fn flush_debug(&self) {
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary("bias_report");
            logger.flush();
        }
    }

    fn log(&self, f: impl FnOnce(&DebugLogger)) {
        if let Some(logger) = self.debug.as_ref() {
            f(logger);
        }
    }
}
