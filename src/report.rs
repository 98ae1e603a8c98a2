use crate::canvas::Document;
use crate::debug::DebugLogger;
use crate::doc_template::DocTemplate;
use crate::error::ReportError;
use crate::flowable::{
    BreakInside, Pagination, Paragraph, Spacer, TableFlowable, TableStyle, TextAlign, TextStyle,
};
use crate::metrics::DocumentMetrics;
use crate::model::AnalysisResult;
use crate::page_template::PageTemplate;
use crate::pdf::{PdfOptions, PdfWriteStats, document_to_pdf_with_metrics};
use crate::types::{Color, Margins, Pt, Size};
use sha2::{Digest, Sha256};

pub const REPORT_TITLE: &str = "Religious Bias Analysis Report";
pub const REPORT_SUFFIX: &str = "-analysis";
pub const REPORT_EXTENSION: &str = "pdf";
pub const TABLE_HEADER: [&str; 5] = ["Group", "Positive", "Neutral", "Negative", "Key Phrases"];
pub const KEY_PHRASE_SEPARATOR: &str = ", ";

/// Fixed column shares: 35 mm for the group, 70 mm for key phrases and the
/// rest of a 182 mm A4 content width split evenly, all scaled by 3.
pub const COLUMN_WEIGHTS: [i32; 5] = [105, 77, 77, 77, 210];

const LABEL_FILE: &str = "File:";
const LABEL_UPLOAD_TIME: &str = "Upload Time:";
const LABEL_TOTAL_WORDS: &str = "Total Words:";
const LABEL_SENTIMENT: &str = "Overall Sentiment:";
const LABEL_HIGH_BIAS: &str = "High Bias Groups:";

/// Formatting operations the report needs from a document library.
pub trait DocumentBuilder {
    type Output;

    fn add_heading(&mut self, text: &str);
    fn add_key_value_lines(&mut self, lines: &[(&str, String)]);
    fn add_table(&mut self, header: &[&str], rows: Vec<Vec<String>>, column_weights: &[i32]);
    fn finish(self) -> Result<Self::Output, ReportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub page_size: Size,
    pub margins: Margins,
    pub document_title: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all_mm(14.0),
            document_title: REPORT_TITLE.to_string(),
        }
    }
}

/// One exported document. Regenerated from the canonical result on every
/// export; nothing here is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metrics: DocumentMetrics,
    /// Lowercase hex SHA-256 of `bytes`.
    pub fingerprint: String,
}

impl ExportedReport {
    pub fn page_count(&self) -> usize {
        self.metrics.page_count()
    }
}

pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub metrics: DocumentMetrics,
    pub stats: PdfWriteStats,
}

/// `DocumentBuilder` backed by the flowable layout engine and the PDF writer.
pub struct PdfDocumentBuilder {
    template: DocTemplate,
    title: String,
}

impl PdfDocumentBuilder {
    pub fn new(settings: &ReportSettings) -> Result<Self, ReportError> {
        Self::with_debug(settings, None)
    }

    pub(crate) fn with_debug(
        settings: &ReportSettings,
        debug: Option<DebugLogger>,
    ) -> Result<Self, ReportError> {
        let page = PageTemplate::within_margins("report", settings.page_size, &settings.margins)?;
        Ok(Self {
            template: DocTemplate::new(vec![page]).with_debug(debug),
            title: settings.document_title.clone(),
        })
    }

    /// Paginates everything added so far without serializing it.
    pub(crate) fn layout(self) -> Result<(Document, DocumentMetrics), ReportError> {
        self.template.build_with_metrics()
    }
}

impl DocumentBuilder for PdfDocumentBuilder {
    type Output = RenderedPdf;

    fn add_heading(&mut self, text: &str) {
        self.template.add_flowable(Box::new(
            Paragraph::new(text)
                .with_style(TextStyle::regular(18.0))
                .with_align(TextAlign::Center),
        ));
        self.template.add_flowable(Box::new(Spacer::new_pt(Pt::from_mm(3.0))));
    }

    fn add_key_value_lines(&mut self, lines: &[(&str, String)]) {
        let text = lines
            .iter()
            .map(|(label, value)| format!("{label} {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        let style = TextStyle::regular(12.0).with_line_height(Pt::from_mm(7.0));
        self.template.add_flowable(Box::new(
            Paragraph::new(text)
                .with_style(style)
                .with_pagination(Pagination {
                    break_inside: BreakInside::Avoid,
                }),
        ));
        self.template.add_flowable(Box::new(Spacer::new_pt(Pt::from_mm(4.0))));
    }

    fn add_table(&mut self, header: &[&str], rows: Vec<Vec<String>>, column_weights: &[i32]) {
        let style = TableStyle {
            head: TextStyle::bold(10.0).with_color(Color::WHITE),
            body: TextStyle::regular(10.0),
            head_fill: Some(Color::rgb8(52, 152, 219)),
            stripe_fill: Some(Color::rgb8(245, 245, 245)),
            cell_padding: Pt::from_f32(4.0),
        };
        let header = header.iter().map(|cell| cell.to_string()).collect();
        self.template.add_flowable(Box::new(
            TableFlowable::new(header, rows, column_weights.to_vec())
                .with_style(style)
                .repeat_header(true),
        ));
    }

    fn finish(self) -> Result<RenderedPdf, ReportError> {
        let options = PdfOptions {
            title: Some(self.title.clone()),
        };
        let (document, mut metrics) = self.layout()?;
        let (bytes, stats) = document_to_pdf_with_metrics(&document, &options, &mut metrics)?;
        Ok(RenderedPdf {
            bytes,
            metrics,
            stats,
        })
    }
}

/// Drives `builder` through the fixed report layout: title, five metadata
/// lines, then one table row per record in canonical order.
pub fn render_report<B: DocumentBuilder>(
    result: &AnalysisResult,
    mut builder: B,
) -> Result<B::Output, ReportError> {
    add_report_content(result, &mut builder);
    builder.finish()
}

fn add_report_content<B: DocumentBuilder>(result: &AnalysisResult, builder: &mut B) {
    builder.add_heading(REPORT_TITLE);
    builder.add_key_value_lines(&[
        (LABEL_FILE, result.filename.clone()),
        (LABEL_UPLOAD_TIME, result.upload_time.clone()),
        (LABEL_TOTAL_WORDS, result.total_words.to_string()),
        (LABEL_SENTIMENT, result.overall_sentiment.to_string()),
        (LABEL_HIGH_BIAS, result.high_bias_count().to_string()),
    ]);
    builder.add_table(&TABLE_HEADER, table_rows(result), &COLUMN_WEIGHTS);
}

pub fn table_rows(result: &AnalysisResult) -> Vec<Vec<String>> {
    result
        .records()
        .iter()
        .map(|record| {
            vec![
                record.group.clone(),
                format!("{}%", record.positivity),
                format!("{}%", record.neutrality),
                format!("{}%", record.negativity),
                record.key_phrases().join(KEY_PHRASE_SEPARATOR),
            ]
        })
        .collect()
}

/// `<filename without its last extension>-analysis.pdf`. Only a non-empty
/// final dot-suffix that contains no `/` counts as an extension.
pub fn report_file_name(filename: &str) -> String {
    let base = match filename.rfind('.') {
        Some(idx) => {
            let extension = &filename[idx + 1..];
            if extension.is_empty() || extension.contains('/') {
                filename
            } else {
                &filename[..idx]
            }
        }
        None => filename,
    };
    format!("{base}{REPORT_SUFFIX}.{REPORT_EXTENSION}")
}

/// Builds the PDF for `result`. With no result there is nothing to export
/// and `Ok(None)` is returned.
pub fn export_report(
    result: Option<&AnalysisResult>,
    settings: &ReportSettings,
) -> Result<Option<ExportedReport>, ReportError> {
    export_report_with_debug(result, settings, None)
}

pub(crate) fn export_report_with_debug(
    result: Option<&AnalysisResult>,
    settings: &ReportSettings,
    debug: Option<DebugLogger>,
) -> Result<Option<ExportedReport>, ReportError> {
    let Some(result) = result else {
        return Ok(None);
    };
    let builder = PdfDocumentBuilder::with_debug(settings, debug)?;
    let rendered = render_report(result, builder)?;
    if rendered.stats.replaced_chars > 0 {
        eprintln!(
            "[bias_report][export] {} character(s) outside WinAnsi were written as '?'",
            rendered.stats.replaced_chars
        );
    }
    let fingerprint = sha256_hex(&rendered.bytes);
    Ok(Some(ExportedReport {
        file_name: report_file_name(&result.filename),
        bytes: rendered.bytes,
        metrics: rendered.metrics,
        fingerprint,
    }))
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
