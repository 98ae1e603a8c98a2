use lopdf::content::Content;
use lopdf::{Document as LoDocument, Object as LoObject};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfContentDecodeFailed,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfContentDecodeFailed => "PDF_CONTENT_DECODE_FAILED",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    /// Operands of every `Tj` on the page, in content-stream order.
    pub text_runs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub file_size_bytes: usize,
    pub title: Option<String>,
    pub pages: Vec<PageText>,
}

impl PdfInspectReport {
    pub fn all_text_runs(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.text_runs.iter().map(String::as_str))
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let mut pages = Vec::new();
    for (page_number, page_id) in pdf.get_pages() {
        let raw = pdf.get_page_content(page_id).map_err(|err| PdfInspectError {
            code: PdfInspectErrorCode::PdfContentDecodeFailed,
            message: format!("page {page_number}: {err}"),
        })?;
        let content = Content::decode(&raw).map_err(|err| PdfInspectError {
            code: PdfInspectErrorCode::PdfContentDecodeFailed,
            message: format!("page {page_number}: {err}"),
        })?;
        let text_runs = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(LoObject::String(bytes, _)) => Some(decode_winansi(bytes)),
                _ => None,
            })
            .collect();
        pages.push(PageText {
            page_number: page_number as usize,
            text_runs,
        });
    }

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        encrypted: pdf.is_encrypted(),
        file_size_bytes: bytes.len(),
        title: document_title(&pdf),
        pages,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

fn document_title(pdf: &LoDocument) -> Option<String> {
    let info_id = pdf.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = pdf.get_object(info_id).ok()?.as_dict().ok()?;
    match info.get(b"Title").ok()? {
        LoObject::String(bytes, _) => Some(decode_winansi(bytes)),
        _ => None,
    }
}

fn decode_winansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| match byte {
            0x80 => '\u{20AC}',
            0x85 => '\u{2026}',
            0x91 => '\u{2018}',
            0x92 => '\u{2019}',
            0x93 => '\u{201C}',
            0x94 => '\u{201D}',
            0x95 => '\u{2022}',
            0x96 => '\u{2013}',
            0x97 => '\u{2014}',
            0x99 => '\u{2122}',
            b => *b as char,
        })
        .collect()
}
