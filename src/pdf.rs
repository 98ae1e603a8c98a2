use crate::canvas::{Command, Document, Page};
use crate::font::{HELVETICA, is_base14_font};
use crate::metrics::DocumentMetrics;
use crate::types::{Color, Pt};
use fixed::types::I32F32;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

const PDF_HEADER: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n";
const PRODUCER: &str = "bias_report";

#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfWriteStats {
    /// Characters with no WinAnsi code point, written as `?`.
    pub replaced_chars: usize,
}

#[derive(Debug, Clone)]
struct FontResource {
    resource: String,
    base_font: String,
}

pub fn document_to_pdf(document: &Document, options: &PdfOptions) -> io::Result<Vec<u8>> {
    let mut metrics = DocumentMetrics::default();
    Ok(document_to_pdf_with_metrics(document, options, &mut metrics)?.0)
}

/// Serializes `document` and fills in per-page content sizes plus the total
/// byte count on `metrics`. Output depends only on the inputs: no dates, ids
/// or compression settings that vary between runs.
pub fn document_to_pdf_with_metrics(
    document: &Document,
    options: &PdfOptions,
    metrics: &mut DocumentMetrics,
) -> io::Result<(Vec<u8>, PdfWriteStats)> {
    let mut out = Vec::new();
    let stats = document_to_pdf_writer(&mut out, document, options, metrics)?;
    Ok((out, stats))
}

fn document_to_pdf_writer<W: Write>(
    writer: &mut W,
    document: &Document,
    options: &PdfOptions,
    metrics: &mut DocumentMetrics,
) -> io::Result<PdfWriteStats> {
    let font_names = collect_used_font_names(document);
    let font_map = build_font_map(&font_names);

    let catalog_id = 1usize;
    let pages_id = 2usize;
    let first_font_id = 3usize;
    let first_page_id = first_font_id + font_map.len();
    let info_id = first_page_id + document.pages.len() * 2;
    let object_count = info_id;

    let mut offsets = vec![0usize; object_count + 1];
    let mut offset = 0usize;
    let mut stats = PdfWriteStats::default();

    write_bytes(writer, PDF_HEADER, &mut offset)?;
    write_pdf_object(
        writer,
        &mut offset,
        &mut offsets,
        catalog_id,
        &format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id),
    )?;

    let kids = (0..document.pages.len())
        .map(|idx| format!("{} 0 R", first_page_id + idx * 2))
        .collect::<Vec<_>>()
        .join(" ");
    write_pdf_object(
        writer,
        &mut offset,
        &mut offsets,
        pages_id,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            document.pages.len()
        ),
    )?;

    let mut font_refs = Vec::with_capacity(font_map.len());
    for (idx, font) in font_map.values().enumerate() {
        let font_id = first_font_id + idx;
        write_pdf_object(
            writer,
            &mut offset,
            &mut offsets,
            font_id,
            &font_object(&font.base_font),
        )?;
        font_refs.push((font.resource.clone(), font_id));
    }
    let resources = format!("<< /Font {} >>", font_resources(&font_refs));

    let page_height = document.page_size.height;
    for (idx, page) in document.pages.iter().enumerate() {
        let page_id = first_page_id + idx * 2;
        let content_id = page_id + 1;
        let content = render_page(page, page_height, &font_map, &mut stats);
        write_pdf_object(
            writer,
            &mut offset,
            &mut offsets,
            page_id,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>",
                pages_id,
                fmt_pt(document.page_size.width),
                fmt_pt(page_height),
                resources,
                content_id
            ),
        )?;
        write_pdf_object(
            writer,
            &mut offset,
            &mut offsets,
            content_id,
            &stream_object(&content),
        )?;
        if let Some(page_metrics) = metrics.pages.get_mut(idx) {
            page_metrics.content_bytes = content.len();
        }
    }

    write_pdf_object(
        writer,
        &mut offset,
        &mut offsets,
        info_id,
        &info_object(options.title.as_deref()),
    )?;

    let xref_start = offset;
    write_str(writer, &format!("xref\n0 {}\n", object_count + 1), &mut offset)?;
    write_str(writer, "0000000000 65535 f \n", &mut offset)?;
    for obj_offset in offsets.iter().skip(1) {
        write_str(writer, &format!("{:010} 00000 n \n", obj_offset), &mut offset)?;
    }
    write_str(
        writer,
        &format!(
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            catalog_id,
            info_id,
            xref_start
        ),
        &mut offset,
    )?;
    writer.flush()?;

    metrics.total_bytes = offset;
    Ok(stats)
}

#[derive(Debug, Clone)]
struct TextState {
    font_name: String,
    font_size: Pt,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_name: HELVETICA.to_string(),
            font_size: Pt::from_f32(12.0),
        }
    }
}

/// Tracks font selection the same way the canvas does: `q`/`Q` save and
/// restore it, and every page starts from the default state.
#[derive(Default)]
struct TextStateStack {
    current: TextState,
    saved: Vec<TextState>,
}

impl TextStateStack {
    fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::SaveState => self.saved.push(self.current.clone()),
            Command::RestoreState => {
                if let Some(state) = self.saved.pop() {
                    self.current = state;
                }
            }
            Command::SetFontName(name) => self.current.font_name = name.clone(),
            Command::SetFontSize(size) => self.current.font_size = *size,
            _ => {}
        }
    }
}

fn collect_used_font_names(document: &Document) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for page in &document.pages {
        let mut state = TextStateStack::default();
        for cmd in &page.commands {
            state.apply(cmd);
            if let Command::DrawString { .. } = cmd {
                names.insert(state.current.font_name.clone());
            }
        }
    }
    names
}

fn build_font_map(fonts: &BTreeSet<String>) -> BTreeMap<String, FontResource> {
    fonts
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let base_font = if is_base14_font(name) {
                name.clone()
            } else {
                HELVETICA.to_string()
            };
            (
                name.clone(),
                FontResource {
                    resource: format!("F{}", idx + 1),
                    base_font,
                },
            )
        })
        .collect()
}

fn render_page(
    page: &Page,
    page_height: Pt,
    font_map: &BTreeMap<String, FontResource>,
    stats: &mut PdfWriteStats,
) -> String {
    let mut out = String::new();
    let mut state = TextStateStack::default();

    for cmd in &page.commands {
        state.apply(cmd);
        match cmd {
            Command::SaveState => out.push_str("q\n"),
            Command::RestoreState => out.push_str("Q\n"),
            Command::Meta { .. } | Command::SetFontName(_) | Command::SetFontSize(_) => {}
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::DrawString { x, y, text } => {
                let font_size = state.current.font_size;
                let resource = font_map
                    .get(&state.current.font_name)
                    .map(|font| font.resource.as_str())
                    .unwrap_or("F1");
                let encoded = encode_winansi_pdf_string(text);
                stats.replaced_chars += encoded.replaced;
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(font_size)));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - font_size)
                ));
                out.push_str(&format!("({}) Tj\n", encoded.text));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::Fill => out.push_str("f\n"),
        }
    }

    out
}

fn font_object(base_font: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
}

fn font_resources(fonts: &[(String, usize)]) -> String {
    let entries = fonts
        .iter()
        .map(|(resource, font_id)| format!("/{} {} 0 R", resource, font_id))
        .collect::<Vec<_>>();
    format!("<< {} >>", entries.join(" "))
}

fn stream_object(content: &str) -> String {
    let length = content.len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn info_object(title: Option<&str>) -> String {
    let mut entries: Vec<String> = Vec::new();
    if let Some(title) = title {
        entries.push(format!("/Title ({})", encode_winansi_pdf_string(title).text));
    }
    entries.push(format!("/Producer ({})", PRODUCER));
    format!("<< {} >>", entries.join(" "))
}

fn write_pdf_object<W: Write>(
    writer: &mut W,
    offset: &mut usize,
    offsets: &mut [usize],
    obj_id: usize,
    body: &str,
) -> io::Result<()> {
    if let Some(slot) = offsets.get_mut(obj_id) {
        *slot = *offset;
    }
    write_str(writer, &format!("{} 0 obj\n", obj_id), offset)?;
    write_bytes(writer, body.as_bytes(), offset)?;
    write_bytes(writer, b"\nendobj\n", offset)?;
    Ok(())
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}

struct WinAnsiEncoded {
    text: String,
    replaced: usize,
}

/// Encodes `input` as a WinAnsi literal string body. Bytes outside printable
/// ASCII are written as octal escapes so the content stream stays 7-bit.
fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut replaced = 0usize;
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => {
                replaced += 1;
                b'?'
            }
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }

    WinAnsiEncoded {
        text: out,
        replaced,
    }
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn color_to_pdf_fill(color: Color) -> String {
    format!(
        "{} {} {} rg\n",
        fmt(clamp_unit(color.r)),
        fmt(clamp_unit(color.g)),
        fmt(clamp_unit(color.b))
    )
}
