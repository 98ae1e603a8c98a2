use crate::canvas::Canvas;
use crate::font::{FontMetrics, HELVETICA, HELVETICA_BOLD};
use crate::types::{Color, Pt, Size};
use std::sync::{Arc, Mutex};

pub(crate) const TABLE_ROWS_META_KEY: &str = "__table_rows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInside {
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub break_inside: BreakInside,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_inside: BreakInside::Auto,
        }
    }
}

pub trait Flowable: FlowableClone + Send + Sync {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    /// Split offered only on an empty frame once `split` has declined. It may
    /// break units that normally stay together (an Avoid block, a table row),
    /// since the content would not fit on any page otherwise.
    fn split_forced(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: Pt,
    pub line_height: Pt,
    pub color: Color,
    pub font_name: Arc<str>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::regular(12.0)
    }
}

impl TextStyle {
    pub fn regular(font_size: f32) -> Self {
        let font_size = Pt::from_f32(font_size);
        Self {
            font_size,
            line_height: font_size.mul_ratio(6, 5),
            color: Color::BLACK,
            font_name: Arc::<str>::from(HELVETICA),
        }
    }

    pub fn bold(font_size: f32) -> Self {
        Self {
            font_name: Arc::<str>::from(HELVETICA_BOLD),
            ..Self::regular(font_size)
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_line_height(mut self, line_height: Pt) -> Self {
        self.line_height = line_height;
        self
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics::for_name(&self.font_name)
    }

    fn measure(&self, text: &str) -> Pt {
        self.metrics().measure_text_width(self.font_size, text)
    }

    fn apply(&self, canvas: &mut Canvas) {
        canvas.set_fill_color(self.color);
        canvas.set_font_name(&self.font_name);
        canvas.set_font_size(self.font_size);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LineLayout {
    text: String,
    width: Pt,
}

/// Greedy word wrap. Explicit newlines start a new line, runs of whitespace
/// collapse to one space and words wider than `max_width` are broken by
/// character so nothing ever extends past the available width.
fn layout_lines(style: &TextStyle, text: &str, max_width: Pt) -> Vec<LineLayout> {
    let space_width = style.measure(" ");
    let mut lines = Vec::new();
    for source_line in text.split('\n') {
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in source_line.split_whitespace() {
            let word_width = style.measure(word);
            if word_width > max_width {
                if !current.is_empty() {
                    lines.push(LineLayout {
                        text: std::mem::take(&mut current),
                        width: current_width,
                    });
                }
                let mut parts = split_long_word_by_width(style, word, max_width);
                let Some(last) = parts.pop() else {
                    continue;
                };
                lines.extend(parts);
                current_width = last.width;
                current = last.text;
                continue;
            }
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width = current_width + space_width + word_width;
            } else {
                lines.push(LineLayout {
                    text: std::mem::replace(&mut current, word.to_string()),
                    width: current_width,
                });
                current_width = word_width;
            }
        }
        lines.push(LineLayout {
            text: current,
            width: current_width,
        });
    }
    lines
}

fn split_long_word_by_width(style: &TextStyle, word: &str, max_width: Pt) -> Vec<LineLayout> {
    let metrics = style.metrics();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = Pt::ZERO;
    for ch in word.chars() {
        let w = metrics.char_width(style.font_size, ch);
        if !current.is_empty() && current_width + w > max_width {
            parts.push(LineLayout {
                text: std::mem::take(&mut current),
                width: current_width,
            });
            current_width = Pt::ZERO;
        }
        current.push(ch);
        current_width = current_width + w;
    }
    parts.push(LineLayout {
        text: current,
        width: current_width,
    });
    parts
}

fn align_offset(align: TextAlign, avail_width: Pt, line_width: Pt) -> Pt {
    match align {
        TextAlign::Left => Pt::ZERO,
        TextAlign::Center => (avail_width - line_width).max(Pt::ZERO).mul_ratio(1, 2),
        TextAlign::Right => (avail_width - line_width).max(Pt::ZERO),
    }
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    text: String,
    style: TextStyle,
    align: TextAlign,
    pagination: Pagination,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            align: TextAlign::Left,
            pagination: Pagination::default(),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn split_lines(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let lines = layout_lines(&self.style, &self.text, avail_width);
        let lh = self.style.line_height.to_milli_i64();
        let ah = avail_height.to_milli_i64();
        if lh <= 0 || ah <= 0 {
            return None;
        }
        let split_at = (ah / lh) as usize;
        if split_at == 0 || split_at >= lines.len() {
            return None;
        }
        let join = |slice: &[LineLayout]| {
            slice
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let first = Paragraph {
            text: join(&lines[..split_at]),
            ..self.clone()
        };
        let second = Paragraph {
            text: join(&lines[split_at..]),
            ..self.clone()
        };
        Some((Box::new(first), Box::new(second)))
    }
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = layout_lines(&self.style, &self.text, avail_width);
        let width = lines
            .iter()
            .fold(Pt::ZERO, |acc, line| acc.max(line.width))
            .min(avail_width);
        Size {
            width,
            height: self.style.line_height * (lines.len() as i32),
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        if self.pagination.break_inside == BreakInside::Avoid {
            return None;
        }
        self.split_lines(avail_width, avail_height)
    }

    fn split_forced(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        self.split_lines(avail_width, avail_height)
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let lines = layout_lines(&self.style, &self.text, avail_width);
        self.style.apply(canvas);
        let mut cursor_y = y;
        for line in &lines {
            let offset = align_offset(self.align, avail_width, line.width);
            if !line.text.is_empty() {
                canvas.draw_string(x + offset, cursor_y, line.text.clone());
            }
            cursor_y = cursor_y + self.style.line_height;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self::new_pt(Pt::from_f32(height))
    }

    pub fn new_pt(height: Pt) -> Self {
        Self { height }
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height.max(Pt::ZERO),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub head: TextStyle,
    pub body: TextStyle,
    pub head_fill: Option<Color>,
    pub stripe_fill: Option<Color>,
    pub cell_padding: Pt,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            head: TextStyle::bold(10.0),
            body: TextStyle::regular(10.0),
            head_fill: None,
            stripe_fill: None,
            cell_padding: Pt::from_f32(4.0),
        }
    }
}

#[derive(Debug, Clone)]
struct TableLayout {
    width_milli: i64,
    column_widths: Vec<Pt>,
    header: Vec<Vec<LineLayout>>,
    header_height: Pt,
    rows: Vec<Vec<Vec<LineLayout>>>,
    /// Line count of the tallest cell in each body row, at least 1.
    row_line_counts: Vec<usize>,
}

#[derive(Debug)]
struct TableData {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    column_weights: Vec<i32>,
    style: TableStyle,
    layout_cache: Mutex<Option<Arc<TableLayout>>>,
}

/// A table whose column widths are fixed proportions of the available width,
/// independent of cell content. Cell text wraps inside its column. The table
/// splits between rows and can repeat its header row on every page it spans;
/// a row taller than a whole frame is split between its text lines.
#[derive(Debug, Clone)]
pub struct TableFlowable {
    data: Arc<TableData>,
    body_range: std::ops::Range<usize>,
    /// Lines of the first body row already drawn by an earlier part.
    first_row_skip: usize,
    /// Line index where the last body row stops, when it continues in a later part.
    last_row_end: Option<usize>,
    include_header: bool,
    repeat_header: bool,
}

impl TableFlowable {
    /// `column_weights` gives each column's share of the width; missing or
    /// non-positive weights count as 1.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>, column_weights: Vec<i32>) -> Self {
        let columns = header
            .len()
            .max(rows.iter().map(|row| row.len()).max().unwrap_or(0));
        let column_weights = (0..columns)
            .map(|idx| column_weights.get(idx).copied().filter(|w| *w > 0).unwrap_or(1))
            .collect();
        let len = rows.len();
        Self {
            data: Arc::new(TableData {
                header,
                rows,
                column_weights,
                style: TableStyle::default(),
                layout_cache: Mutex::new(None),
            }),
            body_range: 0..len,
            first_row_skip: 0,
            last_row_end: None,
            include_header: true,
            repeat_header: false,
        }
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.data = Arc::new(TableData {
            header: self.data.header.clone(),
            rows: self.data.rows.clone(),
            column_weights: self.data.column_weights.clone(),
            style,
            layout_cache: Mutex::new(None),
        });
        self
    }

    pub fn repeat_header(mut self, repeat: bool) -> Self {
        self.repeat_header = repeat;
        self
    }

    pub(crate) fn column_widths(&self, avail_width: Pt) -> Vec<Pt> {
        let weights = &self.data.column_weights;
        let total: i32 = weights.iter().sum();
        let mut widths = Vec::with_capacity(weights.len());
        let mut used = Pt::ZERO;
        for (idx, weight) in weights.iter().enumerate() {
            // The last column takes the remainder so the columns always tile
            // the full width exactly.
            let width = if idx + 1 == weights.len() {
                avail_width - used
            } else {
                avail_width.mul_ratio(*weight, total)
            };
            used = used + width;
            widths.push(width);
        }
        widths
    }

    fn layout(&self, avail_width: Pt) -> Arc<TableLayout> {
        let width_milli = avail_width.to_milli_i64();
        if let Ok(cache) = self.data.layout_cache.lock() {
            if let Some(layout) = cache.as_ref() {
                if layout.width_milli == width_milli {
                    return layout.clone();
                }
            }
        }
        let data = &self.data;
        let style = &data.style;
        let padding = style.cell_padding;
        let column_widths = self.column_widths(avail_width);
        let layout_row = |cells: &[String], text_style: &TextStyle| -> (Vec<Vec<LineLayout>>, usize) {
            let mut max_lines = 1usize;
            let lines = column_widths
                .iter()
                .enumerate()
                .map(|(idx, width)| {
                    let inner = (*width - padding * 2).max(Pt::from_f32(1.0));
                    let text = cells.get(idx).map(String::as_str).unwrap_or("");
                    let lines = layout_lines(text_style, text, inner);
                    max_lines = max_lines.max(lines.len());
                    lines
                })
                .collect();
            (lines, max_lines)
        };
        let (header, header_height) = if data.header.is_empty() {
            (Vec::new(), Pt::ZERO)
        } else {
            let (lines, count) = layout_row(&data.header, &style.head);
            (lines, style.head.line_height * (count as i32) + padding * 2)
        };
        let mut rows = Vec::with_capacity(data.rows.len());
        let mut row_line_counts = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            let (lines, count) = layout_row(row, &style.body);
            rows.push(lines);
            row_line_counts.push(count);
        }
        let layout = Arc::new(TableLayout {
            width_milli,
            column_widths,
            header,
            header_height,
            rows,
            row_line_counts,
        });
        if let Ok(mut cache) = self.data.layout_cache.lock() {
            *cache = Some(layout.clone());
        }
        layout
    }

    fn header_height(&self, layout: &TableLayout) -> Pt {
        if self.include_header {
            layout.header_height
        } else {
            Pt::ZERO
        }
    }

    /// Lines of body row `idx` that this part draws.
    fn row_window(&self, layout: &TableLayout, idx: usize) -> std::ops::Range<usize> {
        let count = layout.row_line_counts[idx];
        let start = if idx == self.body_range.start {
            self.first_row_skip.min(count)
        } else {
            0
        };
        let end = match self.last_row_end {
            Some(end) if idx + 1 == self.body_range.end => end.min(count),
            _ => count,
        };
        start..end.max(start)
    }

    fn row_height(&self, layout: &TableLayout, idx: usize) -> Pt {
        let style = &self.data.style;
        let lines = self.row_window(layout, idx).len().max(1);
        style.body.line_height * (lines as i32) + style.cell_padding * 2
    }

    /// Rows whose last line is drawn by this part.
    fn completed_rows(&self, layout: &TableLayout) -> usize {
        if self.body_range.is_empty() {
            return 0;
        }
        let last = self.body_range.end - 1;
        let truncated = self.row_window(layout, last).end < layout.row_line_counts[last];
        self.body_range.len() - usize::from(truncated)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        canvas: &mut Canvas,
        layout: &TableLayout,
        cells: &[Vec<LineLayout>],
        window: std::ops::Range<usize>,
        text_style: &TextStyle,
        fill: Option<Color>,
        x: Pt,
        y: Pt,
        height: Pt,
    ) {
        let padding = self.data.style.cell_padding;
        if let Some(color) = fill {
            let total_width: Pt = layout.column_widths.iter().copied().sum();
            canvas.set_fill_color(color);
            canvas.draw_rect(x, y, total_width, height);
            canvas.fill();
        }
        text_style.apply(canvas);
        let mut cell_x = x;
        for (idx, width) in layout.column_widths.iter().enumerate() {
            let mut cursor_y = y + padding;
            if let Some(lines) = cells.get(idx) {
                for line in lines.iter().take(window.end).skip(window.start) {
                    if !line.text.is_empty() {
                        canvas.draw_string(cell_x + padding, cursor_y, line.text.clone());
                    }
                    cursor_y = cursor_y + text_style.line_height;
                }
            }
            cell_x = cell_x + *width;
        }
    }
}

impl Flowable for TableFlowable {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let layout = self.layout(avail_width);
        let body: Pt = self
            .body_range
            .clone()
            .map(|idx| self.row_height(&layout, idx))
            .sum();
        Size {
            width: avail_width,
            height: self.header_height(&layout) + body,
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let layout = self.layout(avail_width);
        let mut used = self.header_height(&layout);
        let mut fitted = 0usize;
        for idx in self.body_range.clone() {
            let next = used + self.row_height(&layout, idx);
            if next > avail_height {
                break;
            }
            used = next;
            fitted += 1;
        }
        if fitted == 0 || fitted >= self.body_range.len() {
            return None;
        }
        let mid = self.body_range.start + fitted;
        let first = TableFlowable {
            body_range: self.body_range.start..mid,
            last_row_end: None,
            ..self.clone()
        };
        let second = TableFlowable {
            body_range: mid..self.body_range.end,
            first_row_skip: 0,
            include_header: self.repeat_header,
            ..self.clone()
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn split_forced(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        if self.body_range.is_empty() {
            return None;
        }
        let layout = self.layout(avail_width);
        let style = &self.data.style;
        let idx = self.body_range.start;
        let window = self.row_window(&layout, idx);
        let room = avail_height - self.header_height(&layout) - style.cell_padding * 2;
        let lh = style.body.line_height.to_milli_i64();
        let room = room.to_milli_i64();
        if lh <= 0 || room <= 0 {
            return None;
        }
        let fit = (room / lh) as usize;
        if fit == 0 || fit >= window.len() {
            return None;
        }
        let cut = window.start + fit;
        let first = TableFlowable {
            body_range: idx..idx + 1,
            last_row_end: Some(cut),
            ..self.clone()
        };
        let second = TableFlowable {
            first_row_skip: cut,
            include_header: self.repeat_header,
            ..self.clone()
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let layout = self.layout(avail_width);
        let style = &self.data.style;
        let mut cursor_y = y;
        canvas.save_state();
        if self.include_header && !layout.header.is_empty() {
            self.draw_row(
                canvas,
                &layout,
                &layout.header,
                0..usize::MAX,
                &style.head,
                style.head_fill,
                x,
                cursor_y,
                layout.header_height,
            );
            cursor_y = cursor_y + layout.header_height;
        }
        for idx in self.body_range.clone() {
            let height = self.row_height(&layout, idx);
            let fill = if idx % 2 == 1 { style.stripe_fill } else { None };
            self.draw_row(
                canvas,
                &layout,
                &layout.rows[idx],
                self.row_window(&layout, idx),
                &style.body,
                fill,
                x,
                cursor_y,
                height,
            );
            cursor_y = cursor_y + height;
        }
        canvas.restore_state();
        canvas.meta(TABLE_ROWS_META_KEY, self.completed_rows(&layout).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn drawn_text(canvas: Canvas) -> Vec<String> {
        let doc = canvas.finish();
        doc.pages[0].text_runs().map(str::to_string).collect()
    }

    #[test]
    fn paragraph_wraps_inside_available_width() {
        let style = TextStyle::regular(10.0);
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let lines = layout_lines(&style, text, Pt::from_f32(60.0));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.width <= Pt::from_f32(60.0)));
        let rejoined = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn long_words_break_by_character() {
        let style = TextStyle::regular(10.0);
        let word = "x".repeat(80);
        let lines = layout_lines(&style, &word, Pt::from_f32(50.0));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.width <= Pt::from_f32(50.0)));
        let total: usize = lines.iter().map(|line| line.text.len()).sum();
        assert_eq!(total, 80);
    }

    #[test]
    fn empty_text_still_occupies_one_line() {
        let paragraph = Paragraph::new("").with_style(TextStyle::regular(10.0));
        let size = paragraph.wrap(Pt::from_f32(100.0), Pt::from_f32(100.0));
        assert_eq!(size.height, TextStyle::regular(10.0).line_height);
    }

    #[test]
    fn centered_paragraph_is_offset_by_half_the_slack() {
        let style = TextStyle::regular(10.0);
        let width = style.measure("Title");
        let mut canvas = Canvas::new(Size::a4());
        Paragraph::new("Title")
            .with_style(style)
            .with_align(TextAlign::Center)
            .draw(&mut canvas, Pt::ZERO, Pt::ZERO, Pt::from_f32(200.0), Pt::from_f32(50.0));
        let doc = canvas.finish();
        let x = doc.pages[0]
            .commands
            .iter()
            .find_map(|cmd| match cmd {
                Command::DrawString { x, .. } => Some(*x),
                _ => None,
            })
            .expect("string drawn");
        assert_eq!(x, (Pt::from_f32(200.0) - width).mul_ratio(1, 2));
    }

    #[test]
    fn avoid_paragraph_refuses_to_split() {
        let paragraph = Paragraph::new("one\ntwo\nthree").with_pagination(Pagination {
            break_inside: BreakInside::Avoid,
        });
        assert!(paragraph.split(Pt::from_f32(200.0), Pt::from_f32(20.0)).is_none());
        assert!(paragraph
            .split_forced(Pt::from_f32(200.0), Pt::from_f32(20.0))
            .is_some());
        let loose = Paragraph::new("one\ntwo\nthree");
        assert!(loose.split(Pt::from_f32(200.0), Pt::from_f32(20.0)).is_some());
    }

    #[test]
    fn column_widths_are_fixed_proportions_that_tile_the_width() {
        let table = TableFlowable::new(
            strings(&["a", "b", "c"]),
            vec![strings(&["a very long cell that should not widen its column", "", ""])],
            vec![1, 2, 1],
        );
        let widths = table.column_widths(Pt::from_f32(400.0));
        assert_eq!(widths[0], Pt::from_f32(100.0));
        assert_eq!(widths[1], Pt::from_f32(200.0));
        assert_eq!(widths[2], Pt::from_f32(100.0));
        let total: Pt = widths.iter().copied().sum();
        assert_eq!(total, Pt::from_f32(400.0));
    }

    #[test]
    fn wrapped_cell_grows_row_height_not_column_width() {
        let short = TableFlowable::new(strings(&["h"]), vec![strings(&["short"])], vec![1]);
        let long = TableFlowable::new(
            strings(&["h"]),
            vec![strings(&["several words that need more than one line here"])],
            vec![1],
        );
        let width = Pt::from_f32(80.0);
        let short_size = short.wrap(width, Pt::from_f32(1000.0));
        let long_size = long.wrap(width, Pt::from_f32(1000.0));
        assert_eq!(short_size.width, long_size.width);
        assert!(long_size.height > short_size.height);
    }

    #[test]
    fn split_between_rows_repeats_header() {
        let rows: Vec<Vec<String>> = (0..10).map(|i| vec![format!("row {i}")]).collect();
        let table =
            TableFlowable::new(strings(&["Header"]), rows, vec![1]).repeat_header(true);
        let width = Pt::from_f32(200.0);
        let full = table.wrap(width, Pt::from_f32(10_000.0)).height;
        let (first, second) = table
            .split(width, full.mul_ratio(1, 2))
            .expect("table should split");

        let mut canvas = Canvas::new(Size::a4());
        first.draw(&mut canvas, Pt::ZERO, Pt::ZERO, width, Pt::from_f32(1000.0));
        let first_text = drawn_text(canvas);
        let mut canvas = Canvas::new(Size::a4());
        second.draw(&mut canvas, Pt::ZERO, Pt::ZERO, width, Pt::from_f32(1000.0));
        let second_text = drawn_text(canvas);

        assert_eq!(first_text[0], "Header");
        assert_eq!(second_text[0], "Header");
        assert_eq!(first_text.len() + second_text.len(), 12);
        assert_eq!(first_text[1], "row 0");
        assert_eq!(second_text.last().map(String::as_str), Some("row 9"));
    }

    #[test]
    fn table_does_not_split_when_no_row_fits() {
        let table = TableFlowable::new(
            strings(&["Header"]),
            vec![strings(&["row"]), strings(&["row"])],
            vec![1],
        );
        assert!(table.split(Pt::from_f32(200.0), Pt::from_f32(5.0)).is_none());
    }

    #[test]
    fn striped_rows_fill_every_other_body_row() {
        let style = TableStyle {
            stripe_fill: Some(Color::rgb8(245, 245, 245)),
            ..TableStyle::default()
        };
        let rows: Vec<Vec<String>> = (0..4).map(|i| vec![format!("r{i}")]).collect();
        let table = TableFlowable::new(strings(&["h"]), rows, vec![1]).with_style(style);
        let mut canvas = Canvas::new(Size::a4());
        table.draw(&mut canvas, Pt::ZERO, Pt::ZERO, Pt::from_f32(100.0), Pt::from_f32(500.0));
        let doc = canvas.finish();
        let rects = doc.pages[0]
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::DrawRect { .. }))
            .count();
        assert_eq!(rects, 2);
    }

    fn table_rows_meta(canvas: &Canvas) -> Vec<String> {
        canvas
            .current_meta_values(TABLE_ROWS_META_KEY)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn row_taller_than_the_frame_splits_between_lines() {
        let tall = (0..30).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let table = TableFlowable::new(
            strings(&["Header"]),
            vec![vec![tall], strings(&["after"])],
            vec![1],
        )
        .repeat_header(true);
        let width = Pt::from_f32(100.0);
        let avail = Pt::from_f32(200.0);
        assert!(table.split(width, avail).is_none());

        let (first, second) = table.split_forced(width, avail).expect("row should split");
        assert!(first.wrap(width, avail).height <= avail);

        let mut canvas = Canvas::new(Size::a4());
        first.draw(&mut canvas, Pt::ZERO, Pt::ZERO, width, avail);
        assert_eq!(table_rows_meta(&canvas), vec!["0".to_string()]);
        let first_text = drawn_text(canvas);
        let mut canvas = Canvas::new(Size::a4());
        second.draw(&mut canvas, Pt::ZERO, Pt::ZERO, width, Pt::from_f32(1000.0));
        assert_eq!(table_rows_meta(&canvas), vec!["2".to_string()]);
        let second_text = drawn_text(canvas);

        assert_eq!(first_text[0], "Header");
        assert_eq!(second_text[0], "Header");
        let body: Vec<String> = first_text[1..]
            .iter()
            .chain(second_text[1..].iter())
            .cloned()
            .collect();
        let mut expected: Vec<String> = (0..30).map(|i| format!("line{i}")).collect();
        expected.push("after".to_string());
        assert_eq!(body, expected);
        assert_eq!(first_text.len(), 15);
    }

    #[test]
    fn forced_split_needs_room_for_one_line_below_the_header() {
        let tall = (0..30).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let table = TableFlowable::new(strings(&["Header"]), vec![vec![tall]], vec![1]);
        assert!(table
            .split_forced(Pt::from_f32(100.0), Pt::from_f32(25.0))
            .is_none());
    }
}
