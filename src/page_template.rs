use crate::error::ReportError;
use crate::frame::Frame;
use crate::types::{Margins, Rect, Size};

/// Geometry of one page: its size and the content areas flowables fill, in
/// order. Report pages carry a single frame inside the margins.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    frames: Vec<Rect>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            frames: Vec::new(),
        }
    }

    /// One frame covering everything inside `margins`.
    pub fn within_margins(
        name: impl Into<String>,
        page_size: Size,
        margins: &Margins,
    ) -> Result<Self, ReportError> {
        let name = name.into();
        let content = margins.content_rect(page_size).ok_or_else(|| {
            ReportError::InvalidConfiguration(format!(
                "margins leave no room for content on page template '{name}'"
            ))
        })?;
        Ok(Self::new(name, page_size).with_frame(content))
    }

    pub fn with_frame(mut self, rect: Rect) -> Self {
        self.frames.push(rect);
        self
    }

    pub fn frames(&self) -> &[Rect] {
        &self.frames
    }

    /// Fresh frames, each with its cursor at the top, for a new page.
    pub fn instantiate_frames(&self) -> Vec<Frame> {
        self.frames.iter().copied().map(Frame::new).collect()
    }
}
