use crate::canvas::Canvas;
use crate::flowable::{BreakInside, Flowable};
use crate::types::{Pt, Rect};

pub enum AddResult {
    Placed,
    Split(Box<dyn Flowable>),
    Overflow(Box<dyn Flowable>),
}

pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    fn place(&mut self, flowable: &dyn Flowable, canvas: &mut Canvas, width: Pt, height: Pt) {
        let avail_height = self.remaining_height();
        let y = self.rect.y + self.cursor_y;
        flowable.draw(canvas, self.rect.x, y, self.rect.width, avail_height);
        canvas.record_block_bounds(Rect {
            x: self.rect.x,
            y,
            width,
            height,
        });
        self.cursor_y = self.cursor_y + height;
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        if avail_height <= Pt::ZERO {
            return AddResult::Overflow(flowable);
        }

        let size = flowable.wrap(avail_width, avail_height);
        if flowable.pagination().break_inside == BreakInside::Avoid
            && size.height > avail_height
            && size.height <= self.rect.height
            && !self.is_empty()
        {
            return AddResult::Overflow(flowable);
        }

        if size.height <= avail_height {
            self.place(flowable.as_ref(), canvas, size.width, size.height);
            return AddResult::Placed;
        }

        if let Some(rest) = self.place_first_part(
            flowable.split(avail_width, avail_height),
            canvas,
        ) {
            return AddResult::Split(rest);
        }

        // An empty frame is the tallest this content will ever get. Break it
        // wherever it allows; otherwise it cannot be placed at all.
        if self.is_empty() {
            if let Some(rest) = self.place_first_part(
                flowable.split_forced(avail_width, avail_height),
                canvas,
            ) {
                return AddResult::Split(rest);
            }
        }

        AddResult::Overflow(flowable)
    }

    fn place_first_part(
        &mut self,
        parts: Option<(Box<dyn Flowable>, Box<dyn Flowable>)>,
        canvas: &mut Canvas,
    ) -> Option<Box<dyn Flowable>> {
        let (first, second) = parts?;
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        let first_size = first.wrap(avail_width, avail_height);
        if first_size.height <= Pt::ZERO || first_size.height > avail_height {
            return None;
        }
        self.place(first.as_ref(), canvas, first_size.width, first_size.height);
        Some(second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowable::{Pagination, Paragraph, Spacer};
    use crate::types::Size;

    fn frame(height: f32) -> Frame {
        Frame::new(Rect {
            x: Pt::from_f32(10.0),
            y: Pt::from_f32(10.0),
            width: Pt::from_f32(200.0),
            height: Pt::from_f32(height),
        })
    }

    #[test]
    fn placed_content_advances_the_cursor() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(100.0);
        assert!(matches!(
            frame.add(Box::new(Spacer::new(30.0)), &mut canvas),
            AddResult::Placed
        ));
        assert_eq!(frame.remaining_height(), Pt::from_f32(70.0));
        assert!(!frame.is_empty());
    }

    #[test]
    fn avoid_block_moves_to_next_frame_instead_of_splitting() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(60.0);
        let _ = frame.add(Box::new(Spacer::new(40.0)), &mut canvas);
        let block = Paragraph::new("one\ntwo\nthree").with_pagination(Pagination {
            break_inside: BreakInside::Avoid,
        });
        assert!(matches!(
            frame.add(Box::new(block), &mut canvas),
            AddResult::Overflow(_)
        ));
    }

    #[test]
    fn splittable_paragraph_leaves_a_remainder() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(30.0);
        let result = frame.add(Box::new(Paragraph::new("one\ntwo\nthree")), &mut canvas);
        assert!(matches!(result, AddResult::Split(_)));
    }

    #[test]
    fn oversized_unsplittable_block_overflows_even_an_empty_frame() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(20.0);
        assert!(matches!(
            frame.add(Box::new(Spacer::new(500.0)), &mut canvas),
            AddResult::Overflow(_)
        ));
        assert!(frame.is_empty());
        assert!(canvas.is_current_empty());
    }

    #[test]
    fn avoid_block_taller_than_the_frame_is_broken_on_an_empty_frame() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(30.0);
        let block = Paragraph::new("one\ntwo\nthree").with_pagination(Pagination {
            break_inside: BreakInside::Avoid,
        });
        assert!(matches!(
            frame.add(Box::new(block), &mut canvas),
            AddResult::Split(_)
        ));
        assert!(frame.remaining_height() < Pt::from_f32(30.0));
    }
}
