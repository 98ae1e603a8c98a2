use crate::types::Pt;

pub(crate) const HELVETICA: &str = "Helvetica";
pub(crate) const HELVETICA_BOLD: &str = "Helvetica-Bold";

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 126;

// Advance widths (1/1000 em) for WinAnsi codes 32..=126, from the Adobe
// base-14 AFM files.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48..63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80..95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96..111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112..126
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48..63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80..95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96..111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112..126
];

/// Width used for characters outside the table (Latin-1 and the rest). Real
/// glyphs there are close to the digit width, which keeps wrapping
/// conservative without shipping the full AFM.
const MISSING_WIDTH: u16 = 556;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FontMetrics {
    widths: &'static [u16; 95],
    missing_width: u16,
}

impl FontMetrics {
    pub(crate) fn for_name(name: &str) -> Self {
        let widths = if name == HELVETICA_BOLD {
            &HELVETICA_BOLD_WIDTHS
        } else {
            &HELVETICA_WIDTHS
        };
        Self {
            widths,
            missing_width: MISSING_WIDTH,
        }
    }

    fn char_width_units(&self, ch: char) -> u16 {
        let code = ch as u32;
        if code >= FIRST_CHAR as u32 && code <= LAST_CHAR as u32 {
            self.widths[(code - FIRST_CHAR as u32) as usize]
        } else {
            self.missing_width
        }
    }

    pub(crate) fn measure_text_width(&self, font_size: Pt, text: &str) -> Pt {
        let units: i64 = text
            .chars()
            .map(|ch| self.char_width_units(ch) as i64)
            .sum();
        let milli = font_size.to_milli_i64() as i128 * units as i128;
        Pt::from_milli_i64((milli / 1000) as i64)
    }

    pub(crate) fn char_width(&self, font_size: Pt, ch: char) -> Pt {
        font_size.mul_ratio(self.char_width_units(ch) as i32, 1000)
    }
}

pub(crate) fn is_base14_font(name: &str) -> bool {
    matches!(name, HELVETICA | HELVETICA_BOLD)
}
