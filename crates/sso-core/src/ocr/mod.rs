//! OCR fallback for scanned reports.

#[cfg(feature = "native")]
mod pure_engine;
mod worker;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
pub use worker::{ImageRecognizer, OcrWorker};

use serde::{Deserialize, Serialize};

/// A recognized text region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Row height, in pixels, within which boxes count as one line.
const ROW_BAND: f32 = 20.0;

/// Sort boxes top-to-bottom, then left-to-right within a row band.
pub fn sort_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();
        let row_a = (ay / ROW_BAND) as i32;
        let row_b = (by / ROW_BAND) as i32;
        row_a
            .cmp(&row_b)
            .then(ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// Join sorted boxes into text, one line per row band.
pub fn boxes_to_text(boxes: &[TextBox]) -> String {
    let mut out = String::new();
    let mut current_row: Option<i32> = None;
    for b in boxes {
        let text = b.text.trim();
        if text.is_empty() {
            continue;
        }
        let (_, y, _, _) = b.rect();
        let row = (y / ROW_BAND) as i32;
        match current_row {
            Some(r) if r == row => out.push(' '),
            Some(_) => out.push('\n'),
            None => {}
        }
        out.push_str(text);
        current_row = Some(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order_and_rows() {
        let mut boxes = vec![
            text_box(300.0, 42.0, "SSO-20417"),
            text_box(10.0, 5.0, "Permit Number"),
            text_box(10.0, 41.0, "Assigned SSO ID"),
            text_box(200.0, 3.0, "AL0049859"),
        ];
        sort_reading_order(&mut boxes);
        assert_eq!(
            boxes_to_text(&boxes),
            "Permit Number AL0049859\nAssigned SSO ID SSO-20417"
        );
    }

    #[test]
    fn test_rect() {
        let b = text_box(10.0, 20.0, "x");
        assert_eq!(b.rect(), (10.0, 20.0, 60.0, 30.0));
    }
}
