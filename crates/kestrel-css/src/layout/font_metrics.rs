//! Text measurement.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."

use crate::style::{ComputedStyle, FontWeight};

/// Measures text for the line breaker.
///
/// Implementors only need [`FontMetrics::width`]; the default
/// [`FontMetrics::split_position`] measures one character at a time.
pub trait FontMetrics {
    /// Advance width of `text` in px when drawn in `style`.
    fn width(&self, style: &ComputedStyle, text: &str) -> f32;

    /// Find where to break `text` so that the head fits in `available` px.
    ///
    /// Returns the byte offset of the last space before the edge and the
    /// width of the text before it. If the whole text fits, the offset is
    /// `text.len()`; if no space comes before the edge, it is 0.
    fn split_position(&self, style: &ComputedStyle, text: &str, available: f32) -> (usize, f32) {
        let mut buf = [0_u8; 4];
        let mut width = 0.0;
        let mut split = (0, 0.0);
        for (index, c) in text.char_indices() {
            if c == ' ' {
                split = (index, width);
            }
            width += self.width(style, c.encode_utf8(&mut buf));
            if width > available {
                return split;
            }
        }
        (text.len(), width)
    }
}

/// Fixed-ratio metrics for when no font is loaded.
///
/// The average advance of Latin glyphs in a proportional face is roughly
/// 0.6 of the font size; bold faces are a little wider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl ApproximateFontMetrics {
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const BOLD_CHAR_WIDTH_RATIO: f32 = 0.65;
}

impl FontMetrics for ApproximateFontMetrics {
    #[allow(clippy::cast_precision_loss)]
    fn width(&self, style: &ComputedStyle, text: &str) -> f32 {
        let ratio = match style.font_weight {
            FontWeight::Normal => Self::CHAR_WIDTH_RATIO,
            FontWeight::Bold => Self::BOLD_CHAR_WIDTH_RATIO,
        };
        let advance = style.font_size * ratio;
        text.chars().count() as f32 * advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_px() -> ComputedStyle {
        ComputedStyle {
            font_size: 10.0,
            ..ComputedStyle::base()
        }
    }

    #[test]
    fn test_approximate_width() {
        let style = ten_px();
        assert!((ApproximateFontMetrics.width(&style, "abcd") - 24.0).abs() < 1e-4);
        let bold = ComputedStyle {
            font_weight: FontWeight::Bold,
            ..style
        };
        assert!((ApproximateFontMetrics.width(&bold, "abcd") - 26.0).abs() < 1e-4);
    }

    #[test]
    fn test_split_at_last_space_before_edge() {
        let style = ten_px();
        // Each char is 6px; "hello world foo" is 90px.
        let (offset, width) = ApproximateFontMetrics.split_position(&style, "hello world foo", 60.0);
        assert_eq!(offset, 5);
        assert!((width - 30.0).abs() < 1e-4);

        let (offset, _) = ApproximateFontMetrics.split_position(&style, "hello world foo", 1000.0);
        assert_eq!(offset, 15);

        let (offset, _) = ApproximateFontMetrics.split_position(&style, "unbreakable", 20.0);
        assert_eq!(offset, 0);
    }
}
