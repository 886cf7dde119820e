//! The text drawing boundary between layout and the page canvas.
//!
//! Layout only ever asks for one thing: put this string, in bold or regular,
//! with its baseline starting at (x, y). Implementations decide what a page
//! is; the page store records lines for the PDF serializer.

use crate::error::Result;
use crate::font::TextStyle;

/// One line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub style: TextStyle,
    pub text: String,
    /// Baseline origin in PDF user space (origin bottom-left).
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    /// Advance width of the whole line in points.
    pub width: f64,
}

pub trait TextRenderer {
    /// Draw one line with the given font.
    fn draw_text(&mut self, style: TextStyle, text: &str, x: f64, y: f64) -> Result<()>;

    /// Draw a question line.
    fn draw_bold(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        self.draw_text(TextStyle::Bold, text, x, y)
    }

    /// Draw an answer line.
    fn draw_plain(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        self.draw_text(TextStyle::Regular, text, x, y)
    }
}
