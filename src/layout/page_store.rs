//! The pages of one generation.
//!
//! Every template page is cloned up front into an indexable sequence. The
//! layout pass writes only to the current page; advancing seals it. When
//! layout is done, pages past the last one written are dropped from the end.

use crate::error::{GenerationError, Result};
use crate::font::{FontSet, TextStyle};
use crate::render::{TextLine, TextRenderer};
use crate::template::{ContentBounds, MediaBox, Template, TemplatePage};

/// A page with the lines drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    pub media_box: MediaBox,
    pub lines: Vec<TextLine>,
    /// No more lines may be drawn on a sealed page.
    pub sealed: bool,
}

pub struct PageStore<'r> {
    pages: Vec<LayoutPage>,
    current: usize,
    margin: f64,
    font_size: f64,
    fonts: &'r FontSet,
}

impl<'r> PageStore<'r> {
    pub fn new(template: &Template, fonts: &'r FontSet, font_size: f64) -> Self {
        let pages = template
            .pages()
            .iter()
            .map(|page| LayoutPage {
                media_box: page.media_box,
                lines: Vec::new(),
                sealed: false,
            })
            .collect();

        Self {
            pages,
            current: 0,
            margin: template.margin(),
            font_size,
            fonts,
        }
    }

    /// Usable area of a page.
    pub fn bounds(&self, index: usize) -> ContentBounds {
        TemplatePage {
            media_box: self.pages[index].media_box,
        }
        .content_bounds(self.margin)
    }

    /// Seal the current page and move to the next one. Returns the new index.
    pub fn advance(&mut self) -> Result<usize> {
        let next = self.current + 1;
        if next >= self.pages.len() {
            return Err(GenerationError::TemplateExhausted {
                available: self.pages.len(),
            });
        }

        self.pages[self.current].sealed = true;
        self.current = next;
        Ok(next)
    }

    /// Drop every page after the current one and hand back the rest.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        let used = self.current + 1;
        while self.pages.len() > used {
            self.pages.pop();
        }
        log::debug!("kept {} page(s), trimmed the rest of the template", used);

        if let Some(last) = self.pages.last_mut() {
            last.sealed = true;
        }
        self.pages
    }
}

impl TextRenderer for PageStore<'_> {
    fn draw_text(&mut self, style: TextStyle, text: &str, x: f64, y: f64) -> Result<()> {
        let font = self.fonts.get(style);
        font.check_coverage(text)?;

        let page = &mut self.pages[self.current];
        debug_assert!(!page.sealed, "drawing on a sealed page");
        page.lines.push(TextLine {
            style,
            text: text.to_string(),
            x,
            y,
            font_size: self.font_size,
            width: font.measure(text, self.font_size),
        });
        Ok(())
    }
}
