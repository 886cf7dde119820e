//! # Question/Answer Layout
//!
//! Turns a [`Document`] into pages of text lines.
//!
//! Every field name becomes a bold question line and every text value a plain
//! answer line beneath it. Mappings are walked in place, so nested field names
//! show up as questions right after their parent. List elements follow the
//! list's own question without headings of their own.
//!
//! The layout never measures ahead. It writes one line at a time onto the
//! current template page and asks the [`cursor`] rules whether the page is
//! used up:
//!
//! 1. A question needs room for itself and one more line, otherwise it moves
//!    to the next page so it is never stranded at the bottom.
//! 2. An answer is always drawn where the cursor is. If that leaves the cursor
//!    below the bottom margin, the break is recorded but not taken.
//! 3. The recorded break is taken by the next line, whatever it is. When no
//!    line follows, no page is spent on it.
//!
//! Template pages that were never reached are trimmed from the end when the
//! pass completes.

pub mod cursor;
pub mod page_store;

use serde::Deserialize;

use crate::error::{GenerationError, Result};
use crate::model::{Document, Field, Value};
use crate::render::{TextLine, TextRenderer};
use crate::resource::Resources;
use crate::template::Template;

use cursor::{BreakDecision, Cursor};
pub use page_store::LayoutPage;
use page_store::PageStore;

/// Nesting has no depth limit; the walk moves onto a fresh stack segment
/// when less than this much stack is left.
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// Type sizes for question and answer lines.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Font size in points, shared by both fonts.
    pub font_size: f64,
    /// Vertical distance between consecutive lines in points.
    pub line_height: f64,
}

impl LayoutConfig {
    /// Check that lines of this size can be placed on every template page:
    /// a fresh page must hold at least a question and the line after it.
    pub fn validate(&self, template: &Template) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(GenerationError::InvalidLayout {
                reason: format!("font size must be a positive number, got {}", self.font_size),
            });
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(GenerationError::InvalidLayout {
                reason: format!("line height must be a positive number, got {}", self.line_height),
            });
        }

        for (index, page) in template.pages().iter().enumerate() {
            let bounds = page.content_bounds(template.margin());
            if bounds.top - self.line_height < bounds.bottom {
                return Err(GenerationError::InvalidLayout {
                    reason: format!(
                        "page {} has {:.2} pt between its margins, a line needs {} pt",
                        index + 1,
                        bounds.top - bounds.bottom,
                        self.line_height
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            line_height: 20.0,
        }
    }
}

/// The finished pages of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pages: Vec<LayoutPage>,
}

impl LaidOutDocument {
    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every line in draw order, across all pages.
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    /// The text of every line in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.lines().map(|line| line.text.as_str()).collect()
    }

    pub fn page_lines(&self, index: usize) -> Option<&[TextLine]> {
        self.pages.get(index).map(|page| page.lines.as_slice())
    }
}

pub struct LayoutEngine<'r> {
    resources: &'r Resources,
    config: LayoutConfig,
}

impl<'r> LayoutEngine<'r> {
    pub fn new(resources: &'r Resources, config: LayoutConfig) -> Self {
        Self { resources, config }
    }

    pub fn layout(&self, document: &Document) -> Result<LaidOutDocument> {
        self.config.validate(self.resources.template())?;

        let store = PageStore::new(
            self.resources.template(),
            self.resources.fonts(),
            self.config.font_size,
        );
        let cursor = Cursor::new(0, store.bounds(0));
        let mut pass = LayoutPass {
            store,
            cursor,
            line_height: self.config.line_height,
        };

        pass.fields(&document.fields, "$")?;

        let pages = pass.store.finish();
        log::info!(
            "laid out {} line(s) on {} page(s)",
            pages.iter().map(|page| page.lines.len()).sum::<usize>(),
            pages.len()
        );
        Ok(LaidOutDocument { pages })
    }
}

/// State for a single walk over a document.
struct LayoutPass<'r> {
    store: PageStore<'r>,
    cursor: Cursor,
    line_height: f64,
}

impl LayoutPass<'_> {
    fn fields(&mut self, fields: &[Field], path: &str) -> Result<()> {
        for field in fields {
            let path = field_path(path, &field.key);
            self.question(&field.key)?;
            self.value(&field.value, &path)?;
        }
        Ok(())
    }

    fn value(&mut self, value: &Value, path: &str) -> Result<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.walk(value, path))
    }

    fn walk(&mut self, value: &Value, path: &str) -> Result<()> {
        match value {
            Value::Text(text) => self.answer(text),
            Value::Mapping(fields) => self.fields(fields, path),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.value(item, &format!("{path}[{index}]"))?;
                }
                Ok(())
            }
            Value::Unsupported(kind) => {
                log::error!("unsupported {kind} value at {path}");
                Err(GenerationError::UnsupportedValueKind {
                    kind: *kind,
                    path: path.to_string(),
                })
            }
        }
    }

    fn question(&mut self, text: &str) -> Result<()> {
        if cursor::before_question(&self.cursor, self.line_height) == BreakDecision::NewPage {
            self.break_page()?;
        }
        self.store.draw_bold(text, self.cursor.left, self.cursor.y)?;
        self.cursor.feed(self.line_height);
        Ok(())
    }

    fn answer(&mut self, text: &str) -> Result<()> {
        if cursor::before_answer(&self.cursor) == BreakDecision::NewPage {
            self.break_page()?;
        }
        self.store.draw_plain(text, self.cursor.left, self.cursor.y)?;
        self.cursor.feed(self.line_height);
        self.cursor.feed(self.line_height);

        if cursor::after_answer(&self.cursor) == BreakDecision::Deferred {
            log::debug!(
                "page {} full at y={:.2}, break deferred",
                self.cursor.page_index + 1,
                self.cursor.y
            );
            self.cursor.break_pending = true;
        }
        Ok(())
    }

    fn break_page(&mut self) -> Result<()> {
        let next = self.store.advance()?;
        log::debug!("page break: {} -> {}", next, next + 1);
        self.cursor.reset(next, self.store.bounds(next));
        Ok(())
    }
}

/// Extend a JSON path with an object key, quoting keys that are not plain
/// identifiers.
fn field_path(parent: &str, key: &str) -> String {
    let mut chars = key.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        format!("{parent}.{key}")
    } else {
        let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{parent}[\"{escaped}\"]")
    }
}
