//! # answersheet
//!
//! Renders arbitrary JSON documents as paginated question/answer PDFs.
//!
//! Every field name in the input becomes a bold question line and every text
//! value a plain answer line beneath it. Nested objects are walked in place
//! and arrays contribute their elements in order. Lines are written onto the
//! pages of a fixed template, one page after another, and template pages the
//! document never reached are trimmed from the end.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]     ordered fields, duplicates kept
//!       ↓
//!   [layout]    cursor + page store, page break policy
//!       ↓        ↑ [resource]: template, bold and regular fonts
//!   [render]    text lines per page
//!       ↓
//!   [pdf]       serialize to PDF bytes
//! ```
//!
//! ```no_run
//! let pdf = answersheet::render_json(r#"{"First Name": "Samba"}"#)?;
//! std::fs::write("answers.pdf", pdf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod resource;
pub mod template;

pub use error::{GenerationError, Result};
pub use layout::{LaidOutDocument, LayoutConfig, LayoutEngine};
pub use model::{Document, Field, Value, ValueKind};
pub use pdf::{Metadata, PdfWriter};
pub use resource::{ResourcePaths, Resources};

/// Lay out a document on the bundled template and fonts.
pub fn generate(document: &Document) -> Result<LaidOutDocument> {
    generate_with(document, Resources::bundled()?, &LayoutConfig::default())
}

/// Lay out a document with explicit resources and type sizes.
pub fn generate_with(
    document: &Document,
    resources: &Resources,
    config: &LayoutConfig,
) -> Result<LaidOutDocument> {
    LayoutEngine::new(resources, *config).layout(document)
}

/// Render a document to PDF bytes with the bundled resources.
pub fn generate_pdf(document: &Document) -> Result<Vec<u8>> {
    let resources = Resources::bundled()?;
    let laid_out = generate_with(document, resources, &LayoutConfig::default())?;
    Ok(PdfWriter::new().write(&laid_out, resources.fonts(), &Metadata::default()))
}

/// Render a document described as JSON to PDF bytes.
///
/// Malformed JSON fails with [`GenerationError::InvalidJson`]; a root that is
/// not an object fails with [`GenerationError::UnsupportedValueKind`].
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let document = Document::from_json_str(json)?;
    generate_pdf(&document)
}
