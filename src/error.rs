//! Structured error types for answer sheet generation.
//!
//! Every variant is fatal: a generation that hits one of these is abandoned
//! as a whole and no partially laid-out document is handed back.

use thiserror::Error;

use crate::model::ValueKind;

/// The unified error type returned by all public generation functions.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The raw input was not well-formed JSON.
    #[error("failed to parse document: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    /// The document contains a leaf that cannot be drawn as text.
    #[error("value of kind {kind} at {path} is not supported, only text, objects and arrays can be rendered")]
    UnsupportedValueKind { kind: ValueKind, path: String },

    /// More pages were needed than the template provides.
    #[error("template exhausted: all {available} template pages are already in use")]
    TemplateExhausted { available: usize },

    /// The chosen font has no glyph for a character in the text.
    #[error("font '{font}' has no glyph for {ch:?} ({})", code_point(.ch))]
    UnsupportedGlyph { ch: char, font: String },

    /// The type sizes cannot be laid out on the template's pages.
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: String },

    /// A template or font resource could not be loaded at startup.
    #[error("failed to load {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },
}

impl GenerationError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the generator or its resources.
    ///
    /// A service wrapping the generator maps client errors to a 4xx status
    /// and everything else to a 5xx status.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidJson { .. } | GenerationError::UnsupportedValueKind { .. }
        )
    }

    pub(crate) fn resource(resource: impl Into<String>, reason: impl ToString) -> Self {
        GenerationError::ResourceLoad {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

fn code_point(ch: &char) -> String {
    format!("U+{:04X}", *ch as u32)
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
