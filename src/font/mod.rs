//! # Font Resources
//!
//! Parsing TrueType fonts and answering the two questions the rest of the
//! generator asks: which glyph draws this character, and how wide is it.
//!
//! Exactly two fonts take part in a generation: a bold one for question lines
//! and a regular one for answer lines. Both are embedded in the output PDF as
//! CIDFontType2 fonts, so any character they cover can be drawn.

use std::collections::HashMap;

use crate::error::{GenerationError, Result};

/// Which of the two fonts a line is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    /// Question lines.
    Bold,
    /// Answer lines.
    Regular,
}

/// Metrics and glyph mapping extracted from a TrueType file with ttf-parser.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// Font bounding box in font units: (x_min, y_min, x_max, y_max).
    pub bbox: (i16, i16, i16, i16),
    /// Advance width of glyph 0, used as the default CID width.
    pub default_advance: u16,
    glyph_ids: HashMap<char, u16>,
    advances: HashMap<u16, u16>,
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face) -> Self {
        let mut glyph_ids = HashMap::new();
        let mut advances = HashMap::new();

        let mut codepoints = Vec::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if subtable.is_unicode() {
                    subtable.codepoints(|code| codepoints.push(code));
                }
            }
        }

        for code in codepoints {
            let Some(ch) = char::from_u32(code).filter(|ch| !ch.is_control()) else {
                continue;
            };
            if let Some(gid) = face.glyph_index(ch) {
                if gid.0 == 0 {
                    continue;
                }
                glyph_ids.insert(ch, gid.0);
                advances
                    .entry(gid.0)
                    .or_insert_with(|| face.glyph_hor_advance(gid).unwrap_or(0));
            }
        }

        let bbox = face.global_bounding_box();
        Self {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or(face.ascender()),
            bbox: (bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max),
            default_advance: face
                .glyph_hor_advance(ttf_parser::GlyphId(0))
                .unwrap_or(face.units_per_em() / 2),
            glyph_ids,
            advances,
        }
    }
}

/// A parsed TrueType font, ready for glyph lookup and embedding.
#[derive(Debug, Clone)]
pub struct FontResource {
    name: String,
    data: Vec<u8>,
    metrics: FontMetrics,
}

impl FontResource {
    /// Parse TrueType data. `label` names the resource in errors and is the
    /// fallback PDF font name when the font has no PostScript name.
    pub fn from_bytes(label: &str, data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| GenerationError::resource(label, format!("not a usable TrueType font: {e}")))?;

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string());
        let name = sanitize_font_name(postscript_name.as_deref().unwrap_or(label));
        let metrics = FontMetrics::from_face(&face);

        Ok(Self {
            name,
            data,
            metrics,
        })
    }

    /// The PDF-safe name of this font.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw TrueType bytes, embedded verbatim in the PDF.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.metrics.glyph_ids.get(&ch).copied()
    }

    /// Advance width of a glyph in font units.
    pub fn advance(&self, gid: u16) -> u16 {
        self.metrics
            .advances
            .get(&gid)
            .copied()
            .unwrap_or(self.metrics.default_advance)
    }

    /// Fail on the first character this font cannot draw.
    pub fn check_coverage(&self, text: &str) -> Result<()> {
        match text.chars().find(|&ch| self.glyph_id(ch).is_none()) {
            Some(ch) => Err(GenerationError::UnsupportedGlyph {
                ch,
                font: self.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Width of a string in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text
            .chars()
            .map(|ch| {
                let gid = self.glyph_id(ch).unwrap_or(0);
                self.advance(gid) as u32
            })
            .sum();
        units as f64 / self.metrics.units_per_em as f64 * font_size
    }
}

/// The bold/regular pair used by a generation.
#[derive(Debug, Clone)]
pub struct FontSet {
    bold: FontResource,
    regular: FontResource,
}

impl FontSet {
    pub fn new(bold: FontResource, regular: FontResource) -> Self {
        Self { bold, regular }
    }

    pub fn get(&self, style: TextStyle) -> &FontResource {
        match style {
            TextStyle::Bold => &self.bold,
            TextStyle::Regular => &self.regular,
        }
    }

    pub fn bold(&self) -> &FontResource {
        &self.bold
    }

    pub fn regular(&self) -> &FontResource {
        &self.regular
    }
}

/// Strip a font name down to characters that are valid in a PDF name object.
fn sanitize_font_name(name: &str) -> String {
    let name: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if name.is_empty() {
        "CustomFont".to_string()
    } else {
        name
    }
}
