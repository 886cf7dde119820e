//! # PDF Serializer
//!
//! Writes laid-out pages as a PDF 1.7 file.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- byte offset of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Both fonts are embedded whole as CIDFontType2 with Identity-H encoding, so
//! each line is written as a hex string of two-byte glyph ids. Each font
//! produces five objects: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap
//! and the Type0 dictionary pages refer to. The `/W` array and the CMap only
//! list glyphs that actually appear in the document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::{FontResource, FontSet, TextStyle};
use crate::layout::{LaidOutDocument, LayoutPage};
use crate::render::TextLine;

const PRODUCER: &str = concat!("answersheet ", env!("CARGO_PKG_VERSION"));

/// Document information written to the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct PdfWriter;

struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    /// Reserve the next object number.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, content: &[u8], extra: &str) -> usize {
        let compressed = compress_to_vec_zlib(content, 6);
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} /Filter /FlateDecode >>\nstream\n",
            compressed.len(),
            extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

/// The embedded form of one font: its resource name and the characters it
/// has to cover.
struct EmbeddedFont<'a> {
    resource_name: &'static str,
    font: &'a FontResource,
    used: BTreeSet<char>,
    type0_id: usize,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, document: &LaidOutDocument, fonts: &FontSet, metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
        };

        // Object 0 is the free-list head, 1 the catalog, 2 the page tree.
        builder.reserve();
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        let mut embedded = [
            EmbeddedFont {
                resource_name: "F0",
                font: fonts.bold(),
                used: BTreeSet::new(),
                type0_id: 0,
            },
            EmbeddedFont {
                resource_name: "F1",
                font: fonts.regular(),
                used: BTreeSet::new(),
                type0_id: 0,
            },
        ];
        for line in document.lines() {
            embedded[font_slot(line.style)].used.extend(line.text.chars());
        }
        for font in embedded.iter_mut().filter(|f| !f.used.is_empty()) {
            font.type0_id = Self::write_font_objects(&mut builder, font.font, &font.used);
        }

        let font_resources: String = embedded
            .iter()
            .filter(|f| f.type0_id != 0)
            .map(|f| format!("/{} {} 0 R", f.resource_name, f.type0_id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_ids = Vec::with_capacity(document.page_count());
        for page in document.pages() {
            let content = Self::build_content_stream(page, fonts);
            let content_id = builder.push_stream(content.as_bytes(), "");

            let mb = page.media_box;
            let page_dict = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [{} {} {} {}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                pages_id,
                number(mb.llx),
                number(mb.lly),
                number(mb.urx),
                number(mb.ury),
                content_id,
                font_resources
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[catalog_id] = format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();

        let kids: String = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[pages_id] =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes();

        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title {} ", text_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author {} ", text_string(author));
        }
        let _ = write!(info, "/Producer {} >>", text_string(PRODUCER));
        let info_id = builder.push(info.into_bytes());

        Self::serialize(&builder, catalog_id, info_id)
    }

    fn build_content_stream(page: &LayoutPage, fonts: &FontSet) -> String {
        let mut stream = String::new();
        for line in &page.lines {
            Self::write_line(&mut stream, line, fonts.get(line.style));
        }
        stream
    }

    fn write_line(stream: &mut String, line: &TextLine, font: &FontResource) {
        let resource_name = match line.style {
            TextStyle::Bold => "F0",
            TextStyle::Regular => "F1",
        };

        let mut hex = String::with_capacity(line.text.len() * 4);
        for ch in line.text.chars() {
            let gid = font.glyph_id(ch).unwrap_or(0);
            let _ = write!(hex, "{:04X}", gid);
        }

        let _ = writeln!(
            stream,
            "BT /{} {} Tf {} {} Td <{}> Tj ET",
            resource_name,
            number(line.font_size),
            number(line.x),
            number(line.y),
            hex
        );
    }

    /// Write the five objects of an embedded font. Returns the Type0 object id.
    fn write_font_objects(builder: &mut PdfBuilder, font: &FontResource, used: &BTreeSet<char>) -> usize {
        let metrics = font.metrics();
        let scale = 1000.0 / metrics.units_per_em as f64;
        let name = font.name();

        // Several characters may share a glyph; the lowest code point names it.
        let mut gid_to_char: BTreeMap<u16, char> = BTreeMap::new();
        for &ch in used {
            if let Some(gid) = font.glyph_id(ch) {
                gid_to_char.entry(gid).or_insert(ch);
            }
        }

        let fontfile_id = builder.push_stream(font.data(), &format!(" /Length1 {}", font.data().len()));

        let (x_min, y_min, x_max, y_max) = metrics.bbox;
        let stem_v = if name.contains("Bold") { 120 } else { 80 };
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            name,
            (x_min as f64 * scale) as i32,
            (y_min as f64 * scale) as i32,
            (x_max as f64 * scale) as i32,
            (y_max as f64 * scale) as i32,
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            (metrics.cap_height as f64 * scale) as i32,
            stem_v,
            fontfile_id
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        let mut widths = String::from("[");
        for &gid in gid_to_char.keys() {
            let _ = write!(widths, " {} [{}]", gid, (font.advance(gid) as f64 * scale) as u32);
        }
        widths.push_str(" ]");

        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            name,
            descriptor_id,
            (metrics.default_advance as f64 * scale) as u32,
            widths
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        let cmap = build_to_unicode_cmap(&gid_to_char, name);
        let to_unicode_id = builder.push_stream(cmap.as_bytes(), "");

        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            name, cidfont_id, to_unicode_id
        );
        let type0_id = builder.push(type0.into_bytes());

        log::debug!(
            "embedded font {} ({} bytes, {} glyphs used)",
            name,
            font.data().len(),
            gid_to_char.len()
        );
        type0_id
    }

    fn serialize(builder: &PdfBuilder, catalog_id: usize, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            catalog_id,
            info_id,
            xref_offset
        );

        output
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn font_slot(style: TextStyle) -> usize {
    match style {
        TextStyle::Bold => 0,
        TextStyle::Regular => 1,
    }
}

/// Build a ToUnicode CMap mapping glyph ids back to characters.
fn build_to_unicode_cmap(gid_to_char: &BTreeMap<u16, char>, font_name: &str) -> String {
    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo\n");
    cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let entries: Vec<(&u16, &char)> = gid_to_char.iter().collect();
    // At most 100 entries per bfchar block.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\nend\n");
    cmap
}

/// Encode an Info dictionary string: a literal for ASCII, UTF-16BE hex with
/// a byte order mark otherwise.
fn text_string(s: &str) -> String {
    if s.is_ascii() {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        format!("({})", escaped)
    } else {
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, LayoutEngine};
    use crate::model::Document;
    use crate::resource::Resources;

    fn render(json: &str, metadata: &Metadata) -> Vec<u8> {
        let resources = Resources::bundled().unwrap();
        let document = Document::from_json_str(json).unwrap();
        let laid_out = LayoutEngine::new(resources, LayoutConfig::default())
            .layout(&document)
            .unwrap();
        PdfWriter::new().write(&laid_out, resources.fonts(), metadata)
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn empty_document_is_a_valid_one_page_pdf() {
        let bytes = render("{}", &Metadata::default());
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(contains(&bytes, "%%EOF"));
        assert!(contains(&bytes, "xref"));
        assert!(contains(&bytes, "/Count 1"));
        assert!(!contains(&bytes, "/FontFile2"));
    }

    #[test]
    fn both_fonts_are_embedded_as_type0() {
        let bytes = render(r#"{"First Name":"Samba"}"#, &Metadata::default());
        assert!(contains(&bytes, "/BaseFont /DejaVuSans-Bold"));
        assert!(contains(&bytes, "/BaseFont /DejaVuSans "));
        assert!(contains(&bytes, "/Subtype /CIDFontType2"));
        assert!(contains(&bytes, "/Encoding /Identity-H"));
        assert!(contains(&bytes, "/F0 "));
        assert!(contains(&bytes, "/F1 "));
    }

    #[test]
    fn media_box_comes_from_template() {
        let bytes = render(r#"{"A":"b"}"#, &Metadata::default());
        assert!(contains(&bytes, "/MediaBox [0 0 595.28 841.89]"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = render(r#"{"A":"b"}"#, &Metadata::default());
        let text = String::from_utf8_lossy(&bytes);
        let xref = text.rfind("xref\n").unwrap();
        let entries: Vec<&str> = text[xref..].lines().skip(3).take_while(|l| l.ends_with(" n ")).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn metadata_is_written() {
        let metadata = Metadata {
            title: Some("Intake (draft)".to_string()),
            author: Some("Zoë".to_string()),
        };
        let bytes = render("{}", &metadata);
        assert!(contains(&bytes, "/Title (Intake \\(draft\\))"));
        assert!(contains(&bytes, "/Author <FEFF005A006F00EB>"));
        assert!(contains(&bytes, "/Producer (answersheet "));
    }

    #[test]
    fn cmap_maps_glyphs_to_utf16() {
        let mut map = BTreeMap::new();
        map.insert(36u16, 'A');
        map.insert(300u16, 'Ā');
        let cmap = build_to_unicode_cmap(&map, "Test");
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<012C> <0100>"));
        assert!(cmap.contains("/CMapName /Test-UTF16 def"));
    }

    #[test]
    fn cmap_splits_into_blocks_of_one_hundred() {
        let map: BTreeMap<u16, char> = (0..150u16)
            .map(|i| (i + 1, char::from_u32(0x41 + i as u32).unwrap()))
            .collect();
        let cmap = build_to_unicode_cmap(&map, "Test");
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(number(72.0), "72");
        assert_eq!(number(769.89), "769.89");
        assert_eq!(number(10.5), "10.5");
        assert_eq!(number(-0.001), "0");
    }
}
