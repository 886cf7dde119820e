//! Page templates.
//!
//! A template is the fixed, multi-page canvas a generation writes onto. It
//! defines the geometry of every page it can hand out: the media box and the
//! margin inside which text is placed. It is described by a small JSON file:
//!
//! ```json
//! { "pageSize": "A4", "margin": 72, "pageCount": 50 }
//! ```
//!
//! or, for templates whose pages differ, by an explicit list of media boxes:
//!
//! ```json
//! { "margin": 36, "pages": [ { "mediaBox": [0, 0, 612, 792] } ] }
//! ```

use serde::Deserialize;

use crate::error::{GenerationError, Result};

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// A page rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl MediaBox {
    pub fn from_size(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            llx: 0.0,
            lly: 0.0,
            urx: width,
            ury: height,
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// On-disk description of a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateSpec {
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_page_count")]
    pub page_count: usize,
    /// Explicit pages. When present, `pageSize` and `pageCount` are ignored.
    #[serde(default)]
    pub pages: Vec<PageSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub media_box: [f64; 4],
}

fn default_margin() -> f64 {
    72.0
}

fn default_page_count() -> usize {
    50
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: default_margin(),
            page_count: default_page_count(),
            pages: Vec::new(),
        }
    }
}

/// One blank page of the template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplatePage {
    pub media_box: MediaBox,
}

/// The usable area of a page once the margin is taken off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBounds {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl TemplatePage {
    pub fn content_bounds(&self, margin: f64) -> ContentBounds {
        ContentBounds {
            left: self.media_box.llx + margin,
            top: self.media_box.ury - margin,
            bottom: self.media_box.lly + margin,
        }
    }
}

/// A loaded, validated template. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pages: Vec<TemplatePage>,
    margin: f64,
}

impl Template {
    /// A template of `page_count` identical pages.
    pub fn uniform(size: PageSize, margin: f64, page_count: usize) -> Result<Self> {
        Self::from_spec(TemplateSpec {
            page_size: size,
            margin,
            page_count,
            pages: Vec::new(),
        })
    }

    pub fn from_spec(spec: TemplateSpec) -> Result<Self> {
        if !spec.margin.is_finite() || spec.margin < 0.0 {
            return Err(GenerationError::resource(
                "template",
                format!("margin must be a non-negative number, got {}", spec.margin),
            ));
        }

        let pages: Vec<TemplatePage> = if spec.pages.is_empty() {
            let media_box = MediaBox::from_size(spec.page_size);
            vec![TemplatePage { media_box }; spec.page_count]
        } else {
            spec.pages
                .iter()
                .map(|p| {
                    let [llx, lly, urx, ury] = p.media_box;
                    TemplatePage {
                        media_box: MediaBox { llx, lly, urx, ury },
                    }
                })
                .collect()
        };

        if pages.is_empty() {
            return Err(GenerationError::resource(
                "template",
                "template must provide at least one page",
            ));
        }

        for (index, page) in pages.iter().enumerate() {
            let mb = page.media_box;
            if !(mb.width() > 0.0 && mb.height() > 0.0) {
                return Err(GenerationError::resource(
                    "template",
                    format!("page {} has an empty media box", index + 1),
                ));
            }
            if mb.width() <= 2.0 * spec.margin || mb.height() <= 2.0 * spec.margin {
                return Err(GenerationError::resource(
                    "template",
                    format!(
                        "a {} pt margin leaves no usable area on page {} ({} x {} pt)",
                        spec.margin,
                        index + 1,
                        mb.width(),
                        mb.height()
                    ),
                ));
            }
        }

        Ok(Self {
            pages,
            margin: spec.margin,
        })
    }

    /// Parse a JSON template descriptor.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let spec: TemplateSpec = serde_json::from_slice(data)
            .map_err(|e| GenerationError::resource("template", e))?;
        Self::from_spec(spec)
    }

    pub fn pages(&self) -> &[TemplatePage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uniform_descriptor() {
        let t = Template::from_json(br#"{"pageSize":"Letter","margin":36,"pageCount":3}"#).unwrap();
        assert_eq!(t.page_count(), 3);
        assert_eq!(t.margin(), 36.0);
        let bounds = t.pages()[0].content_bounds(t.margin());
        assert_eq!(bounds.left, 36.0);
        assert_eq!(bounds.top, 792.0 - 36.0);
        assert_eq!(bounds.bottom, 36.0);
    }

    #[test]
    fn defaults_match_a4_with_one_inch_margin() {
        let t = Template::from_json(b"{}").unwrap();
        assert_eq!(t.page_count(), 50);
        assert_eq!(t.margin(), 72.0);
        assert_eq!(t.pages()[0].media_box, MediaBox::from_size(PageSize::A4));
    }

    #[test]
    fn explicit_pages_keep_their_origin() {
        let t = Template::from_json(
            br#"{"margin":10,"pages":[{"mediaBox":[20,30,220,330]},{"mediaBox":[0,0,100,100]}]}"#,
        )
        .unwrap();
        assert_eq!(t.page_count(), 2);
        let bounds = t.pages()[0].content_bounds(t.margin());
        assert_eq!(bounds.left, 30.0);
        assert_eq!(bounds.top, 320.0);
        assert_eq!(bounds.bottom, 40.0);
    }

    #[test]
    fn custom_size() {
        let t = Template::from_json(br#"{"pageSize":{"Custom":{"width":200,"height":300}}}"#)
            .unwrap();
        assert_eq!(t.pages()[0].media_box.height(), 300.0);
    }

    #[test]
    fn rejects_zero_pages() {
        let err = Template::from_json(br#"{"pageCount":0}"#).unwrap_err();
        assert!(matches!(err, GenerationError::ResourceLoad { .. }));
    }

    #[test]
    fn rejects_negative_margin() {
        let err = Template::uniform(PageSize::A4, -1.0, 1).unwrap_err();
        assert!(matches!(err, GenerationError::ResourceLoad { .. }));
    }

    #[test]
    fn rejects_margin_that_covers_the_page() {
        let err = Template::from_json(br#"{"pageSize":"A5","margin":400,"pageCount":3}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::ResourceLoad { ref resource, .. } if resource == "template"));
        assert!(err.to_string().contains("no usable area on page 1"), "{err}");
    }

    #[test]
    fn rejects_margin_wider_than_one_explicit_page() {
        let err = Template::from_json(
            br#"{"margin":30,"pages":[{"mediaBox":[0,0,300,300]},{"mediaBox":[0,0,60,300]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("page 2"), "{err}");
    }

    #[test]
    fn rejects_garbage() {
        let err = Template::from_json(b"not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to load template"));
    }
}
