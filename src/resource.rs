//! Loading the template and the two font resources.
//!
//! Resources are immutable once loaded. The bundled set is compiled into the
//! binary and parsed at most once per process; every generation afterwards
//! borrows the same read-only instance.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::error::{GenerationError, Result};
use crate::font::{FontResource, FontSet};
use crate::template::Template;

const BUNDLED_TEMPLATE: &[u8] = include_bytes!("../assets/template.json");
const BUNDLED_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");
const BUNDLED_REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

static BUNDLED: OnceCell<Resources> = OnceCell::new();

/// File locations for a resource set.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    pub template: PathBuf,
    pub bold_font: PathBuf,
    pub regular_font: PathBuf,
}

/// Everything a generation reads but never writes.
#[derive(Debug, Clone)]
pub struct Resources {
    template: Template,
    fonts: FontSet,
}

impl Resources {
    pub fn new(template: Template, fonts: FontSet) -> Self {
        Self { template, fonts }
    }

    /// Load a resource set from disk.
    pub fn load(paths: &ResourcePaths) -> Result<Self> {
        let template = Self::load_template(&paths.template)?;
        let bold = Self::load_font("bold font", &paths.bold_font)?;
        let regular = Self::load_font("regular font", &paths.regular_font)?;

        log::debug!(
            "loaded resources: {} template pages, fonts {} / {}",
            template.page_count(),
            bold.name(),
            regular.name()
        );
        Ok(Self::new(template, FontSet::new(bold, regular)))
    }

    /// Read a template descriptor file.
    pub fn load_template(path: &Path) -> Result<Template> {
        Template::from_json(&read_resource("template", path)?).map_err(|e| with_path(e, path))
    }

    /// Read a TrueType file. `label` names it in errors.
    pub fn load_font(label: &str, path: &Path) -> Result<FontResource> {
        FontResource::from_bytes(label, read_resource(label, path)?).map_err(|e| with_path(e, path))
    }

    /// The resources compiled into the crate, initialized on first use.
    pub fn bundled() -> Result<&'static Resources> {
        BUNDLED.get_or_try_init(|| {
            log::debug!("initializing bundled resources");
            let template = Template::from_json(BUNDLED_TEMPLATE)?;
            let bold = FontResource::from_bytes("bold font", BUNDLED_BOLD.to_vec())?;
            let regular = FontResource::from_bytes("regular font", BUNDLED_REGULAR.to_vec())?;
            Ok(Self::new(template, FontSet::new(bold, regular)))
        })
    }

    /// Same fonts, different template.
    pub fn with_template(&self, template: Template) -> Self {
        Self {
            template,
            fonts: self.fonts.clone(),
        }
    }

    /// Same template, different fonts.
    pub fn with_fonts(&self, fonts: FontSet) -> Self {
        Self {
            template: self.template.clone(),
            fonts,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }
}

fn read_resource(resource: &str, path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| GenerationError::resource(resource, format!("{}: {e}", path.display())))
}

fn with_path(err: GenerationError, path: &Path) -> GenerationError {
    match err {
        GenerationError::ResourceLoad { resource, reason } => GenerationError::ResourceLoad {
            resource,
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(data).unwrap();
        path
    }

    #[test]
    fn bundled_resources_are_shared() {
        let a = Resources::bundled().unwrap();
        let b = Resources::bundled().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.template().page_count(), 50);
        assert_eq!(a.fonts().bold().name(), "DejaVuSans-Bold");
        assert_eq!(a.fonts().regular().name(), "DejaVuSans");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ResourcePaths {
            template: write_temp(dir.path(), "t.json", br#"{"pageSize":"Letter","pageCount":2}"#),
            bold_font: write_temp(dir.path(), "b.ttf", BUNDLED_BOLD),
            regular_font: write_temp(dir.path(), "r.ttf", BUNDLED_REGULAR),
        };
        let resources = Resources::load(&paths).unwrap();
        assert_eq!(resources.template().page_count(), 2);
    }

    #[test]
    fn missing_font_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ResourcePaths {
            template: write_temp(dir.path(), "t.json", b"{}"),
            bold_font: dir.path().join("missing-bold.ttf"),
            regular_font: write_temp(dir.path(), "r.ttf", BUNDLED_REGULAR),
        };
        let err = Resources::load(&paths).unwrap_err();
        match err {
            GenerationError::ResourceLoad { resource, reason } => {
                assert_eq!(resource, "bold font");
                assert!(reason.contains("missing-bold.ttf"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_font_data_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ResourcePaths {
            template: write_temp(dir.path(), "t.json", b"{}"),
            bold_font: write_temp(dir.path(), "b.ttf", BUNDLED_BOLD),
            regular_font: write_temp(dir.path(), "broken.ttf", b"nope"),
        };
        let err = Resources::load(&paths).unwrap_err();
        assert!(err.to_string().contains("regular font"), "{err}");
        assert!(err.to_string().contains("broken.ttf"), "{err}");
    }

    #[test]
    fn bad_template_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ResourcePaths {
            template: write_temp(dir.path(), "t.json", br#"{"pageCount":"many"}"#),
            bold_font: write_temp(dir.path(), "b.ttf", BUNDLED_BOLD),
            regular_font: write_temp(dir.path(), "r.ttf", BUNDLED_REGULAR),
        };
        let err = Resources::load(&paths).unwrap_err();
        assert!(matches!(err, GenerationError::ResourceLoad { ref resource, .. } if resource == "template"));
    }
}
