//! Style Document Importer
//!
//! Reads QGIS (`.qml`), ArcGIS (`.lyr`, XML export) and generic XML style
//! documents and extracts a vendor-neutral [`StyleDescription`]. Only
//! structural problems are errors; an entry whose color cannot be found
//! gets the fallback color and the import continues.

mod color;
mod dialect;
mod extract;
mod tiers;
mod xml_tree;

pub use color::{recognize_color, NamedColors};
pub use dialect::{Dialect, RendererKind};
pub use tiers::{ColorScope, ColorTier, CATEGORY_TIERS, RANGE_TIERS};
pub use xml_tree::XmlNode;

use crate::symbology::StyleDescription;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// First bytes of a ZIP container
const ZIP_SIGNATURE: &[u8] = b"PK";

/// Importer errors
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    /// Not well-formed XML (or not UTF-8)
    #[error("Malformed style document: {0}")]
    MalformedDocument(String),

    #[error("No renderer found in style document")]
    RendererNotFound,

    #[error("Unsupported renderer type: {0}")]
    UnsupportedRendererType(String),

    /// Binary container formats (ZIP-based `.lyr`)
    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    /// Generic XML that is neither QGIS nor ArcGIS CIM
    #[error("Unrecognized style document: neither QGIS nor ArcGIS")]
    UnrecognizedDialect,
}

/// Expected document family, usually from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHint {
    Qml,
    Lyr,
    GenericXml,
}

impl SourceHint {
    /// Hint for a file extension (case-insensitive, without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "qml" => Some(SourceHint::Qml),
            "lyr" | "style" | "stylx" => Some(SourceHint::Lyr),
            "xml" => Some(SourceHint::GenericXml),
            _ => None,
        }
    }

    /// Hint for an uploaded file name
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Hint for an explicit format name (`qml`, `lyr`, `generic_xml` or any
    /// known extension)
    pub fn from_format(format: &str) -> Option<Self> {
        if format.eq_ignore_ascii_case("generic_xml") {
            return Some(SourceHint::GenericXml);
        }
        Self::from_extension(format.trim_start_matches('.'))
    }
}

/// Import a style document
pub fn import_style(document: &[u8], hint: SourceHint) -> Result<StyleDescription, ImportError> {
    if hint == SourceHint::Lyr && document.starts_with(ZIP_SIGNATURE) {
        return Err(ImportError::UnsupportedContainer(
            "binary .lyr (ZIP) files are not supported; export the style as XML".to_string(),
        ));
    }

    let text = std::str::from_utf8(document)
        .map_err(|e| ImportError::MalformedDocument(format!("invalid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let root = XmlNode::parse(text)?;
    let dialect = Dialect::detect(hint, text)?;
    let renderer = dialect.locate_renderer(&root)?;
    let kind = dialect.renderer_kind(renderer)?;

    debug!(?dialect, ?kind, renderer = %renderer.name, "Located style renderer");

    let style = match kind {
        RendererKind::Categorized => StyleDescription::Categorized(extract::categorized(renderer, dialect)),
        RendererKind::Graduated => StyleDescription::Graduated(extract::graduated(renderer, dialect)),
        RendererKind::Single => StyleDescription::Single(extract::single(renderer, dialect)),
    };
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints() {
        assert_eq!(SourceHint::from_extension("QML"), Some(SourceHint::Qml));
        assert_eq!(SourceHint::from_extension("stylx"), Some(SourceHint::Lyr));
        assert_eq!(SourceHint::from_extension("sld"), None);
        assert_eq!(SourceHint::from_filename("parcels.style.xml"), Some(SourceHint::GenericXml));
        assert_eq!(SourceHint::from_filename("noext"), None);
        assert_eq!(SourceHint::from_format("generic_xml"), Some(SourceHint::GenericXml));
        assert_eq!(SourceHint::from_format(".lyr"), Some(SourceHint::Lyr));
    }

    #[test]
    fn test_zip_lyr_rejected() {
        let zip = b"PK\x03\x04\x14\x00\x00\x00";
        assert!(matches!(
            import_style(zip, SourceHint::Lyr),
            Err(ImportError::UnsupportedContainer(_))
        ));
        // only the lyr hint checks the container
        assert!(matches!(
            import_style(zip, SourceHint::Qml),
            Err(ImportError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            import_style(&[0x3c, 0xff, 0xfe], SourceHint::Qml),
            Err(ImportError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_bom_is_stripped() {
        let doc = "\u{feff}<qgis><renderer-v2 type=\"singleSymbol\"/></qgis>";
        let style = import_style(doc.as_bytes(), SourceHint::Qml).unwrap();
        assert_eq!(style.style_type(), "single");
    }
}
