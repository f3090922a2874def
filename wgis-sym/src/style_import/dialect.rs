//! Style dialects and renderer location

use super::xml_tree::XmlNode;
use super::{ImportError, SourceHint};

/// QGIS renderer element names, in priority order (each needs `type`)
const QGIS_RENDERERS: &[&str] = &["renderer-v2", "renderer"];

/// ArcGIS renderer element names, in priority order
const ARCGIS_RENDERERS: &[&str] = &[
    "CIMUniqueValueRenderer",
    "CIMClassBreaksRenderer",
    "CIMSimpleRenderer",
    "UniqueValueRenderer",
    "ClassBreaksRenderer",
    "SimpleRenderer",
];

/// Markers identifying ArcGIS CIM content in a generic XML document
const CIM_MARKERS: &[&str] = &[
    "CIMUniqueValueRenderer",
    "CIMClassBreaksRenderer",
    "CIMSimpleRenderer",
];

/// Which desktop GIS wrote the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Qgis,
    ArcGis,
}

/// The three supported renderer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Categorized,
    Graduated,
    Single,
}

impl Dialect {
    /// Dialect from the hint, sniffing the text for generic XML
    pub fn detect(hint: SourceHint, document: &str) -> Result<Dialect, ImportError> {
        match hint {
            SourceHint::Qml => Ok(Dialect::Qgis),
            SourceHint::Lyr => Ok(Dialect::ArcGis),
            SourceHint::GenericXml => {
                if document.to_ascii_lowercase().contains("qgis") {
                    Ok(Dialect::Qgis)
                } else if CIM_MARKERS.iter().any(|m| document.contains(m)) {
                    Ok(Dialect::ArcGis)
                } else {
                    Err(ImportError::UnrecognizedDialect)
                }
            }
        }
    }

    /// First renderer element: known names by priority, then any element
    /// whose name contains "renderer"
    pub fn locate_renderer(self, root: &XmlNode) -> Result<&XmlNode, ImportError> {
        let known = match self {
            Dialect::Qgis => QGIS_RENDERERS,
            Dialect::ArcGis => ARCGIS_RENDERERS,
        };

        known
            .iter()
            .find_map(|name| {
                root.find_first(|n| {
                    n.name == *name && (self == Dialect::ArcGis || n.attr("type").is_some())
                })
            })
            .or_else(|| root.find_first(|n| n.name.to_ascii_lowercase().contains("renderer")))
            .ok_or(ImportError::RendererNotFound)
    }

    /// Kind of a located renderer
    pub fn renderer_kind(self, renderer: &XmlNode) -> Result<RendererKind, ImportError> {
        match self {
            Dialect::Qgis => {
                let kind = renderer.attr("type").unwrap_or_default();
                match kind {
                    "categorizedSymbol" => Ok(RendererKind::Categorized),
                    "graduatedSymbol" => Ok(RendererKind::Graduated),
                    "singleSymbol" => Ok(RendererKind::Single),
                    other => Err(ImportError::UnsupportedRendererType(if other.is_empty() {
                        renderer.name.clone()
                    } else {
                        other.to_string()
                    })),
                }
            }
            Dialect::ArcGis => {
                let xsi_type = renderer.attr_local("type").unwrap_or_default();
                let signature = format!("{} {}", renderer.name, xsi_type);
                if signature.contains("UniqueValue") {
                    Ok(RendererKind::Categorized)
                } else if signature.contains("ClassBreaks") {
                    Ok(RendererKind::Graduated)
                } else if signature.contains("Simple") {
                    Ok(RendererKind::Single)
                } else {
                    let kind = xsi_type.rsplit(':').next().unwrap_or_default();
                    Err(ImportError::UnsupportedRendererType(if kind.is_empty() {
                        renderer.name.clone()
                    } else {
                        kind.to_string()
                    }))
                }
            }
        }
    }

    /// Category entries under a categorized renderer
    pub fn is_category(self, node: &XmlNode) -> bool {
        match self {
            Dialect::Qgis => node.name == "category",
            Dialect::ArcGis => node.name == "CIMUniqueValueClass" || node.name == "UniqueValueClass",
        }
    }

    /// Range entries under a graduated renderer
    pub fn is_range(self, node: &XmlNode) -> bool {
        match self {
            Dialect::Qgis => node.name == "range",
            Dialect::ArcGis => node.name == "CIMClassBreak" || node.name == "ClassBreak",
        }
    }
}
