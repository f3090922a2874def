//! Style descriptions and persisted symbology records
//!
//! [`StyleDescription`] is the vendor-neutral style produced by the importer
//! (or built by hand). [`SymbologyRecord`] is the only form that is ever
//! persisted; [`normalize`] is the single way to obtain one.

mod normalizer;

pub use normalizer::{normalize, normalize_description, normalize_payload, NormalizeInput, ValidationError};

use crate::classifier::ClassificationMethod;
use crate::features::AttributeValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color for a category or range whose color could not be resolved
pub const FALLBACK_CLASS_COLOR: &str = "#cccccc";
/// Default fill for single-symbol styles
pub const DEFAULT_FILL_COLOR: &str = "#38bdf8";
/// Default stroke for single-symbol styles
pub const DEFAULT_STROKE_COLOR: &str = "#333333";
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
pub const DEFAULT_BORDER_WIDTH: f64 = 1.0;
pub const DEFAULT_FILL_OPACITY: f64 = 0.6;

/// Vendor-neutral style extracted from a style document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style_type", rename_all = "lowercase")]
pub enum StyleDescription {
    Single(SingleStyle),
    Categorized(CategorizedStyle),
    Graduated(GraduatedStyle),
}

impl StyleDescription {
    pub fn style_type(&self) -> &'static str {
        match self {
            StyleDescription::Single(_) => "single",
            StyleDescription::Categorized(_) => "categorized",
            StyleDescription::Graduated(_) => "graduated",
        }
    }

    /// Target field (categorized/graduated only)
    pub fn field(&self) -> Option<&str> {
        match self {
            StyleDescription::Single(_) => None,
            StyleDescription::Categorized(style) => style.field.as_deref(),
            StyleDescription::Graduated(style) => style.field.as_deref(),
        }
    }

    /// Fill in the target field when the document did not name one
    pub fn with_default_field(mut self, field: Option<String>) -> Self {
        match &mut self {
            StyleDescription::Single(_) => {}
            StyleDescription::Categorized(CategorizedStyle { field: slot, .. })
            | StyleDescription::Graduated(GraduatedStyle { field: slot, .. }) => {
                if slot.as_deref().map_or(true, str::is_empty) {
                    *slot = field;
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStyle {
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl Default for SingleStyle {
    fn default() -> Self {
        Self {
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedStyle {
    pub field: Option<String>,
    pub categories: Vec<CategoryStyle>,
}

/// One category of a categorized style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub value: AttributeValue,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduatedStyle {
    pub field: Option<String>,
    pub ranges: Vec<RangeStyle>,
    /// Informational: how the ranges were produced
    pub method: ClassificationMethod,
}

/// One class of a graduated style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStyle {
    #[serde(default)]
    pub lower: f64,
    #[serde(default)]
    pub upper: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default = "fallback_class_color")]
    pub color: String,
}

fn fallback_class_color() -> String {
    FALLBACK_CLASS_COLOR.to_string()
}

/// Persisted symbology of one layer
///
/// The union on `style_type` keeps payload and type in agreement:
/// categorized and graduated records always carry renderer rules, graduated
/// records always carry a class count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbologyRecord {
    #[serde(flatten)]
    pub symbology: Symbology,
    pub border_width: f64,
    pub fill_opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
    /// Set by the store on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SymbologyRecord {
    pub fn style_type(&self) -> &'static str {
        match &self.symbology {
            Symbology::Single(_) => "single",
            Symbology::Categorized(_) => "categorized",
            Symbology::Graduated(_) => "graduated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style_type", rename_all = "lowercase")]
pub enum Symbology {
    Single(SingleSymbology),
    Categorized(CategorizedSymbology),
    Graduated(GraduatedSymbology),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSymbology {
    pub fill: String,
    /// Stroke color
    pub color: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedSymbology {
    pub field: String,
    pub categories: Vec<CategoryStyle>,
    /// Flattened rules for the map renderer, one per category
    pub rules: Vec<CategoryRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette_info: Option<PaletteInfo>,
}

/// Renderer rule precomputed from one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub value: AttributeValue,
    pub color: String,
    pub fill: String,
    pub weight: f64,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteInfo {
    pub name: String,
    pub inverted: bool,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduatedSymbology {
    pub field: String,
    pub classes: usize,
    pub method: ClassificationMethod,
    #[serde(default)]
    pub ranges: Vec<RangeStyle>,
    /// Flattened rules for the map renderer, one per range
    #[serde(default)]
    pub rules: Vec<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaks: Option<Vec<f64>>,
}

/// Renderer rule precomputed from one range
///
/// A value `v` falls in the rule when `min <= v < max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub min: f64,
    pub max: f64,
    pub color: String,
    pub fill: String,
    pub weight: f64,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
}
