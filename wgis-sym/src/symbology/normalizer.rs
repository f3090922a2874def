//! Symbology Normalizer
//!
//! Validates a candidate style (importer output or a caller-built JSON
//! payload) and canonicalizes it into a [`SymbologyRecord`].

use super::{
    CategorizedSymbology, CategoryRule, CategoryStyle, GraduatedSymbology, PaletteInfo, RangeRule,
    RangeStyle, SingleSymbology, StyleDescription, Symbology, SymbologyRecord, DEFAULT_BORDER_WIDTH,
    DEFAULT_FILL_COLOR, DEFAULT_FILL_OPACITY, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH,
};
use crate::classifier::ClassificationMethod;
use crate::features::AttributeValue;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Normalizer errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// `style_type` is not single, categorized or graduated
    #[error("Unsupported style type: {0}")]
    UnsupportedStyleType(String),

    /// The payload is not a JSON object of the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// What can be normalized
#[derive(Debug, Clone)]
pub enum NormalizeInput {
    Description(StyleDescription),
    Payload(Value),
}

impl From<StyleDescription> for NormalizeInput {
    fn from(description: StyleDescription) -> Self {
        NormalizeInput::Description(description)
    }
}

impl From<Value> for NormalizeInput {
    fn from(payload: Value) -> Self {
        NormalizeInput::Payload(payload)
    }
}

/// Normalize either input form
pub fn normalize(input: impl Into<NormalizeInput>) -> Result<SymbologyRecord, ValidationError> {
    match input.into() {
        NormalizeInput::Description(description) => normalize_description(description),
        NormalizeInput::Payload(payload) => normalize_payload(&payload),
    }
}

/// Normalize an importer-produced style
pub fn normalize_description(description: StyleDescription) -> Result<SymbologyRecord, ValidationError> {
    canonicalize(Candidate::from(description))
}

/// Normalize a raw JSON payload
pub fn normalize_payload(payload: &Value) -> Result<SymbologyRecord, ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::InvalidPayload(
            "symbology must be a JSON object".to_string(),
        ));
    }
    let candidate =
        Candidate::deserialize(payload).map_err(|e| ValidationError::InvalidPayload(e.to_string()))?;
    canonicalize(candidate)
}

/// Loosely-typed candidate style, as accepted from callers
#[derive(Debug, Default, Deserialize)]
struct Candidate {
    style_type: Option<String>,
    /// Synonym of `style_type`
    #[serde(rename = "type")]
    kind: Option<String>,
    field: Option<String>,
    geometry_type: Option<String>,

    categories: Option<Vec<CandidateCategory>>,
    palette: Option<String>,
    palette_invert: Option<bool>,
    /// Opacity of palette-colored rules; overrides `fill_opacity` for them
    palette_opacity: Option<f64>,
    /// Stored form of the three palette keys above
    palette_info: Option<PaletteInfo>,
    border_width: Option<f64>,
    fill_opacity: Option<f64>,

    classes: Option<Value>,
    method: Option<String>,
    ranges: Option<Vec<RangeStyle>>,
    /// Importer-style nesting: `{"graduated": {"ranges": [...], "method": "..."}}`
    graduated: Option<GraduatedSection>,
    breaks: Option<Vec<f64>>,

    fill: Option<String>,
    fill_color: Option<String>,
    color: Option<String>,
    stroke_color: Option<String>,
    stroke_width: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GraduatedSection {
    ranges: Option<Vec<RangeStyle>>,
    method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateCategory {
    category: Option<AttributeValue>,
    value: Option<AttributeValue>,
    label: Option<String>,
    color: Option<String>,
}

impl From<StyleDescription> for Candidate {
    fn from(description: StyleDescription) -> Self {
        let style_type = Some(description.style_type().to_string());
        match description {
            StyleDescription::Single(style) => Candidate {
                style_type,
                fill: Some(style.fill_color),
                color: Some(style.stroke_color),
                stroke_width: Some(style.stroke_width),
                ..Default::default()
            },
            StyleDescription::Categorized(style) => Candidate {
                style_type,
                field: style.field,
                categories: Some(
                    style
                        .categories
                        .into_iter()
                        .map(|c| CandidateCategory {
                            category: None,
                            value: Some(c.value),
                            label: Some(c.label),
                            color: Some(c.color),
                        })
                        .collect(),
                ),
                ..Default::default()
            },
            StyleDescription::Graduated(style) => Candidate {
                style_type,
                field: style.field,
                classes: Some(Value::from(style.ranges.len())),
                method: Some(style.method.as_str().to_string()),
                ranges: Some(style.ranges),
                ..Default::default()
            },
        }
    }
}

fn canonicalize(candidate: Candidate) -> Result<SymbologyRecord, ValidationError> {
    let style_type = candidate
        .style_type
        .clone()
        .or_else(|| candidate.kind.clone())
        .ok_or_else(|| ValidationError::MissingField("style_type".to_string()))?;

    let border_width = candidate.border_width.unwrap_or(DEFAULT_BORDER_WIDTH);
    let palette_opacity = candidate
        .palette_opacity
        .or_else(|| candidate.palette_info.as_ref().map(|p| p.opacity));
    // A palette opacity alone still sets the layer opacity
    let fill_opacity = candidate
        .fill_opacity
        .or(palette_opacity)
        .unwrap_or(DEFAULT_FILL_OPACITY);
    let geometry_type = candidate.geometry_type.clone();

    let symbology = match style_type.as_str() {
        "single" => Symbology::Single(single(candidate)),
        "categorized" => Symbology::Categorized(categorized(
            candidate,
            border_width,
            palette_opacity.unwrap_or(fill_opacity),
        )?),
        "graduated" => Symbology::Graduated(graduated(candidate, border_width, fill_opacity)?),
        other => return Err(ValidationError::UnsupportedStyleType(other.to_string())),
    };

    Ok(SymbologyRecord {
        symbology,
        border_width,
        fill_opacity,
        geometry_type,
        updated_at: None,
    })
}

fn required_field(field: Option<String>) -> Result<String, ValidationError> {
    field
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ValidationError::MissingField("field".to_string()))
}

fn single(candidate: Candidate) -> SingleSymbology {
    SingleSymbology {
        fill: candidate
            .fill
            .or(candidate.fill_color)
            .unwrap_or_else(|| DEFAULT_FILL_COLOR.to_string()),
        color: candidate
            .color
            .or(candidate.stroke_color)
            .unwrap_or_else(|| DEFAULT_STROKE_COLOR.to_string()),
        stroke_width: candidate.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
    }
}

/// `fill_opacity` is the palette opacity when a palette is in use
fn categorized(
    candidate: Candidate,
    border_width: f64,
    fill_opacity: f64,
) -> Result<CategorizedSymbology, ValidationError> {
    let field = required_field(candidate.field)?;
    let entries = candidate
        .categories
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ValidationError::MissingField("categories".to_string()))?;

    let mut categories = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let value = entry
            .category
            .or(entry.value)
            .ok_or_else(|| ValidationError::MissingField(format!("categories[{}].category", i)))?;
        let color = entry
            .color
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ValidationError::MissingField(format!("categories[{}].color", i)))?;
        let label = entry.label.unwrap_or_else(|| display_label(&value));
        categories.push(CategoryStyle { value, label, color });
    }

    let rules = categories
        .iter()
        .map(|c| CategoryRule {
            value: c.value.clone(),
            color: c.color.clone(),
            fill: c.color.clone(),
            weight: border_width,
            fill_opacity,
        })
        .collect();

    let palette_info = match (candidate.palette, candidate.palette_info) {
        (Some(name), stored) => Some(PaletteInfo {
            name,
            inverted: candidate
                .palette_invert
                .or(stored.map(|p| p.inverted))
                .unwrap_or(false),
            opacity: fill_opacity,
        }),
        (None, Some(stored)) => Some(PaletteInfo {
            inverted: candidate.palette_invert.unwrap_or(stored.inverted),
            opacity: fill_opacity,
            ..stored
        }),
        (None, None) => None,
    };

    Ok(CategorizedSymbology {
        field,
        categories,
        rules,
        palette_info,
    })
}

fn graduated(
    candidate: Candidate,
    border_width: f64,
    fill_opacity: f64,
) -> Result<GraduatedSymbology, ValidationError> {
    let field = required_field(candidate.field)?;
    let classes = match candidate.classes {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("classes".to_string())),
        Some(value) => class_count(&value)?,
    };

    let (section_ranges, section_method) = candidate
        .graduated
        .map(|g| (g.ranges, g.method))
        .unwrap_or_default();

    let ranges = candidate.ranges.or(section_ranges).unwrap_or_default();
    let rules = ranges
        .iter()
        .map(|r| RangeRule {
            min: r.lower,
            max: r.upper,
            color: r.color.clone(),
            fill: r.color.clone(),
            weight: border_width,
            fill_opacity,
        })
        .collect();

    Ok(GraduatedSymbology {
        field,
        classes,
        method: ClassificationMethod::parse_or_default(
            candidate.method.as_deref().or(section_method.as_deref()),
        ),
        ranges,
        rules,
        breaks: candidate.breaks,
    })
}

fn class_count(value: &Value) -> Result<usize, ValidationError> {
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count
        .filter(|&c| c > 0)
        .map(|c| c as usize)
        .ok_or_else(|| {
            ValidationError::InvalidPayload(format!("classes must be a positive integer, got {}", value))
        })
}

fn display_label(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Null => String::new(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Number(n) => n.to_string(),
        AttributeValue::Text(s) => s.clone(),
    }
}
