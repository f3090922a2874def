//! Classifier: turns an attribute column into display classes
//!
//! Categorized mode returns the most frequent distinct values; graduated mode
//! returns ascending break boundaries computed by one of the
//! [`ClassificationMethod`]s.

mod breaks;
mod categories;

use breaks::{equal_interval, quantile_breaks};
pub use categories::{top_categories, MAX_CATEGORIES};

use crate::features::{AttributeSeries, AttributeTable, AttributeValue, GEOMETRY_COLUMN};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default number of graduated classes
pub const DEFAULT_CLASS_COUNT: usize = 5;

/// Largest accepted number of graduated classes
pub const MAX_CLASS_COUNT: usize = 1000;

/// Classification errors
#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    /// Field absent, reserved, or of the wrong kind for the mode
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Manual breaks malformed
    #[error("Invalid breaks: {0}")]
    InvalidBreaks(String),

    /// Class count above [`MAX_CLASS_COUNT`]
    #[error("Invalid class count: {0} (maximum {})", MAX_CLASS_COUNT)]
    InvalidClassCount(usize),

    /// No valid values left after filtering
    #[error("No valid values in field '{0}'")]
    EmptySeries(String),
}

/// Categorized (distinct values) or graduated (numeric ranges)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    Categorized,
    Graduated,
}

impl ClassificationMode {
    /// Anything other than "categorized" is graduated
    pub fn parse_lenient(mode: Option<&str>) -> Self {
        match mode {
            Some(m) if m.eq_ignore_ascii_case("categorized") => ClassificationMode::Categorized,
            _ => ClassificationMode::Graduated,
        }
    }
}

/// How graduated breaks are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    #[default]
    Equal,
    Quantiles,
    Log,
    /// Same computation as `Equal`: no natural-breaks optimization is done
    Jenks,
    Manual,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::Equal => "equal",
            ClassificationMethod::Quantiles => "quantiles",
            ClassificationMethod::Log => "log",
            ClassificationMethod::Jenks => "jenks",
            ClassificationMethod::Manual => "manual",
        }
    }

    /// Recognize method names used by this service and by desktop GIS tools
    ///
    /// Returns `None` for unknown names; callers default to `Equal`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "equal" | "equalinterval" | "equalintervals" => Some(ClassificationMethod::Equal),
            "quantile" | "quantiles" => Some(ClassificationMethod::Quantiles),
            "log" | "logarithmic" | "logarithmicscale" => Some(ClassificationMethod::Log),
            "jenks" | "naturalbreaks" | "naturalbreaksjenks" => Some(ClassificationMethod::Jenks),
            "manual" | "fixed" | "fixedinterval" | "definedinterval" => {
                Some(ClassificationMethod::Manual)
            }
            _ => None,
        }
    }

    /// `parse`, defaulting to `Equal`
    pub fn parse_or_default(name: Option<&str>) -> Self {
        name.and_then(Self::parse).unwrap_or_default()
    }
}

/// One classification call
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub field: String,
    pub mode: ClassificationMode,
    pub method: ClassificationMethod,
    /// Number of graduated classes (1 to [`MAX_CLASS_COUNT`])
    pub classes: usize,
    /// Caller-supplied boundaries, used only by the manual method
    pub breaks: Vec<serde_json::Value>,
}

impl ClassificationRequest {
    pub fn categorized(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            mode: ClassificationMode::Categorized,
            method: ClassificationMethod::Equal,
            classes: DEFAULT_CLASS_COUNT,
            breaks: Vec::new(),
        }
    }

    /// Graduated request; a class count of 0 means the default
    pub fn graduated(field: impl Into<String>, method: ClassificationMethod, classes: usize) -> Self {
        Self {
            field: field.into(),
            mode: ClassificationMode::Graduated,
            method,
            classes: if classes == 0 { DEFAULT_CLASS_COUNT } else { classes },
            breaks: Vec::new(),
        }
    }

    pub fn with_breaks(mut self, breaks: Vec<serde_json::Value>) -> Self {
        self.breaks = breaks;
        self
    }
}

/// Top categories or ascending breaks
///
/// Serializes as `{"categories": [...]}` or `{"breaks": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationResult {
    Categories(Vec<AttributeValue>),
    Breaks(Vec<f64>),
}

/// Classify one column of a layer
///
/// Fails with `InvalidField` if the column is absent or is the reserved
/// geometry column.
pub fn classify_table(
    table: &AttributeTable,
    request: &ClassificationRequest,
) -> Result<ClassificationResult, ClassifyError> {
    if request.field.is_empty() || request.field == GEOMETRY_COLUMN {
        return Err(ClassifyError::InvalidField(request.field.clone()));
    }
    let series = table
        .series(&request.field)
        .ok_or_else(|| ClassifyError::InvalidField(request.field.clone()))?;
    classify(&series, request)
}

/// Classify an attribute series
pub fn classify(
    series: &AttributeSeries,
    request: &ClassificationRequest,
) -> Result<ClassificationResult, ClassifyError> {
    match request.mode {
        ClassificationMode::Categorized => {
            Ok(ClassificationResult::Categories(top_categories(series)))
        }
        ClassificationMode::Graduated => graduated_breaks(series, request).map(ClassificationResult::Breaks),
    }
}

fn graduated_breaks(
    series: &AttributeSeries,
    request: &ClassificationRequest,
) -> Result<Vec<f64>, ClassifyError> {
    if !series.is_numeric() {
        return Err(ClassifyError::InvalidField(format!(
            "field '{}' is not numeric",
            series.field
        )));
    }

    // Manual breaks come from the caller, not from the data
    if request.method == ClassificationMethod::Manual {
        return breaks::manual_breaks(&request.breaks);
    }

    if request.classes > MAX_CLASS_COUNT {
        return Err(ClassifyError::InvalidClassCount(request.classes));
    }
    let classes = request.classes.max(1);

    let values = series.finite_values();
    if values.is_empty() {
        return Err(ClassifyError::EmptySeries(series.field.clone()));
    }

    let raw = match request.method {
        ClassificationMethod::Quantiles => quantile_breaks(&values, classes),
        ClassificationMethod::Log => breaks::log_breaks(&values, classes),
        ClassificationMethod::Jenks => {
            debug!(field = %series.field, "jenks requested: using equal-interval breaks");
            equal_interval(&values, classes)
        }
        ClassificationMethod::Equal | ClassificationMethod::Manual => {
            equal_interval(&values, classes)
        }
    };

    Ok(breaks::sorted_unique(raw))
}
