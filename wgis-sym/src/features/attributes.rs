//! Attribute data read from a layer's dataset
//!
//! An [`AttributeTable`] is an immutable snapshot of every record of one
//! layer. Classification works on one column of it at a time
//! ([`AttributeSeries`]).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Reserved column holding the feature geometry
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One attribute value of one record
///
/// Serializes to the matching JSON scalar (`null`, `true`, `3.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Convert a JSON value; objects and arrays keep their JSON text
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(AttributeValue::Number)
                .unwrap_or(AttributeValue::Null),
            serde_json::Value::String(s) => AttributeValue::Text(s.clone()),
            other => AttributeValue::Text(other.to_string()),
        }
    }

    /// Null or NaN
    pub fn is_missing(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Hashable identity used for distinct-value counting
    ///
    /// Returns `None` for missing values.
    pub(crate) fn distinct_key(&self) -> Option<DistinctKey<'_>> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Number(n) if n.is_nan() => None,
            // 0.0 and -0.0 are the same category
            AttributeValue::Number(n) if *n == 0.0 => Some(DistinctKey::Number(0.0f64.to_bits())),
            AttributeValue::Number(n) => Some(DistinctKey::Number(n.to_bits())),
            AttributeValue::Bool(b) => Some(DistinctKey::Bool(*b)),
            AttributeValue::Text(s) => Some(DistinctKey::Text(s)),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum DistinctKey<'a> {
    Bool(bool),
    Number(u64),
    Text(&'a str),
}

/// Ordered raw values of one column of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSeries {
    pub field: String,
    pub values: Vec<AttributeValue>,
}

impl AttributeSeries {
    pub fn new(field: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    /// Numeric series from plain numbers
    pub fn numeric(field: impl Into<String>, values: &[f64]) -> Self {
        Self::new(field, values.iter().copied().map(AttributeValue::Number).collect())
    }

    /// True if every non-null value is a number
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|v| matches!(v, AttributeValue::Null | AttributeValue::Number(_)))
    }

    /// Finite numbers only (NaN and ±infinity are treated as missing)
    pub fn finite_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(AttributeValue::as_f64)
            .filter(|v| v.is_finite())
            .collect()
    }
}

/// Broad type of a column, reported by the field listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Real,
    Boolean,
    Text,
    Mixed,
    Empty,
}

/// Description of one attribute column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: FieldKind,
    pub is_numeric: bool,
    pub unique_count: usize,
}

/// All attribute records of one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTable {
    columns: Vec<String>,
    records: Vec<HashMap<String, AttributeValue>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    ///
    /// Columns first seen in this record are appended after the known ones,
    /// sorted by name among themselves.
    pub fn push_record(&mut self, record: HashMap<String, AttributeValue>) {
        let mut new_columns: Vec<&String> = record
            .keys()
            .filter(|k| !self.columns.contains(k))
            .collect();
        new_columns.sort();
        for column in new_columns {
            self.columns.push(column.clone());
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Column values in record order (records lacking the column yield null)
    pub fn series(&self, field: &str) -> Option<AttributeSeries> {
        if !self.has_column(field) {
            return None;
        }
        let values = self
            .records
            .iter()
            .map(|r| r.get(field).cloned().unwrap_or(AttributeValue::Null))
            .collect();
        Some(AttributeSeries::new(field, values))
    }

    /// Most frequent geometry type, if the dataset carries one
    pub fn geometry_type(&self) -> Option<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            if let Some(AttributeValue::Text(kind)) = record.get(GEOMETRY_COLUMN) {
                *counts.entry(kind.as_str()).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(kind, _)| kind.to_string())
    }

    /// Summaries of every attribute column except the geometry column
    pub fn field_summaries(&self) -> Vec<FieldSummary> {
        self.columns
            .iter()
            .filter(|c| c.as_str() != GEOMETRY_COLUMN)
            .filter_map(|c| self.series(c))
            .map(|series| summarize(&series))
            .collect()
    }
}

fn summarize(series: &AttributeSeries) -> FieldSummary {
    let mut distinct = HashSet::new();
    let (mut ints, mut reals, mut bools, mut texts) = (0usize, 0usize, 0usize, 0usize);

    for value in &series.values {
        if let Some(key) = value.distinct_key() {
            distinct.insert(key);
        }
        match value {
            AttributeValue::Number(n) if n.is_nan() => {}
            AttributeValue::Number(n) if n.fract() == 0.0 => ints += 1,
            AttributeValue::Number(_) => reals += 1,
            AttributeValue::Bool(_) => bools += 1,
            AttributeValue::Text(_) => texts += 1,
            AttributeValue::Null => {}
        }
    }

    let kind = match (ints + reals, bools, texts) {
        (0, 0, 0) => FieldKind::Empty,
        (_, 0, 0) if reals > 0 => FieldKind::Real,
        (_, 0, 0) => FieldKind::Integer,
        (0, _, 0) => FieldKind::Boolean,
        (0, 0, _) => FieldKind::Text,
        _ => FieldKind::Mixed,
    };

    FieldSummary {
        name: series.field.clone(),
        kind,
        is_numeric: series.is_numeric(),
        unique_count: distinct.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, AttributeValue)]) -> HashMap<String, AttributeValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_json() {
        use serde_json::json;
        assert_eq!(AttributeValue::from_json(&json!(null)), AttributeValue::Null);
        assert_eq!(AttributeValue::from_json(&json!(3)), AttributeValue::Number(3.0));
        assert_eq!(AttributeValue::from_json(&json!("a")), AttributeValue::Text("a".into()));
        assert_eq!(
            AttributeValue::from_json(&json!([1, 2])),
            AttributeValue::Text("[1,2]".into())
        );
    }

    #[test]
    fn test_serializes_as_json_scalars() {
        let values = vec![
            AttributeValue::Null,
            AttributeValue::Bool(true),
            AttributeValue::Number(2.5),
            AttributeValue::Text("x".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,true,2.5,"x"]"#);
    }

    #[test]
    fn test_series_fills_missing_columns_with_null() {
        let mut table = AttributeTable::new();
        table.push_record(record(&[("a", 1.0.into())]));
        table.push_record(record(&[("b", "x".into())]));

        let series = table.series("a").unwrap();
        assert_eq!(series.values, vec![AttributeValue::Number(1.0), AttributeValue::Null]);
        assert!(table.series("missing").is_none());
    }

    #[test]
    fn test_new_columns_appended_sorted() {
        let mut table = AttributeTable::new();
        table.push_record(record(&[("zone", "R1".into()), ("area", 2.0.into())]));
        table.push_record(record(&[("pop", 1.0.into()), ("zone", "C2".into()), ("id", 7.0.into())]));
        assert_eq!(table.columns(), ["area", "zone", "id", "pop"]);
    }

    #[test]
    fn test_field_summaries_skip_geometry() {
        let mut table = AttributeTable::new();
        table.push_record(record(&[
            ("pop", 10.0.into()),
            ("name", "a".into()),
            (GEOMETRY_COLUMN, "Polygon".into()),
        ]));
        table.push_record(record(&[
            ("pop", 12.5.into()),
            ("name", "a".into()),
            (GEOMETRY_COLUMN, "Polygon".into()),
        ]));

        let summaries = table.field_summaries();
        assert_eq!(summaries.len(), 2);

        let pop = summaries.iter().find(|s| s.name == "pop").unwrap();
        assert_eq!(pop.kind, FieldKind::Real);
        assert!(pop.is_numeric);
        assert_eq!(pop.unique_count, 2);

        let name = summaries.iter().find(|s| s.name == "name").unwrap();
        assert_eq!(name.kind, FieldKind::Text);
        assert!(!name.is_numeric);
        assert_eq!(name.unique_count, 1);

        assert_eq!(table.geometry_type().as_deref(), Some("Polygon"));
    }

    #[test]
    fn test_finite_values_drop_nan_and_infinity() {
        let series = AttributeSeries::numeric("v", &[1.0, f64::NAN, f64::INFINITY, -2.0]);
        assert_eq!(series.finite_values(), vec![1.0, -2.0]);
        assert!(series.is_numeric());
    }
}
