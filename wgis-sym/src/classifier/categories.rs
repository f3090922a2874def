//! Categorized classification: most frequent distinct values

use crate::features::{AttributeSeries, AttributeValue};
use std::collections::HashMap;

/// Upper bound on returned categories
pub const MAX_CATEGORIES: usize = 50;

/// Distinct non-missing values by descending frequency, at most
/// [`MAX_CATEGORIES`]
///
/// Equal counts keep the order in which values were first encountered.
pub fn top_categories(series: &AttributeSeries) -> Vec<AttributeValue> {
    let mut index: HashMap<_, usize> = HashMap::new();
    let mut counts: Vec<(&AttributeValue, usize)> = Vec::new();

    for value in &series.values {
        let Some(key) = value.distinct_key() else {
            continue;
        };
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((value, 1));
            }
        }
    }

    // sort_by is stable: ties stay in encounter order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_CATEGORIES)
        .map(|(value, _)| value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_series(values: &[&str]) -> AttributeSeries {
        AttributeSeries::new("zone", values.iter().map(|v| AttributeValue::from(*v)).collect())
    }

    #[test]
    fn test_descending_frequency_with_stable_ties() {
        let series = text_series(&["b", "a", "c", "a", "c", "d"]);
        let categories = top_categories(&series);
        assert_eq!(
            categories,
            vec![
                AttributeValue::from("a"),
                AttributeValue::from("c"),
                AttributeValue::from("b"),
                AttributeValue::from("d"),
            ]
        );
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let series = AttributeSeries::new(
            "v",
            vec![
                AttributeValue::Null,
                AttributeValue::Number(f64::NAN),
                AttributeValue::Number(1.0),
                AttributeValue::Null,
            ],
        );
        assert_eq!(top_categories(&series), vec![AttributeValue::Number(1.0)]);
    }

    #[test]
    fn test_truncates_to_fifty() {
        let values: Vec<AttributeValue> = (0..120)
            .map(|i| AttributeValue::Number(f64::from(i % 80)))
            .collect();
        let series = AttributeSeries::new("v", values);
        let categories = top_categories(&series);

        assert_eq!(categories.len(), MAX_CATEGORIES);
        // values 0..40 appear twice and come first
        assert_eq!(categories[0], AttributeValue::Number(0.0));
        assert_eq!(categories[39], AttributeValue::Number(39.0));
        assert_eq!(categories[40], AttributeValue::Number(40.0));
    }

    #[test]
    fn test_categories_are_exactly_the_distinct_values() {
        let series = AttributeSeries::new(
            "v",
            vec![
                AttributeValue::Bool(true),
                AttributeValue::from("x"),
                AttributeValue::Number(2.0),
                AttributeValue::Number(-0.0),
                AttributeValue::Number(0.0),
                AttributeValue::Bool(true),
            ],
        );
        let categories = top_categories(&series);
        assert_eq!(categories.len(), 4);
        for value in &series.values {
            assert!(categories.contains(value));
        }
    }
}
