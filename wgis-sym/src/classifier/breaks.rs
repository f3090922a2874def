//! Break computation for graduated classification

use super::ClassifyError;

/// Shift keeping log-transformed values strictly positive
const LOG_EPSILON: f64 = 1e-9;

/// `num` evenly spaced values from `start` to `stop` inclusive
///
/// The last value is exactly `stop`.
pub(super) fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            values[num - 1] = stop;
            values
        }
    }
}

/// `classes + 1` boundaries evenly spaced between min and max
///
/// Empty input yields no boundaries.
pub(super) fn equal_interval(values: &[f64], classes: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let (min, max) = min_max(values);
    linspace(min, max, classes.saturating_add(1))
}

/// `classes + 1` boundaries at evenly spaced percentiles
///
/// Uses linear interpolation between order statistics. Empty input yields no
/// boundaries.
pub(super) fn quantile_breaks(values: &[f64], classes: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    linspace(0.0, 1.0, classes.saturating_add(1))
        .into_iter()
        .map(|q| quantile_sorted(&sorted, q))
        .collect()
}

/// Quantile breaks on a log scale
///
/// Values are shifted so the minimum maps to `LOG_EPSILON`, transformed with
/// `ln_1p`, classified by quantiles, and mapped back with `exp_m1` plus the
/// same shift. The low end can land slightly off the data minimum.
pub(super) fn log_breaks(values: &[f64], classes: usize) -> Vec<f64> {
    let (min, _) = min_max(values);
    let transformed: Vec<f64> = values
        .iter()
        .map(|v| (v - min + LOG_EPSILON).ln_1p())
        .collect();

    quantile_breaks(&transformed, classes)
        .into_iter()
        .map(|b| b.exp_m1() + min - LOG_EPSILON)
        .collect()
}

/// Caller-supplied breaks: numbers or numeric strings, sorted and unique
pub(super) fn manual_breaks(raw: &[serde_json::Value]) -> Result<Vec<f64>, ClassifyError> {
    let mut breaks = Vec::with_capacity(raw.len());
    for value in raw {
        let number = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or_else(|| ClassifyError::InvalidBreaks(format!("not a number: {}", value)))?;
        breaks.push(number);
    }

    let breaks = sorted_unique(breaks);
    if breaks.len() < 2 {
        return Err(ClassifyError::InvalidBreaks(format!(
            "at least 2 distinct breaks required, got {}",
            breaks.len()
        )));
    }
    Ok(breaks)
}

/// Sort ascending and drop duplicates
pub(super) fn sorted_unique(mut breaks: Vec<f64>) -> Vec<f64> {
    breaks.sort_by(f64::total_cmp);
    breaks.dedup();
    breaks
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_breaks() {
        assert!(quantile_breaks(&[], 4).is_empty());
        assert!(equal_interval(&[], 4).is_empty());
        assert!(log_breaks(&[], 4).is_empty());
    }

    #[test]
    fn test_linspace_edges() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_linspace_last_is_exact() {
        let values = linspace(0.1, 0.7, 7);
        assert_eq!(values[6], 0.7);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile_breaks(&[2.0], 3), vec![2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_sorted_unique() {
        assert_eq!(sorted_unique(vec![3.0, 1.0, 3.0, 2.0, 1.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_manual_rejects_non_finite_strings() {
        let raw = vec![serde_json::json!("inf"), serde_json::json!(1), serde_json::json!(2)];
        assert!(manual_breaks(&raw).is_err());
    }
}
