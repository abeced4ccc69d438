//! Generators for synthetic metadata payloads.

use serde_json::{json, Value};

/// Metadata body with the given percentiles.
///
/// Range spans the first and last percentile (or `[0, 1]` when empty), so
/// stretch fallbacks are easy to predict.
pub fn metadata_json(percentiles: &[f64]) -> Value {
    let min = percentiles.first().copied().unwrap_or(0.0);
    let max = percentiles.last().copied().unwrap_or(1.0);
    json!({
        "bounds": [-10.0, 40.0, 5.0, 52.5],
        "range": [min, max],
        "percentiles": percentiles,
        "mean": (min + max) / 2.0,
        "stdev": (max - min) / 4.0,
        "valid_percentage": 98.5,
        "convex_hull": {
            "type": "Polygon",
            "coordinates": [[[-10.0, 40.0], [5.0, 40.0], [5.0, 52.5], [-10.0, 52.5], [-10.0, 40.0]]]
        },
        "keys": {}
    })
}

/// Evenly spaced percentiles `0, step, 2*step, ...` (`count` values).
pub fn linear_percentiles(count: usize, step: f64) -> Vec<f64> {
    (0..count).map(|i| i as f64 * step).collect()
}
