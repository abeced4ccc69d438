//! Common test fixtures for explorer tests.
//!
//! The sample backend knows three keys (`type`, `date`, `band`) and a
//! handful of datasets. Payloads mirror what a live server returns.

use serde_json::{json, Value};

use crate::metadata_json;

/// Key names served by the sample backend, in order.
pub const KEY_NAMES: [&str; 3] = ["type", "date", "band"];

/// Datasets known to the sample backend.
pub const DATASETS: [[&str; 3]; 6] = [
    ["landsat", "20240115", "red"],
    ["landsat", "20240115", "green"],
    ["landsat", "20240115", "blue"],
    ["landsat", "20240115", "nir"],
    ["sentinel", "20240201", "red"],
    ["temp", "20240301", "t2m"],
];

/// Percentiles used for every sample dataset unless overridden (p0..p10).
pub const PERCENTILES: [f64; 11] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

/// `GET /keys`
pub fn keys_json() -> Value {
    json!({
        "keys": [
            { "key": "type", "description": "Sensor or product" },
            { "key": "date", "description": "Acquisition date" },
            { "key": "band" }
        ]
    })
}

/// One listing record.
pub fn dataset_record(values: &[&str]) -> Value {
    let mut map = serde_json::Map::new();
    for (key, value) in KEY_NAMES.iter().zip(values) {
        map.insert((*key).to_string(), Value::String((*value).to_string()));
    }
    Value::Object(map)
}

/// `GET /datasets` with the given page of records.
pub fn datasets_json(page: u32, limit: u32, records: &[[&str; 3]]) -> Value {
    json!({
        "page": page,
        "limit": limit,
        "datasets": records.iter().map(|r| dataset_record(r)).collect::<Vec<_>>()
    })
}

/// Metadata for one of the sample datasets.
pub fn sample_metadata(values: &[&str]) -> Value {
    let mut meta = metadata_json(&PERCENTILES);
    let keys: serde_json::Map<String, Value> = KEY_NAMES
        .iter()
        .zip(values)
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect();
    meta["keys"] = Value::Object(keys);
    meta
}

/// `GET /colormap` with `n` grey entries.
pub fn colormap_json(n: usize) -> Value {
    let entries: Vec<Value> = (0..n)
        .map(|i| {
            let v = if n > 1 { (i * 255 / (n - 1)) as u8 } else { 0 };
            json!({ "rgb": [v, v, v] })
        })
        .collect();
    json!({ "colormap": entries })
}

/// Smallest valid PNG signature plus padding, enough to check byte plumbing.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];
