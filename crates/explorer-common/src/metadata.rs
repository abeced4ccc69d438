//! Response bodies served by the tile backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{DatasetRecord, Key};

/// Statistical metadata for one dataset, fetched once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// `[west, south, east, north]`
    pub bounds: [f64; 4],
    /// `[min, max]` of valid data values
    pub range: [f64; 2],
    #[serde(default)]
    pub percentiles: Vec<f64>,
    pub mean: f64,
    pub stdev: f64,
    pub valid_percentage: f64,
    /// GeoJSON geometry, kept verbatim.
    #[serde(default)]
    pub convex_hull: serde_json::Value,
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

/// `GET /keys`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysResponse {
    pub keys: Vec<Key>,
}

/// `GET /datasets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsResponse {
    pub page: u32,
    pub limit: u32,
    pub datasets: Vec<DatasetRecord>,
}

/// `GET /colormap`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColormapResponse {
    pub colormap: Vec<ColormapEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColormapEntry {
    pub rgb: [u8; 3],
}

impl ColormapEntry {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Error body, e.g. for an unknown dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
