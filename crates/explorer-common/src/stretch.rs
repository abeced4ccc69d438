//! Contrast stretch ranges and the default percentile clip.

use serde::{Deserialize, Serialize};

use crate::Metadata;

/// A `[min, max]` value range mapped onto the full colour range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stretch {
    pub min: f64,
    pub max: f64,
}

impl Stretch {
    /// Range assumed while a dataset's metadata has not arrived yet.
    pub const NOMINAL: Stretch = Stretch { min: 0.0, max: 1.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Query-string form, e.g. `[0.5,120]`.
    pub fn to_param(&self) -> String {
        format!("[{},{}]", self.min, self.max)
    }

    /// Parse `"min,max"` or `"[min,max]"`. Both bounds must be finite.
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
        let (min, max) = inner.split_once(',')?;
        Self::from_bounds(min.trim().parse().ok()?, max.trim().parse().ok()?)
    }

    /// `None` when either bound is NaN or infinite.
    pub fn from_bounds(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite()).then(|| Self::new(min, max))
    }
}

impl std::fmt::Display for Stretch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_param())
    }
}

/// Default stretch for a dataset: clip two percentiles from each end.
///
/// With percentiles `p[0..n]` this is `[p[2], p[n-3]]`. Datasets reporting
/// fewer than five percentiles fall back to their full value range.
pub fn default_stretch(metadata: &Metadata) -> Stretch {
    let p = &metadata.percentiles;
    if p.len() >= 5 {
        Stretch::new(p[2], p[p.len() - 3])
    } else {
        Stretch::new(metadata.range[0], metadata.range[1])
    }
}
