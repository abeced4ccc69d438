//! Endpoint URL construction.
//!
//! Every function here is pure: the same inputs always produce the same
//! bytes. Nothing is escaped and nothing is validated; callers must not ask
//! for a tile URL before the selection it depends on is complete.

use explorer_common::DatasetIdentity;

/// Ordered `name=value` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions(Vec<(String, String)>);

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which image a tile endpoint should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTarget {
    /// `{z}/{x}/{y}.png` template for a slippy map.
    Xyz,
    /// Single thumbnail image.
    Preview { width: u32, height: u32 },
}

/// Strip trailing slashes from a configured host.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

/// `{host}/datasets?limit=..&page=..&k=v...`; blank constraint values are left out.
pub fn datasets_url(host: &str, constraints: &[(String, String)], limit: u32, page: u32) -> String {
    let mut url = format!("{}/datasets?limit={}&page={}", host, limit, page);
    for (key, value) in constraints {
        if !value.is_empty() {
            url.push_str(&format!("&{}={}", key, value));
        }
    }
    url
}

/// `{host}/metadata/{v1}/{v2}/...`
pub fn metadata_url(host: &str, identity: &DatasetIdentity) -> String {
    format!("{}/metadata{}", host, path_segments(identity.values()))
}

/// Singleband tile template or preview URL.
pub fn singleband_tile_url(
    host: &str,
    identity: &DatasetIdentity,
    options: &QueryOptions,
    target: TileTarget,
) -> String {
    let mut url = format!("{}/singleband{}/{}", host, path_segments(identity.values()), suffix(target));
    append_options(&mut url, options.iter());
    url
}

/// RGB tile template or preview URL; `bands` are the red, green and blue band values.
pub fn rgb_tile_url(
    host: &str,
    index_keys: &[String],
    bands: &[String; 3],
    options: &QueryOptions,
    target: TileTarget,
) -> String {
    let mut url = format!("{}/rgb{}/{}", host, path_segments(index_keys), suffix(target));
    let channels = ["r", "g", "b"].into_iter().zip(bands.iter().map(String::as_str));
    append_options(&mut url, channels.chain(options.iter()));
    url
}

/// Colour ramp for a colormap sampled at `num_values` points over `[0,1]`.
pub fn colormap_url(host: &str, colormap: &str, num_values: u32) -> String {
    format!(
        "{}/colormap?colormap={}&stretch_range=[0,1]&num_values={}",
        host, colormap, num_values
    )
}

/// Fill a `{z}/{x}/{y}` template with a concrete tile.
pub fn xyz_tile_url(template: &str, z: u32, x: u32, y: u32) -> String {
    template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

fn path_segments(values: &[String]) -> String {
    values.iter().map(|v| format!("/{}", v)).collect()
}

fn suffix(target: TileTarget) -> String {
    match target {
        TileTarget::Xyz => "{z}/{x}/{y}.png".to_string(),
        TileTarget::Preview { width, height } => {
            format!("preview.png?tile_size=[{},{}]", width, height)
        }
    }
}

fn append_options<'a>(url: &mut String, options: impl Iterator<Item = (&'a str, &'a str)>) {
    for (name, value) in options {
        let sep = if url.contains('?') { '&' } else { '?' };
        url.push(sep);
        url.push_str(name);
        url.push('=');
        url.push_str(value);
    }
}
