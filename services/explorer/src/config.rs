//! Configuration loading and management.
//!
//! Values come from, lowest precedence first: built-in defaults, an
//! optional YAML file, then command line flags / environment variables
//! (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use explorer_client::urls::normalize_host;
use explorer_client::{ClientConfig, TileTarget};

/// Explorer settings, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Backend base URL.
    pub host: String,
    /// Datasets per listing page.
    pub page_size: u32,
    /// Colormap for new singleband selections.
    pub colormap: String,
    /// Thumbnail size as `[width, height]`.
    pub preview_size: [u32; 2],
    /// Samples requested when previewing a colormap.
    pub colormap_values: u32,
    pub request_timeout_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:5000".to_string(),
            page_size: 15,
            colormap: "viridis".to_string(),
            preview_size: [128, 128],
            colormap_values: 100,
            request_timeout_secs: 30,
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let mut config: ExplorerConfig = serde_yaml::from_str(content)?;
        config.host = normalize_host(&config.host);
        Ok(config)
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = normalize_host(host);
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            anyhow::bail!("host must not be empty");
        }
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            anyhow::bail!("host must start with http:// or https:// (got '{}')", self.host);
        }
        if self.page_size == 0 {
            anyhow::bail!("page_size must be > 0");
        }
        if self.preview_size.contains(&0) {
            anyhow::bail!("preview_size dimensions must be > 0");
        }
        if self.colormap.is_empty() {
            anyhow::bail!("colormap must not be empty");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.host).with_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn preview_target(&self) -> TileTarget {
        TileTarget::Preview {
            width: self.preview_size[0],
            height: self.preview_size[1],
        }
    }
}
