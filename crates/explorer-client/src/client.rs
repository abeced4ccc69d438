//! Async HTTP access to the tile backend's REST API.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use explorer_common::{
    ApiMessage, ColormapEntry, ColormapResponse, DatasetIdentity, DatasetsResponse, ExplorerError,
    ExplorerResult, Key, KeysResponse, Metadata,
};

use crate::query::DatasetQuery;
use crate::urls::{colormap_url, metadata_url, normalize_host};

/// Connection settings for [`TileClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            host: normalize_host(host.as_ref()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Thin JSON-over-GET client. Every call is independent; nothing is retried.
#[derive(Debug, Clone)]
pub struct TileClient {
    http: reqwest::Client,
    host: String,
}

impl TileClient {
    pub fn new(config: ClientConfig) -> ExplorerResult<Self> {
        if config.host.is_empty() {
            return Err(ExplorerError::Config("host must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExplorerError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            host: config.host,
        })
    }

    /// Base URL with trailing slashes removed.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `GET /keys`
    pub async fn keys(&self) -> ExplorerResult<Vec<Key>> {
        let resp: KeysResponse = self.get_json(&format!("{}/keys", self.host)).await?;
        Ok(resp.keys)
    }

    /// `GET /datasets` for the query's current page.
    pub async fn datasets(&self, query: &DatasetQuery) -> ExplorerResult<DatasetsResponse> {
        self.get_json(&query.url(&self.host)).await
    }

    /// `GET /metadata/...`
    pub async fn metadata(&self, identity: &DatasetIdentity) -> ExplorerResult<Metadata> {
        self.get_json(&metadata_url(&self.host, identity)).await
    }

    /// `GET /colormap`
    pub async fn colormap(&self, colormap: &str, num_values: u32) -> ExplorerResult<Vec<ColormapEntry>> {
        let resp: ColormapResponse = self
            .get_json(&colormap_url(&self.host, colormap, num_values))
            .await?;
        Ok(resp.colormap)
    }

    /// Raw bytes of a rendered tile or preview.
    pub async fn image(&self, url: &str) -> ExplorerResult<Bytes> {
        let response = self.send(url).await?;
        response.bytes().await.map_err(transport_error)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ExplorerResult<T> {
        let response = self.send(url).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, url: &str) -> ExplorerResult<reqwest::Response> {
        let start = Instant::now();
        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request failed");
            transport_error(e)
        })?;

        let status = response.status();
        debug!(
            url = %url,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "GET"
        );

        if status.is_success() {
            return Ok(response);
        }

        // Error bodies are usually `{"message": "..."}`; fall back to raw text.
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiMessage>(&text)
            .map(|m| m.message)
            .unwrap_or(text);

        if status == reqwest::StatusCode::NOT_FOUND {
            Err(ExplorerError::NotFound(if message.is_empty() {
                url.to_string()
            } else {
                message
            }))
        } else {
            Err(ExplorerError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn transport_error(err: reqwest::Error) -> ExplorerError {
    if err.is_timeout() {
        ExplorerError::Timeout
    } else {
        ExplorerError::Transport(err.to_string())
    }
}
