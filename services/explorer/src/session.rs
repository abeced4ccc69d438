//! Explorer session: one connection to a backend plus all UI state.
//!
//! State transitions themselves are synchronous. Network calls happen
//! between transitions, and their results are applied as fresh
//! transitions. Every change bumps a revision counter that views can
//! watch to know when to redraw.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use explorer_client::urls::singleband_tile_url;
use explorer_client::{DatasetQuery, MetadataCache, QueryOptions, TileClient, TileTarget};
use explorer_common::{
    default_stretch, ColormapEntry, DatasetIdentity, DatasetRecord, ExplorerError, ExplorerResult, Key,
    Metadata, Stretch,
};
use explorer_state::{ActiveLayer, Channel, ErrorLog, LayerState, Transition};

use crate::config::ExplorerConfig;

pub struct Explorer {
    client: TileClient,
    cache: Arc<MetadataCache>,
    layers: LayerState,
    errors: ErrorLog,
    keys: Vec<Key>,
    query: DatasetQuery,
    results: Vec<DatasetRecord>,
    preview: TileTarget,
    colormap_values: u32,
    revision: watch::Sender<u64>,
}

impl Explorer {
    pub fn new(config: &ExplorerConfig) -> ExplorerResult<Self> {
        let client = TileClient::new(config.client_config())?;
        let (revision, _) = watch::channel(0);
        Ok(Self {
            client,
            cache: Arc::new(MetadataCache::new()),
            layers: LayerState::new(config.colormap.clone()),
            errors: ErrorLog::new(),
            keys: Vec::new(),
            query: DatasetQuery::new(config.page_size),
            results: Vec::new(),
            preview: config.preview_target(),
            colormap_values: config.colormap_values,
            revision,
        })
    }

    /// Fetch the key list. Keys are fixed for the rest of the session.
    pub async fn connect(&mut self) -> ExplorerResult<&[Key]> {
        let keys = match self.client.keys().await {
            Ok(keys) => keys,
            Err(e) => return Err(self.record(e)),
        };
        info!(host = %self.client.host(), keys = keys.len(), "Connected");
        self.keys = keys;
        self.touch();
        Ok(&self.keys)
    }

    pub fn host(&self) -> &str {
        self.client.host()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn query(&self) -> &DatasetQuery {
        &self.query
    }

    pub fn results(&self) -> &[DatasetRecord] {
        &self.results
    }

    pub fn layers(&self) -> &LayerState {
        &self.layers
    }

    pub fn active(&self) -> &ActiveLayer {
        self.layers.active()
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn metadata(&self, identity: &DatasetIdentity) -> Option<Arc<Metadata>> {
        self.cache.get(identity)
    }

    /// Receiver that sees a new value after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // === Search ===

    /// Set one key constraint (`""` clears it).
    ///
    /// A changed query invalidates whatever layer is displayed.
    pub fn set_constraint(&mut self, key: &str, value: &str) -> ExplorerResult<bool> {
        self.search(&[(key.to_string(), value.to_string())])
    }

    /// Apply several constraints at once. Nothing is applied unless every
    /// key is valid.
    pub fn search(&mut self, constraints: &[(String, String)]) -> ExplorerResult<bool> {
        let unknown = constraints
            .iter()
            .find(|(key, _)| !self.is_key(key))
            .map(|(key, _)| key.clone());
        if let Some(key) = unknown {
            return Err(self.record(ExplorerError::InvalidParameter {
                param: key,
                message: "not a dataset key".to_string(),
            }));
        }

        let mut changed = false;
        for (key, value) in constraints {
            if self.query.set_constraint(key, value) {
                debug!(key = %key, value = %value, "Search constraint changed");
                changed = true;
            }
        }
        if changed {
            self.layers.clear();
            self.touch();
        }
        Ok(changed)
    }

    /// Any key is accepted until the key list has been loaded.
    fn is_key(&self, key: &str) -> bool {
        self.keys.is_empty() || self.keys.iter().any(|k| k.original == key)
    }

    pub fn clear_search(&mut self) -> bool {
        if !self.query.clear_constraints() {
            return false;
        }
        self.layers.clear();
        self.touch();
        true
    }

    /// Fetch the current page and prefetch metadata for every listed dataset.
    pub async fn load_page(&mut self) -> ExplorerResult<&[DatasetRecord]> {
        let page = match self.client.datasets(&self.query).await {
            Ok(page) => page,
            Err(e) => {
                self.results.clear();
                self.touch();
                return Err(self.record(e));
            }
        };
        debug!(page = page.page, count = page.datasets.len(), "Dataset page loaded");
        self.results = page.datasets;
        self.touch();

        let identities: Vec<DatasetIdentity> = self
            .results
            .iter()
            .filter_map(|r| DatasetIdentity::from_record(r, &self.keys))
            .collect();
        let fetched = self.cache.prefetch(&self.client, &identities).await;
        for (identity, result) in fetched {
            match result {
                Ok(meta) => {
                    if self.layers.refresh_stretch(&identity, &meta).changed() {
                        self.touch();
                    }
                }
                Err(e) => {
                    // Listing stays usable; only this row lacks a stretch.
                    self.errors.push(format!("metadata for {}: {}", identity, e));
                    self.touch();
                }
            }
        }
        Ok(&self.results)
    }

    pub async fn set_page(&mut self, page: u32) -> ExplorerResult<&[DatasetRecord]> {
        self.query.set_page(page);
        self.load_page().await
    }

    pub async fn next_page(&mut self) -> ExplorerResult<&[DatasetRecord]> {
        self.query.next_page();
        self.load_page().await
    }

    pub async fn previous_page(&mut self) -> ExplorerResult<&[DatasetRecord]> {
        self.query.previous_page();
        self.load_page().await
    }

    /// Identity of the `row`th dataset on the current page.
    pub fn identity_at(&self, row: usize) -> Option<DatasetIdentity> {
        self.results
            .get(row)
            .and_then(|r| DatasetIdentity::from_record(r, &self.keys))
    }

    // === Layer selection ===

    /// Toggle a singleband layer, fetching its metadata if needed.
    pub async fn select_singleband(&mut self, identity: DatasetIdentity) -> ExplorerResult<Transition> {
        let cached = self.cache.get(&identity);
        let transition = self.layers.select_singleband(identity.clone(), cached.as_deref());
        self.touch();

        if transition == Transition::Activated && cached.is_none() {
            self.resolve_stretch(&identity).await;
        }
        Ok(transition)
    }

    pub async fn select_row(&mut self, row: usize) -> ExplorerResult<Transition> {
        let identity = self.identity_at(row).ok_or_else(|| {
            self.record(ExplorerError::InvalidParameter {
                param: "row".to_string(),
                message: format!("no dataset at row {} on this page", row),
            })
        })?;
        self.select_singleband(identity).await
    }

    /// Assign a band to one RGB channel.
    ///
    /// The last key is the band dimension; every other key must already be
    /// constrained, those values form the RGB index.
    pub async fn select_rgb_band(&mut self, channel: Channel, band: &str) -> ExplorerResult<Transition> {
        let index_keys = self.rgb_index_keys().map_err(|e| self.record(e))?;
        let identity = DatasetIdentity::with_band(&index_keys, band);
        let cached = self.cache.get(&identity);
        let transition = self
            .layers
            .select_rgb_band(&index_keys, channel, band, cached.as_deref());
        self.touch();

        if cached.is_none() {
            self.resolve_stretch(&identity).await;
        }
        Ok(transition)
    }

    /// Values of all non-band keys, if each one is constrained.
    pub fn rgb_index_keys(&self) -> ExplorerResult<Vec<String>> {
        let Some((band_key, index)) = self.keys.split_last() else {
            return Err(ExplorerError::IncompleteSelection("keys not loaded".to_string()));
        };
        if !self.query.is_complete_except(&self.keys, &band_key.original) {
            return Err(ExplorerError::IncompleteSelection(format!(
                "set every key except '{}' before choosing RGB bands",
                band_key.original
            )));
        }
        self.query
            .values_for(index)
            .ok_or_else(|| ExplorerError::IncompleteSelection("search keys incomplete".to_string()))
    }

    /// Change the colormap. Without an active singleband layer this only
    /// changes what the next selection will use.
    pub fn set_colormap(&mut self, colormap: &str) -> ExplorerResult<Transition> {
        let transition = if matches!(self.layers.active(), ActiveLayer::Singleband(_)) {
            self.layers.set_colormap(colormap).map_err(|e| self.record(e))?
        } else {
            self.layers.set_default_colormap(colormap);
            Transition::Unchanged
        };
        self.touch();
        Ok(transition)
    }

    pub fn set_stretch(&mut self, stretch: Stretch) -> ExplorerResult<Transition> {
        let transition = self.layers.set_stretch(stretch).map_err(|e| self.record(e))?;
        self.touch();
        Ok(transition)
    }

    pub fn set_rgb_stretch(&mut self, channel: Channel, stretch: Stretch) -> ExplorerResult<Transition> {
        let transition = self
            .layers
            .set_rgb_stretch(channel, stretch)
            .map_err(|e| self.record(e))?;
        self.touch();
        Ok(transition)
    }

    pub fn clear_layer(&mut self) -> Transition {
        let transition = self.layers.clear();
        if transition.changed() {
            self.touch();
        }
        transition
    }

    // === Rendering ===

    /// `{z}/{x}/{y}` template of the displayed layer.
    pub fn tile_url(&self) -> Option<String> {
        self.layers.tile_url(self.client.host(), TileTarget::Xyz)
    }

    /// Thumbnail of the displayed layer.
    pub fn active_preview_url(&self) -> Option<String> {
        self.layers.tile_url(self.client.host(), self.preview)
    }

    /// Thumbnail of any dataset with the current colormap, stretched if its
    /// metadata is cached.
    pub fn preview_url(&self, identity: &DatasetIdentity) -> String {
        let mut options = QueryOptions::new().with("colormap", self.layers.colormap());
        if let Some(meta) = self.cache.get(identity) {
            options.push("stretch_range", default_stretch(&meta).to_param());
        }
        singleband_tile_url(self.client.host(), identity, &options, self.preview)
    }

    pub async fn colormap_preview(&mut self, colormap: &str) -> ExplorerResult<Vec<ColormapEntry>> {
        let result = self.client.colormap(colormap, self.colormap_values).await;
        result.map_err(|e| self.record(e))
    }

    pub async fn fetch_image(&mut self, url: &str) -> ExplorerResult<Vec<u8>> {
        let result = self.client.image(url).await;
        match result {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => Err(self.record(e)),
        }
    }

    // === Errors ===

    pub fn dismiss_error(&mut self, id: u64) -> bool {
        let dismissed = self.errors.dismiss(id);
        if dismissed {
            self.touch();
        }
        dismissed
    }

    async fn resolve_stretch(&mut self, identity: &DatasetIdentity) {
        match self.cache.fetch_and_store(&self.client, identity).await {
            Ok(meta) => {
                if self.layers.refresh_stretch(identity, &meta).changed() {
                    self.touch();
                }
            }
            Err(e) => {
                self.record(e);
            }
        }
    }

    /// Surface an error in the list and hand it back to the caller.
    fn record(&mut self, err: ExplorerError) -> ExplorerError {
        warn!(error = %err, "Explorer error");
        self.errors.push(err.to_string());
        self.touch();
        err
    }

    fn touch(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
