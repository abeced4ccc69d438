//! Session-lifetime metadata cache.
//!
//! Entries are keyed by [`DatasetIdentity::cache_key`], written once and
//! never evicted. Growth is bounded in practice by how many datasets a user
//! pages through. Lookups never touch the network; only
//! [`MetadataCache::fetch_and_store`] does.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use explorer_common::{DatasetIdentity, ExplorerResult, Metadata};

use crate::client::TileClient;

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, Arc<Metadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata for `identity`, if any.
    pub fn get(&self, identity: &DatasetIdentity) -> Option<Arc<Metadata>> {
        self.read().get(&identity.cache_key()).cloned()
    }

    pub fn contains(&self, identity: &DatasetIdentity) -> bool {
        self.read().contains_key(&identity.cache_key())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Store metadata; the first value stored for an identity wins.
    pub fn insert(&self, identity: &DatasetIdentity, metadata: Metadata) -> Arc<Metadata> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(identity.cache_key())
            .or_insert_with(|| Arc::new(metadata))
            .clone()
    }

    /// Fetch metadata from the backend and cache it.
    ///
    /// Resolves with the same `Arc` a later [`MetadataCache::get`] returns.
    /// On failure nothing is stored, so the next call starts from scratch.
    pub async fn fetch_and_store(
        &self,
        client: &TileClient,
        identity: &DatasetIdentity,
    ) -> ExplorerResult<Arc<Metadata>> {
        match client.metadata(identity).await {
            Ok(metadata) => {
                debug!(dataset = %identity, "Metadata cached");
                Ok(self.insert(identity, metadata))
            }
            Err(e) => {
                warn!(dataset = %identity, error = %e, "Metadata fetch failed");
                Err(e)
            }
        }
    }

    /// Cached metadata, fetching it first when missing.
    pub async fn get_or_fetch(
        &self,
        client: &TileClient,
        identity: &DatasetIdentity,
    ) -> ExplorerResult<Arc<Metadata>> {
        match self.get(identity) {
            Some(hit) => Ok(hit),
            None => self.fetch_and_store(client, identity).await,
        }
    }

    /// Fetch every uncached identity concurrently.
    ///
    /// Results come back in input order, whatever order the responses
    /// arrived in. Already cached identities are skipped.
    pub async fn prefetch(
        &self,
        client: &TileClient,
        identities: &[DatasetIdentity],
    ) -> Vec<(DatasetIdentity, ExplorerResult<Arc<Metadata>>)> {
        let missing: Vec<&DatasetIdentity> = identities.iter().filter(|id| !self.contains(id)).collect();
        let fetches = missing.iter().map(|id| self.fetch_and_store(client, *id));
        let results = join_all(fetches).await;
        missing.into_iter().cloned().zip(results).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Metadata>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }
}
