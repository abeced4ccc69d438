//! Dataset keys and composite dataset identities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One named dimension of a dataset's composite identifier (e.g. "type", "date", "band").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireKey")]
pub struct Key {
    pub key: String,
    pub description: Option<String>,
    /// Key name exactly as served by `/keys`.
    pub original: String,
}

#[derive(Deserialize)]
struct WireKey {
    key: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<WireKey> for Key {
    fn from(wire: WireKey) -> Self {
        Self {
            original: wire.key.clone(),
            key: wire.key,
            description: wire.description,
        }
    }
}

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            original: key.clone(),
            key,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered key values uniquely selecting one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetIdentity(pub Vec<String>);

impl DatasetIdentity {
    pub const SEPARATOR: &'static str = "/";

    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// Build an identity from a listing record, in key order.
    ///
    /// Returns `None` if the record lacks a value for any key.
    pub fn from_record(record: &DatasetRecord, keys: &[Key]) -> Option<Self> {
        keys.iter()
            .map(|k| record.get(&k.original).map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Serialized form used to key the metadata cache.
    pub fn cache_key(&self) -> String {
        self.0.join(Self::SEPARATOR)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity of one RGB band: the index keys followed by the band value.
    pub fn with_band(index_keys: &[String], band: &str) -> Self {
        let mut values = index_keys.to_vec();
        values.push(band.to_string());
        Self(values)
    }
}

impl std::fmt::Display for DatasetIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

/// One dataset entry from a `/datasets` listing, keyed by key name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetRecord(pub HashMap<String, String>);

impl DatasetRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Values in the order of `keys`, blank where missing.
    pub fn ordered_values(&self, keys: &[Key]) -> Vec<String> {
        keys.iter()
            .map(|k| self.get(&k.original).unwrap_or_default().to_string())
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DatasetRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
