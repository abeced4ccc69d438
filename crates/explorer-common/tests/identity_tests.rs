//! Tests for dataset identities, listing records and stretch defaults.

use explorer_common::{default_stretch, DatasetIdentity, DatasetRecord, Key, Metadata, Stretch};
use test_utils::{assert_range_approx_eq, fixtures, linear_percentiles, metadata_json};

fn sample_keys() -> Vec<Key> {
    fixtures::KEY_NAMES.iter().map(|k| Key::new(*k)).collect()
}

fn metadata_with(percentiles: &[f64]) -> Metadata {
    serde_json::from_value(metadata_json(percentiles)).unwrap()
}

// ============================================================================
// DatasetIdentity tests
// ============================================================================

#[test]
fn test_cache_key_joins_in_order() {
    let id = DatasetIdentity::new(["landsat", "20240115", "red"]);
    assert_eq!(id.cache_key(), "landsat/20240115/red");
    assert_eq!(id.to_string(), "landsat/20240115/red");
    assert_eq!(id.len(), 3);
}

#[test]
fn test_order_matters() {
    let a = DatasetIdentity::new(["a", "b"]);
    let b = DatasetIdentity::new(["b", "a"]);
    assert_ne!(a, b);
    assert_ne!(a.cache_key(), b.cache_key());
}

#[test]
fn test_with_band_appends_band_value() {
    let index = vec!["landsat".to_string(), "20240115".to_string()];
    let id = DatasetIdentity::with_band(&index, "nir");
    assert_eq!(id.values(), ["landsat", "20240115", "nir"]);
}

#[test]
fn test_empty_identity() {
    let id = DatasetIdentity::new(Vec::<String>::new());
    assert!(id.is_empty());
    assert_eq!(id.cache_key(), "");
}

// ============================================================================
// DatasetRecord tests
// ============================================================================

#[test]
fn test_identity_from_record_follows_key_order() {
    let record: DatasetRecord =
        serde_json::from_value(fixtures::dataset_record(&["temp", "20240301", "t2m"])).unwrap();
    let id = DatasetIdentity::from_record(&record, &sample_keys()).unwrap();
    assert_eq!(id, DatasetIdentity::new(["temp", "20240301", "t2m"]));
}

#[test]
fn test_identity_from_incomplete_record() {
    let record: DatasetRecord = [("type", "temp"), ("date", "20240301")].into_iter().collect();
    assert!(DatasetIdentity::from_record(&record, &sample_keys()).is_none());
    assert_eq!(
        record.ordered_values(&sample_keys()),
        vec!["temp".to_string(), "20240301".to_string(), String::new()]
    );
}

#[test]
fn test_key_deserialize_sets_original() {
    let key: Key = serde_json::from_str(r#"{"key": "Date"}"#).unwrap();
    assert_eq!(key, Key::new("Date"));
    let described = Key::new("band").with_description("Spectral band");
    assert_eq!(described.original, "band");
}

// ============================================================================
// default_stretch tests
// ============================================================================

#[test]
fn test_default_stretch_ten_percentiles() {
    // p0..p9: clip lands on p2 and p7
    let meta = metadata_with(&linear_percentiles(10, 1.5));
    let stretch = default_stretch(&meta);
    assert_range_approx_eq!((stretch.min, stretch.max), (3.0, 10.5), 1e-9);
}

#[test]
fn test_default_stretch_fixture_percentiles() {
    let meta = metadata_with(&fixtures::PERCENTILES);
    assert_eq!(default_stretch(&meta), Stretch::new(20.0, 80.0));
}

#[test]
fn test_default_stretch_minimum_length() {
    let meta = metadata_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(default_stretch(&meta), Stretch::new(3.0, 3.0));
}

#[test]
fn test_default_stretch_falls_back_to_range() {
    let meta = metadata_with(&[2.0, 4.0, 8.0]);
    assert_eq!(default_stretch(&meta), Stretch::new(2.0, 8.0));
}

#[test]
fn test_default_stretch_without_percentiles() {
    let meta = metadata_with(&[]);
    assert_eq!(default_stretch(&meta), Stretch::NOMINAL);
}
