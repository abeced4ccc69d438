//! End-to-end tests for the explorer session against the mock backend.

use std::time::Duration;

use explorer::repl;
use explorer::{Explorer, ExplorerConfig};
use explorer_common::{DatasetIdentity, ExplorerError, Stretch};
use explorer_state::{ActiveLayer, Channel, Transition};
use test_utils::MockBackend;

fn config(backend: &MockBackend) -> ExplorerConfig {
    ExplorerConfig::default().with_host(&backend.base_url())
}

async fn connected(backend: &MockBackend) -> Explorer {
    let mut explorer = Explorer::new(&config(backend)).unwrap();
    explorer.connect().await.unwrap();
    explorer
}

fn id(values: &[&str]) -> DatasetIdentity {
    DatasetIdentity::new(values.iter().copied())
}

fn singleband(explorer: &Explorer) -> explorer_state::SinglebandLayer {
    match explorer.active() {
        ActiveLayer::Singleband(layer) => layer.clone(),
        other => panic!("expected singleband, got {:?}", other),
    }
}

// ============================================================================
// Search and listing
// ============================================================================

#[tokio::test]
async fn test_load_page_prefetches_metadata() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let rows = explorer.load_page().await.unwrap().len();
    assert_eq!(rows, 6);
    assert_eq!(explorer.cache().len(), 6);
    assert_eq!(backend.request_count("/metadata/"), 6);

    // A second load only re-fetches the listing.
    explorer.load_page().await.unwrap();
    assert_eq!(backend.request_count("/metadata/"), 6);
    assert_eq!(backend.request_count("/datasets"), 2);
}

#[tokio::test]
async fn test_paging_through_results() {
    let backend = MockBackend::spawn().await;
    let config = ExplorerConfig { page_size: 2, ..config(&backend) };
    let mut explorer = Explorer::new(&config).unwrap();
    explorer.connect().await.unwrap();

    explorer.load_page().await.unwrap();
    assert_eq!(explorer.identity_at(0), Some(id(&["landsat", "20240115", "red"])));

    explorer.next_page().await.unwrap();
    assert_eq!(explorer.query().page(), 1);
    assert_eq!(explorer.identity_at(0), Some(id(&["landsat", "20240115", "blue"])));

    explorer.set_page(2).await.unwrap();
    assert_eq!(explorer.identity_at(1), Some(id(&["temp", "20240301", "t2m"])));

    explorer.previous_page().await.unwrap();
    assert_eq!(explorer.query().page(), 1);
    assert!(backend.requests().contains(&"/datasets?limit=2&page=2".to_string()));
}

#[tokio::test]
async fn test_search_filters_and_resets_page() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.set_page(1).await.unwrap();

    let changed = explorer
        .search(&[("type".to_string(), "landsat".to_string())])
        .unwrap();
    assert!(changed);
    assert_eq!(explorer.query().page(), 0);
    assert_eq!(explorer.load_page().await.unwrap().len(), 4);

    assert!(!explorer.set_constraint("type", "landsat").unwrap());
    assert!(explorer.clear_search());
    assert_eq!(explorer.load_page().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_unknown_key_is_rejected() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let err = explorer.set_constraint("sensor", "landsat").unwrap_err();
    assert!(matches!(err, ExplorerError::InvalidParameter { .. }));
    assert_eq!(explorer.errors().len(), 1);
    assert!(explorer.query().constraints().is_empty());
}

#[tokio::test]
async fn test_search_change_clears_active_layer() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();
    explorer.select_row(0).await.unwrap();
    assert!(!explorer.active().is_none());

    explorer.set_constraint("date", "20240115").unwrap();
    assert!(explorer.active().is_none());
}

#[tokio::test]
async fn test_search_with_unknown_key_applies_nothing() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();
    explorer.select_row(0).await.unwrap();

    let err = explorer
        .search(&[
            ("type".to_string(), "temp".to_string()),
            ("sensor".to_string(), "x".to_string()),
        ])
        .unwrap_err();
    assert!(matches!(err, ExplorerError::InvalidParameter { ref param, .. } if param == "sensor"));
    assert!(explorer.query().constraints().is_empty());
    assert!(!explorer.active().is_none());
    assert_eq!(explorer.results().len(), 6);
}

#[tokio::test]
async fn test_blank_constraint_on_unset_key_keeps_layer() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();
    explorer.select_row(0).await.unwrap();
    let url = explorer.query().url(explorer.host());

    assert!(!explorer.set_constraint("date", "").unwrap());
    assert!(!explorer.active().is_none());
    assert_eq!(explorer.query().url(explorer.host()), url);
}

// ============================================================================
// Singleband
// ============================================================================

#[tokio::test]
async fn test_select_row_uses_cached_metadata() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();
    let fetched = backend.request_count("/metadata/");

    assert_eq!(explorer.select_row(0).await.unwrap(), Transition::Activated);
    assert_eq!(backend.request_count("/metadata/"), fetched);

    let layer = singleband(&explorer);
    assert_eq!(layer.stretch, Stretch::new(20.0, 80.0));
    assert!(!layer.provisional);
    assert_eq!(
        explorer.tile_url().unwrap(),
        format!(
            "{}/singleband/landsat/20240115/red/{{z}}/{{x}}/{{y}}.png?colormap=viridis&stretch_range=[20,80]",
            backend.base_url()
        )
    );

    // Same row again switches it off.
    assert_eq!(explorer.select_row(0).await.unwrap(), Transition::Deactivated);
    assert!(explorer.tile_url().is_none());
}

#[tokio::test]
async fn test_select_uncached_fetches_then_refreshes_stretch() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let dataset = id(&["temp", "20240301", "t2m"]);
    explorer.select_singleband(dataset.clone()).await.unwrap();

    assert!(explorer.metadata(&dataset).is_some());
    let layer = singleband(&explorer);
    assert_eq!(layer.stretch, Stretch::new(20.0, 80.0));
    assert!(!layer.provisional);
}

#[tokio::test]
async fn test_metadata_failure_keeps_nominal_stretch() {
    let backend = MockBackend::spawn().await;
    backend.fail_metadata("temp/20240301/t2m");
    let mut explorer = connected(&backend).await;

    explorer
        .select_singleband(id(&["temp", "20240301", "t2m"]))
        .await
        .unwrap();

    let layer = singleband(&explorer);
    assert_eq!(layer.stretch, Stretch::NOMINAL);
    assert!(layer.provisional);
    assert_eq!(explorer.errors().len(), 1);
    assert!(explorer.errors().entries()[0].message.contains("500"));
}

#[tokio::test]
async fn test_prefetch_failures_are_listed_and_dismissable() {
    let backend = MockBackend::spawn().await;
    backend.remove_metadata("sentinel/20240201/red");
    let mut explorer = connected(&backend).await;

    explorer.load_page().await.unwrap();
    assert_eq!(explorer.cache().len(), 5);
    let entry = explorer.errors().entries()[0].clone();
    assert!(entry.message.contains("sentinel/20240201/red"));

    assert!(explorer.dismiss_error(entry.id));
    assert!(!explorer.dismiss_error(entry.id));
    assert!(explorer.errors().is_empty());
}

#[tokio::test]
async fn test_colormap_before_selection_sets_default() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();

    assert_eq!(explorer.set_colormap("magma").unwrap(), Transition::Unchanged);
    explorer.select_row(5).await.unwrap();
    assert_eq!(singleband(&explorer).colormap, "magma");

    assert_eq!(explorer.set_colormap("inferno").unwrap(), Transition::Updated);
    explorer.set_stretch(Stretch::new(-5.0, 5.0)).unwrap();
    assert!(explorer
        .tile_url()
        .unwrap()
        .ends_with("?colormap=inferno&stretch_range=[-5,5]"));
}

#[tokio::test]
async fn test_stretch_without_layer_is_recorded() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    assert!(explorer.set_stretch(Stretch::NOMINAL).is_err());
    assert!(explorer.set_rgb_stretch(Channel::Red, Stretch::NOMINAL).is_err());
    assert_eq!(explorer.errors().len(), 2);
}

// ============================================================================
// RGB
// ============================================================================

#[tokio::test]
async fn test_rgb_needs_index_keys() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.set_constraint("type", "landsat").unwrap();

    let err = explorer.select_rgb_band(Channel::Red, "red").await.unwrap_err();
    assert!(matches!(err, ExplorerError::IncompleteSelection(_)));
    assert!(explorer.layers().rgb_selection().band(Channel::Red).is_none());
    assert_eq!(explorer.errors().len(), 1);
}

#[tokio::test]
async fn test_rgb_composite_activates_after_three_bands() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer
        .search(&[
            ("type".to_string(), "landsat".to_string()),
            ("date".to_string(), "20240115".to_string()),
        ])
        .unwrap();

    assert_eq!(explorer.select_rgb_band(Channel::Red, "nir").await.unwrap(), Transition::Pending);
    assert_eq!(explorer.select_rgb_band(Channel::Green, "red").await.unwrap(), Transition::Pending);
    assert!(explorer.active().is_none());
    assert_eq!(
        explorer.select_rgb_band(Channel::Blue, "green").await.unwrap(),
        Transition::Activated
    );

    assert_eq!(
        explorer.tile_url().unwrap(),
        format!(
            "{}/rgb/landsat/20240115/{{z}}/{{x}}/{{y}}.png?r=nir&g=red&b=green&r_range=[20,80]&g_range=[20,80]&b_range=[20,80]",
            backend.base_url()
        )
    );

    explorer.set_rgb_stretch(Channel::Green, Stretch::new(0.0, 255.0)).unwrap();
    let preview = explorer.active_preview_url().unwrap();
    assert!(preview.contains("/rgb/landsat/20240115/preview.png?tile_size=[128,128]&r=nir"));
    assert!(preview.contains("g_range=[0,255]"));
}

#[tokio::test]
async fn test_rgb_band_waits_for_slow_metadata() {
    let backend = MockBackend::spawn().await;
    backend.delay_metadata("landsat/20240115/blue", Duration::from_millis(100));
    let mut explorer = connected(&backend).await;
    explorer.set_constraint("type", "landsat").unwrap();
    explorer.set_constraint("date", "20240115").unwrap();

    explorer.select_rgb_band(Channel::Red, "red").await.unwrap();
    explorer.select_rgb_band(Channel::Green, "green").await.unwrap();
    explorer.select_rgb_band(Channel::Blue, "blue").await.unwrap();

    match explorer.active() {
        ActiveLayer::Rgb(layer) => assert_eq!(layer.provisional, [false, false, false]),
        other => panic!("expected rgb, got {:?}", other),
    }
}

// ============================================================================
// Rendering helpers and change notification
// ============================================================================

#[tokio::test]
async fn test_preview_url_for_any_dataset() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let dataset = id(&["landsat", "20240115", "nir"]);
    assert_eq!(
        explorer.preview_url(&dataset),
        format!(
            "{}/singleband/landsat/20240115/nir/preview.png?tile_size=[128,128]&colormap=viridis",
            backend.base_url()
        )
    );

    explorer.load_page().await.unwrap();
    assert!(explorer.preview_url(&dataset).ends_with("&stretch_range=[20,80]"));

    let url = explorer.preview_url(&dataset);
    let bytes = explorer.fetch_image(&url).await.unwrap();
    assert_eq!(bytes, test_utils::fixtures::PNG_BYTES);
}

#[tokio::test]
async fn test_colormap_preview_uses_configured_sample_count() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let entries = explorer.colormap_preview("greys").await.unwrap();
    assert_eq!(entries.len(), 100);
    assert_eq!(entries[99].hex(), "#ffffff");
}

#[tokio::test]
async fn test_state_changes_bump_revision() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    let mut rx = explorer.subscribe();
    let _ = rx.borrow_and_update();

    explorer.select_singleband(id(&["temp", "20240301", "t2m"])).await.unwrap();
    assert!(rx.has_changed().unwrap());
    let after_select = *rx.borrow_and_update();

    assert_eq!(explorer.clear_layer(), Transition::Deactivated);
    assert!(*rx.borrow_and_update() > after_select);

    // Nothing to clear: no new revision.
    assert_eq!(explorer.clear_layer(), Transition::Unchanged);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_unreachable_backend_is_recorded() {
    let config = ExplorerConfig::default().with_host("http://127.0.0.1:1");
    let mut explorer = Explorer::new(&config).unwrap();

    let err = explorer.connect().await.unwrap_err();
    assert!(matches!(err, ExplorerError::Transport(_) | ExplorerError::Timeout));
    assert_eq!(explorer.errors().len(), 1);
    assert!(explorer.keys().is_empty());
}

// ============================================================================
// Interactive loop
// ============================================================================

#[tokio::test]
async fn test_scripted_session() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;

    let script = "\
search type=temp
select 0
url
stretch 1 2
bogus
band r red
clear
state
quit
select 0
";
    let mut out = Vec::new();
    repl::run(&mut explorer, script.as_bytes(), &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("t2m"));
    assert!(out.contains("singleband layer active"));
    assert!(out.contains("/singleband/temp/20240301/t2m/preview.png?tile_size=[128,128]"));
    assert!(out.contains("stretch_range=[1,2]"));
    assert!(out.contains("error: unknown command 'bogus'"));
    assert!(out.contains("error: Incomplete selection"));
    assert!(out.contains("layer removed"));
    assert!(out.contains("Active layer: none"));

    // Nothing after quit runs.
    assert!(explorer.active().is_none());
}

#[tokio::test]
async fn test_colormap_change_reported_when_preview_fails() {
    let backend = MockBackend::spawn().await;
    backend.fail_colormap();
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();

    let script = "select 0\ncolormap magma\n";
    let mut out = Vec::new();
    repl::run(&mut explorer, script.as_bytes(), &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("layer updated"));
    assert!(out.contains("colormap=magma"));
    assert!(out.contains("error: colormap preview unavailable: Server returned HTTP 503"));
    assert_eq!(singleband(&explorer).colormap, "magma");
    assert_eq!(explorer.errors().len(), 1);
}

#[tokio::test]
async fn test_scripted_search_with_unknown_key_keeps_listing() {
    let backend = MockBackend::spawn().await;
    let mut explorer = connected(&backend).await;
    explorer.load_page().await.unwrap();

    let script = "search type=temp sensor=x\nlist\n";
    let mut out = Vec::new();
    repl::run(&mut explorer, script.as_bytes(), &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("error: Invalid parameter value for 'sensor'"));
    assert!(out.contains("Page 0 (15 per page, 6 shown)"));
    assert!(!out.contains("where type=temp"));
}
