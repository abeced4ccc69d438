//! In-process mock of the tile backend.
//!
//! Serves the sample fixtures over real HTTP on `127.0.0.1:0` so client
//! code can be exercised end to end. Every request path (with query) is
//! recorded for assertions.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::fixtures::{colormap_json, dataset_record, keys_json, sample_metadata, DATASETS, KEY_NAMES, PNG_BYTES};

#[derive(Default)]
struct BackendState {
    datasets: Vec<Vec<String>>,
    metadata: HashMap<String, Value>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    colormap_down: bool,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<BackendState>>;

/// A running mock backend. The server task lives until the runtime shuts down.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
}

impl MockBackend {
    /// Start a backend preloaded with the sample datasets and their metadata.
    pub async fn spawn() -> Self {
        let mut state = BackendState::default();
        for ds in DATASETS {
            state.datasets.push(ds.iter().map(|s| s.to_string()).collect());
            state.metadata.insert(ds.join("/"), sample_metadata(&ds));
        }
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/keys", get(keys_handler))
            .route("/datasets", get(datasets_handler))
            .route("/metadata/*path", get(metadata_handler))
            .route("/colormap", get(colormap_handler))
            .route("/singleband/*path", get(image_handler))
            .route("/rgb/*path", get(image_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace (or add) the metadata served for `path` (values joined with `/`).
    pub fn insert_metadata(&self, path: &str, body: Value) {
        self.lock().metadata.insert(path.to_string(), body);
    }

    pub fn remove_metadata(&self, path: &str) {
        self.lock().metadata.remove(path);
    }

    /// Answer `path` with HTTP 500 until [`MockBackend::recover_metadata`].
    pub fn fail_metadata(&self, path: &str) {
        self.lock().failing.insert(path.to_string());
    }

    pub fn recover_metadata(&self, path: &str) {
        self.lock().failing.remove(path);
    }

    /// Hold the metadata response for `path` for `delay`.
    pub fn delay_metadata(&self, path: &str, delay: Duration) {
        self.lock().delays.insert(path.to_string(), delay);
    }

    /// Answer every `/colormap` request with HTTP 503.
    pub fn fail_colormap(&self) {
        self.lock().colormap_down = true;
    }

    /// All requests seen so far, as path plus query.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Number of requests whose path starts with `prefix`.
    pub fn request_count(&self, prefix: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.starts_with(prefix)).count()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn record<'a>(state: &'a Shared, uri: &Uri) -> MutexGuard<'a, BackendState> {
    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
    let pq = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    guard.requests.push(pq.to_string());
    guard
}

async fn keys_handler(State(state): State<Shared>, uri: Uri) -> Json<Value> {
    drop(record(&state, &uri));
    Json(keys_json())
}

async fn datasets_handler(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let guard = record(&state, &uri);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(0);

    let matching: Vec<Value> = guard
        .datasets
        .iter()
        .filter(|ds| {
            KEY_NAMES
                .iter()
                .zip(ds.iter())
                .all(|(k, v)| params.get(*k).map_or(true, |want| want == v))
        })
        .skip(page * limit)
        .take(limit)
        .map(|ds| dataset_record(&ds.iter().map(String::as_str).collect::<Vec<_>>()))
        .collect();

    Json(json!({ "page": page, "limit": limit, "datasets": matching }))
}

async fn metadata_handler(
    State(state): State<Shared>,
    uri: Uri,
    Path(path): Path<String>,
) -> Response {
    let (delay, outcome) = {
        let guard = record(&state, &uri);
        let delay = guard.delays.get(&path).copied();
        let outcome = if guard.failing.contains(&path) {
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        } else {
            guard.metadata.get(&path).cloned().ok_or(StatusCode::NOT_FOUND)
        };
        (delay, outcome)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match outcome {
        Ok(body) => Json(body).into_response(),
        Err(status) if status == StatusCode::NOT_FOUND => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("No dataset found for given keys {}", path) })),
        )
            .into_response(),
        Err(status) => (status, "internal error").into_response(),
    }
}

async fn colormap_handler(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if record(&state, &uri).colormap_down {
        return (StatusCode::SERVICE_UNAVAILABLE, "colormap service down").into_response();
    }
    let n = params.get("num_values").and_then(|v| v.parse().ok()).unwrap_or(255);
    Json(colormap_json(n)).into_response()
}

async fn image_handler(State(state): State<Shared>, uri: Uri) -> Response {
    drop(record(&state, &uri));
    ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
}
