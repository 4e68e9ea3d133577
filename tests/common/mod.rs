//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::time::Instant;

use banter_uploader::backend::{
    AssetBackend, BackendError, BackendIdentity, ComponentRecord, EntityRecord,
    ReachabilityProbe, SceneRegistry, StoreRequest, StoredAsset,
};

/// In-process backend with scripted store, registry and probe results.
pub struct ScriptedBackend {
    identity: BackendIdentity,
    with_registry: bool,
    store_script: Mutex<VecDeque<BackendError>>,
    store_fallback: Mutex<Option<BackendError>>,
    component_failure: Mutex<Option<BackendError>>,
    entity_failure: Mutex<Option<BackendError>>,
    probe_result: Mutex<Result<bool, BackendError>>,

    pub store_calls: AtomicU32,
    pub probe_calls: AtomicU32,
    pub store_times: Mutex<Vec<Instant>>,
    pub components: Mutex<Vec<ComponentRecord>>,
    pub component_calls: AtomicU32,
    pub entities: Mutex<Vec<(String, EntityRecord)>>,
    pub entity_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            identity: BackendIdentity::new("scripted:test"),
            with_registry: true,
            store_script: Mutex::new(VecDeque::new()),
            store_fallback: Mutex::new(None),
            component_failure: Mutex::new(None),
            entity_failure: Mutex::new(None),
            probe_result: Mutex::new(Ok(true)),
            store_calls: AtomicU32::new(0),
            probe_calls: AtomicU32::new(0),
            store_times: Mutex::new(Vec::new()),
            components: Mutex::new(Vec::new()),
            component_calls: AtomicU32::new(0),
            entities: Mutex::new(Vec::new()),
            entity_calls: AtomicU32::new(0),
        }
    }

    pub fn without_registry(mut self) -> Self {
        self.with_registry = false;
        self
    }

    /// The next `count` stores fail with `err`, later ones succeed.
    pub fn fail_stores(self, count: usize, err: BackendError) -> Self {
        self.store_script
            .lock()
            .unwrap()
            .extend(std::iter::repeat(err).take(count));
        self
    }

    /// Every store fails with `err`.
    pub fn always_fail_stores(self, err: BackendError) -> Self {
        *self.store_fallback.lock().unwrap() = Some(err);
        self
    }

    pub fn fail_components(self, err: BackendError) -> Self {
        *self.component_failure.lock().unwrap() = Some(err);
        self
    }

    pub fn fail_entities(self, err: BackendError) -> Self {
        *self.entity_failure.lock().unwrap() = Some(err);
        self
    }

    pub fn set_probe(&self, result: Result<bool, BackendError>) {
        *self.probe_result.lock().unwrap() = result;
    }

    pub fn stores(&self) -> u32 {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn component_writes(&self) -> usize {
        self.components.lock().unwrap().len()
    }

    /// Component writes attempted, including failed ones.
    pub fn component_attempts(&self) -> u32 {
        self.component_calls.load(Ordering::SeqCst)
    }

    pub fn entity_writes(&self) -> u32 {
        self.entity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReachabilityProbe for ScriptedBackend {
    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn probe(&self) -> Result<bool, BackendError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe_result.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetBackend for ScriptedBackend {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    async fn store(&self, request: &StoreRequest) -> Result<StoredAsset, BackendError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.store_times.lock().unwrap().push(Instant::now());

        if let Some(err) = self.store_script.lock().unwrap().pop_front() {
            return Err(err);
        }
        if let Some(err) = self.store_fallback.lock().unwrap().clone() {
            return Err(err);
        }

        let storage_path = format!("glbs/{}.glb", request.content_hash);
        Ok(StoredAsset {
            location: format!("mem://{}", storage_path),
            storage_path: Some(storage_path),
        })
    }

    fn registry(&self) -> Option<&dyn SceneRegistry> {
        if self.with_registry {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl SceneRegistry for ScriptedBackend {
    async fn put_component(&self, record: &ComponentRecord) -> Result<(), BackendError> {
        self.component_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.component_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.components.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn put_entity(&self, name: &str, record: &EntityRecord) -> Result<(), BackendError> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.entity_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.entities
            .lock()
            .unwrap()
            .push((name.to_string(), record.clone()));
        Ok(())
    }
}

pub fn transport(msg: &str) -> BackendError {
    BackendError::Transport(msg.to_string())
}

/// A request seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Raw (still percent-encoded) path.
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Responder,
}

/// Local HTTP server that records every request and answers through a closure.
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            responder: Arc::new(responder),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };
    let (status, body) = (state.responder)(&request);
    state.requests.lock().unwrap().push(request);

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// URL of a local port with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
