#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::IntoResponse,
};
use platform_db::{ClientAccessor, DatabaseSettings, HrStore, InitPolicy, MemoryBackend, Record};
use serde_json::Value;

pub const ANON_KEY: &str = "test-anon-key";

/// A request as the fake service saw it.
#[derive(Clone, Debug)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Captured {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct FakeState {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    seen: Arc<Mutex<Vec<Captured>>>,
}

/// Minimal PostgREST look-alike. Answers the readiness probe with 200 and
/// every other request with the next queued reply (200 `[]` when the queue
/// is empty).
pub struct FakeService {
    pub addr: SocketAddr,
    state: FakeState,
}

impl FakeService {
    pub async fn start() -> Self {
        let state = FakeState::default();
        let router = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn reply(&self, status: StatusCode, body: impl Into<String>) {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back((status, body.into()));
    }

    pub fn reply_json(&self, status: StatusCode, body: Value) {
        self.reply(status, body.to_string());
    }

    pub fn seen(&self) -> Vec<Captured> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn settings(&self) -> DatabaseSettings {
        DatabaseSettings::new(format!("http://{}", self.addr), ANON_KEY)
            .with_request_timeout(Duration::from_secs(5))
            .with_init_policy(InitPolicy {
                timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(10),
            })
    }

    pub fn store(&self) -> HrStore {
        HrStore::new(Arc::new(ClientAccessor::new(self.settings())))
    }
}

async fn handle(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    if path == "/rest/v1/" {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{}".to_string(),
        );
    }

    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    state.seen.lock().unwrap().push(Captured {
        method,
        path,
        query,
        headers,
        body,
    });

    let (status, reply) = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, "[]".to_string()));
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply,
    )
}

pub fn memory_store() -> (Arc<MemoryBackend>, HrStore) {
    let backend = Arc::new(MemoryBackend::new());
    let store = HrStore::new(Arc::new(ClientAccessor::with_backend(backend.clone())));
    (backend, store)
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
