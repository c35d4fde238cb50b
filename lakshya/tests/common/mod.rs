#![allow(dead_code)]

use async_trait::async_trait;
use lakshya::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use lakshya::{
    ApiClient, HttpRequest, HttpResponse, KeyValueStore, MemoryStore, SessionStore, Transport,
    TransportError,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://test.invalid/api";

/// What the fake server saw, with the bits the tests care about pulled out.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub endpoint: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub headers: reqwest::header::HeaderMap,
    pub body: Option<Value>,
}

type Handler = dyn Fn(&Recorded) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that hands every request to a closure, yielding first so that concurrent
/// requests interleave the way they would against a real server.
pub struct FakeTransport {
    handler: Box<Handler>,
    log: Mutex<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&Recorded) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(FakeTransport {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Replays `responses` in order, one per request.
    pub fn scripted(responses: Vec<HttpResponse>) -> Arc<Self> {
        let queue = Mutex::new(responses.into_iter());
        FakeTransport::new(move |req| {
            queue
                .lock()
                .unwrap()
                .next()
                .ok_or_else(|| TransportError::Message(format!("unexpected request: {req:?}")))
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.endpoint))
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tokio::task::yield_now().await;
        let header = |name: reqwest::header::HeaderName| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let recorded = Recorded {
            method: request.method.to_string(),
            endpoint: request
                .url
                .strip_prefix(BASE_URL)
                .unwrap_or(&request.url)
                .to_string(),
            authorization: header(reqwest::header::AUTHORIZATION),
            content_type: header(reqwest::header::CONTENT_TYPE),
            headers: request.headers.clone(),
            body: request
                .body
                .as_ref()
                .map(|b| serde_json::from_slice(b).unwrap()),
        };
        self.log.lock().unwrap().push(recorded.clone());
        let resp = (self.handler)(&recorded);
        tokio::task::yield_now().await;
        resp
    }
}

pub fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(&body).unwrap())
}

pub fn detail(status: u16, message: &str) -> HttpResponse {
    json_response(status, json!({ "detail": message }))
}

pub fn user_json(id: i64, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "name": "Asha Verma",
        "role": "student",
        "education": "B.Tech",
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00"
    })
}

pub fn token_json(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "user": user_json(1, "a@x.com")
    })
}

pub fn profile_json() -> Value {
    let mut profile = user_json(1, "a@x.com");
    profile["skills"] = json!([]);
    profile["preferences"] = json!([]);
    profile
}

pub fn signed_in_store(access: &str, refresh: Option<&str>) -> SessionStore {
    let backend = MemoryStore::new();
    let mut entries = vec![
        (ACCESS_TOKEN_KEY, access.to_string()),
        (USER_KEY, user_json(1, "a@x.com").to_string()),
    ];
    if let Some(refresh) = refresh {
        entries.push((REFRESH_TOKEN_KEY, refresh.to_string()));
    }
    backend.set_many(&entries).unwrap();
    SessionStore::new(Arc::new(backend))
}

/// Client plus a counter of how often the unauthenticated callback fired.
pub fn client_with(
    transport: Arc<FakeTransport>,
    store: SessionStore,
) -> (ApiClient, Arc<AtomicUsize>) {
    let logouts = Arc::new(AtomicUsize::new(0));
    let counter = logouts.clone();
    let client = ApiClient::with_transport(BASE_URL, transport, store).on_unauthenticated(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (client, logouts)
}
