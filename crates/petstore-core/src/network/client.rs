//! HTTP client for the Petstore REST service.
//!
//! Provides:
//! - Absolute URL construction from one configured base
//! - Bearer auth and JSON headers on every call
//! - Uniform JSON / plain-text response decoding
//! - Normalization of non-2xx bodies into a single error message
//! - A short-TTL GET cache with in-flight de-duplication and explicit invalidation

use super::cache::{cache_key, is_resource_url, CacheState, SharedRequest};
use super::transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport};
use crate::{PetstoreError, Result};
use futures::FutureExt;
use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Path of the status-list endpoint, relative to the base URL.
pub const FIND_BY_STATUS_PATH: &str = "pet/findByStatus";

/// HTTP client bound to a single base endpoint.
///
/// Cache and in-flight state belong to the client instance; construct one per
/// session and pass it to whatever issues requests.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<CacheState>>,
}

impl HttpClient {
    /// Create a client that talks to `base_url` over reqwest.
    pub fn new(base_url: &Url) -> Result<Self> {
        Ok(Self::with_transport(
            base_url,
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(base_url: &Url, transport: Arc<dyn Transport>) -> Self {
        let base = base_url.as_str().trim();
        let base_url = format!("{}/", base.trim_end_matches('/'));
        Self {
            base_url,
            transport,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL. One leading `/` is ignored.
    pub fn absolute_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}{}", self.base_url, path)
    }

    /// Perform one request and decode the response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value> {
        self.request_with_headers(method, path, body, token, &[])
            .await
    }

    /// Like [`request`](Self::request), with extra headers that take
    /// precedence over the defaults.
    pub async fn request_with_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let request = build_request(method, self.absolute_url(path), body, token, headers);
        execute(self.transport.as_ref(), request).await
    }

    /// Perform one request and return the raw response without status checks.
    ///
    /// Used by endpoints that read headers or need non-JSON handling.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        let request = build_request(method, self.absolute_url(path), None, token, &[]);
        self.transport.send(request).await
    }

    /// GET with a short-lived cache and in-flight de-duplication.
    ///
    /// A fresh cached value is returned without a network call. If a request
    /// for the same key is already outstanding, its result is shared. Failures
    /// are never cached.
    pub async fn cached_get(
        &self,
        path: &str,
        token: Option<&str>,
        ttl: Duration,
    ) -> Result<Value> {
        let url = self.absolute_url(path);
        let key = cache_key(&Method::GET, &url);
        let started = Instant::now();

        // Check-then-insert under one lock; nothing in this block awaits.
        let pending: SharedRequest = {
            let mut state = self.lock_state();
            if let Some(hit) = state.fresh(&key, started) {
                debug!("Cache hit: {}", key);
                return Ok(hit);
            }
            match state.inflight(&key) {
                Some(running) => {
                    debug!("Joining in-flight request: {}", key);
                    running
                }
                None => {
                    debug!("Cache miss: {}", key);
                    let request = build_request(Method::GET, url, None, token, &[]);
                    let transport = self.transport.clone();
                    let shared_state = self.state.clone();
                    let entry_key = key.clone();
                    let pending = async move {
                        let result = execute(transport.as_ref(), request).await;
                        let mut state =
                            shared_state.lock().unwrap_or_else(PoisonError::into_inner);
                        state.finish(&entry_key);
                        if let Ok(data) = &result {
                            state.store(entry_key, data.clone(), started + ttl);
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    state.start(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Drop cached reads that a write to `pet_id` may have made stale.
    ///
    /// Removes the single-pet entry for `pet_id` (when given) and every
    /// status-list entry. Other entries are kept.
    pub fn invalidate_pet(&self, pet_id: Option<i64>) {
        let list_url = self.absolute_url(FIND_BY_STATUS_PATH);
        let pet_url = pet_id.map(|id| self.absolute_url(&format!("pet/{}", id)));

        let removed = self.lock_state().remove_where(|url| {
            url.starts_with(&list_url)
                || pet_url
                    .as_deref()
                    .map(|pet_url| is_resource_url(url, pet_url))
                    .unwrap_or(false)
        });
        debug!("Invalidated {} cache entries for pet {:?}", removed, pet_id);
    }

    /// Drop every cached value (in-flight requests are left alone).
    pub fn clear_cache(&self) {
        self.lock_state().clear();
    }

    /// Number of cached values, including ones that have expired but not been read.
    pub fn cache_len(&self) -> usize {
        self.lock_state().len()
    }

    /// Number of requests currently being shared.
    pub fn inflight_len(&self) -> usize {
        self.lock_state().inflight_len()
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Assemble headers and body for a request.
fn build_request(
    method: Method,
    url: String,
    body: Option<&Value>,
    token: Option<&str>,
    extra: &[(&str, &str)],
) -> OutgoingRequest {
    let mut headers: Vec<(String, String)> = vec![("Accept".into(), "application/json".into())];
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.push(("Authorization".into(), format!("Bearer {}", token)));
    }
    for (key, value) in extra {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        headers.push((key.to_string(), value.to_string()));
    }

    let body = body.map(|value| {
        let has_content_type = headers
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            headers.push(("Content-Type".into(), "application/json".into()));
        }
        value.to_string()
    });

    OutgoingRequest {
        method,
        url,
        headers,
        body,
    }
}

/// Send a request, decode the body, and turn failures into errors.
async fn execute(transport: &dyn Transport, request: OutgoingRequest) -> Result<Value> {
    let response = transport.send(request).await?;

    if response.is_success() {
        return decode_body(&response);
    }

    // A failing response with a broken JSON body still yields its text.
    let data = decode_body(&response).unwrap_or_else(|_| Value::String(response.body.clone()));
    Err(PetstoreError::Api {
        status: response.status,
        message: error_message(&data),
    })
}

/// JSON bodies are parsed; anything else becomes a JSON string.
fn decode_body(response: &RawResponse) -> Result<Value> {
    if !response.is_json() {
        return Ok(Value::String(response.body.clone()));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| PetstoreError::Json {
        message: format!("Failed to decode response body: {}", e),
        source: Some(Arc::new(e)),
    })
}

/// The body if it is a string, else its `message` field, else the body as JSON text.
pub fn error_message(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => data.to_string(),
            Some(other) => other.to_string(),
        },
        other => other.to_string(),
    }
}
