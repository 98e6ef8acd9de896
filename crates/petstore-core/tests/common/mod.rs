//! In-process mock of the Petstore REST service.
//!
//! Serves the handful of endpoints the client uses and counts hits per route
//! so tests can assert how many network calls were made.

#![allow(dead_code)]

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use petstore_core::network::HttpClient;
use petstore_core::PetstoreApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "jdoe";
pub const PASSWORD: &str = "pw";
pub const TOKEN: &str = "token-123";

#[derive(Clone, Default)]
pub struct MockPetstore {
    hits: Arc<Mutex<HashMap<String, usize>>>,
    pets: Arc<Mutex<HashMap<i64, Value>>>,
    lists: Arc<Mutex<HashMap<String, Value>>>,
    puts: Arc<Mutex<Vec<Value>>>,
    users: Arc<Mutex<Vec<Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockPetstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pet(self, pet: Value) -> Self {
        let id = pet["id"].as_i64().expect("mock pet needs an id");
        self.pets.lock().unwrap().insert(id, pet);
        self
    }

    /// Canned body for `findByStatus` with the given raw query string.
    pub fn with_list(self, query: &str, body: Value) -> Self {
        self.lists.lock().unwrap().insert(query.to_string(), body);
        self
    }

    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    pub fn puts(&self) -> Vec<Value> {
        self.puts.lock().unwrap().clone()
    }

    pub fn users(&self) -> Vec<Value> {
        self.users.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.auth_headers.lock().unwrap().clone()
    }

    fn record(&self, route: &str, headers: &HeaderMap) {
        *self.hits.lock().unwrap().entry(route.to_string()).or_default() += 1;
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(auth);
    }

    /// Bind to an ephemeral port and serve in the background.
    pub async fn start(self) -> (SocketAddr, Self) {
        let app = Router::new()
            .route("/v2/user/login", get(login))
            .route("/v2/user", post(create_user))
            .route("/v2/pet/findByStatus", get(find_by_status))
            .route("/v2/pet/:id", get(get_pet))
            .route("/v2/pet", put(update_pet))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });
        (addr, self)
    }
}

/// Start `mock` and build an API client pointed at it.
pub async fn api_for(mock: MockPetstore) -> (PetstoreApi, MockPetstore) {
    let (addr, mock) = mock.start().await;
    let base = url::Url::parse(&format!("http://{}/v2", addr)).unwrap();
    let api = PetstoreApi::new(HttpClient::new(&base).unwrap());
    (api, mock)
}

async fn login(
    State(mock): State<MockPetstore>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.record("GET /user/login", &headers);
    let ok = params.get("username").map(String::as_str) == Some(USERNAME)
        && params.get("password").map(String::as_str) == Some(PASSWORD);
    if ok {
        (
            [("x-rate-limit", "5000"), ("x-expires-after", "2030-01-01T00:00:00Z")],
            TOKEN,
        )
            .into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Invalid username/password supplied").into_response()
    }
}

async fn create_user(
    State(mock): State<MockPetstore>,
    headers: HeaderMap,
    Json(user): Json<Value>,
) -> Json<Value> {
    mock.record("POST /user", &headers);
    let id = user["id"].to_string();
    mock.users.lock().unwrap().push(user);
    Json(json!({"code": 200, "type": "unknown", "message": id}))
}

async fn find_by_status(
    State(mock): State<MockPetstore>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    mock.record("GET /pet/findByStatus", &headers);
    let query = query.unwrap_or_default();
    let body = mock
        .lists
        .lock()
        .unwrap()
        .get(&query)
        .cloned()
        .unwrap_or_else(|| json!([]));
    Json(body)
}

async fn get_pet(
    State(mock): State<MockPetstore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    mock.record("GET /pet/{id}", &headers);
    match mock.pets.lock().unwrap().get(&id).cloned() {
        Some(pet) => Json(pet).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 1, "type": "error", "message": "Pet not found"})),
        )
            .into_response(),
    }
}

async fn update_pet(
    State(mock): State<MockPetstore>,
    headers: HeaderMap,
    Json(pet): Json<Value>,
) -> Response {
    mock.record("PUT /pet", &headers);
    mock.puts.lock().unwrap().push(pet.clone());
    match pet["id"].as_i64() {
        Some(id) => {
            mock.pets.lock().unwrap().insert(id, pet.clone());
            Json(pet).into_response()
        }
        None => (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({"code": 405, "type": "unknown", "message": "Invalid input"})),
        )
            .into_response(),
    }
}
