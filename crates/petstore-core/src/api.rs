//! Typed Petstore endpoints on top of [`HttpClient`].

use crate::config::{NetworkConfig, Settings};
use crate::models::{LoginResponse, NewUser, Pet, PetStatus};
use crate::network::{HttpClient, FIND_BY_STATUS_PATH};
use crate::{PetstoreError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::form_urlencoded;

/// Petstore REST API.
///
/// Cheap to clone; clones share one cache.
#[derive(Debug, Clone)]
pub struct PetstoreApi {
    http: HttpClient,
    cache_ttl: Duration,
}

impl PetstoreApi {
    /// Create an API client from startup settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(HttpClient::new(&settings.base_url)?).with_cache_ttl(settings.cache_ttl))
    }

    /// Wrap an existing HTTP client with the default cache TTL.
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            cache_ttl: NetworkConfig::DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `GET user/login`; the body text is the session token.
    ///
    /// Never cached. The rate-limit headers are passed through when present.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();
        let response = self
            .http
            .send_raw(Method::GET, &format!("user/login?{}", query), None)
            .await?;

        if !response.is_success() {
            let message = if response.body.is_empty() {
                "Login failed".to_string()
            } else {
                response.body.clone()
            };
            return Err(PetstoreError::Api {
                status: response.status,
                message,
            });
        }

        info!("Remote login succeeded for {}", username);
        Ok(LoginResponse {
            token: response.body.trim().to_string(),
            rate_limit: response.header("X-Rate-Limit").map(str::to_string),
            expires_after: response.header("X-Expires-After").map(str::to_string),
        })
    }

    /// `POST user`.
    pub async fn create_user(&self, user: &NewUser) -> Result<serde_json::Value> {
        let body = serde_json::to_value(user)?;
        self.http
            .request(Method::POST, "user", Some(&body), None)
            .await
    }

    /// `GET pet/findByStatus?status=...`, cached.
    pub async fn find_pets_by_status(
        &self,
        statuses: &[PetStatus],
        token: Option<&str>,
    ) -> Result<Vec<Pet>> {
        let path = find_by_status_path(statuses);
        let data = self.http.cached_get(&path, token, self.cache_ttl).await?;
        decode(data)
    }

    /// `GET pet/{id}`, cached.
    pub async fn get_pet(&self, id: i64, token: Option<&str>) -> Result<Pet> {
        let data = self
            .http
            .cached_get(&format!("pet/{}", id), token, self.cache_ttl)
            .await?;
        decode(data)
    }

    /// `PUT pet`, then drop cached reads of that pet and of every status list.
    pub async fn update_pet(&self, pet: &Pet, token: Option<&str>) -> Result<Pet> {
        let body = serde_json::to_value(pet)?;
        let data = self
            .http
            .request(Method::PUT, "pet", Some(&body), token)
            .await?;
        self.http.invalidate_pet(pet.id);
        debug!("Updated pet {:?}", pet.id);
        decode(data)
    }
}

/// Status-list path with one `status` parameter per requested status.
pub fn find_by_status_path(statuses: &[PetStatus]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for status in statuses {
        query.append_pair("status", status.as_str());
    }
    format!("{}?{}", FIND_BY_STATUS_PATH, query.finish())
}

fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| PetstoreError::Json {
        message: format!("Unexpected response shape: {}", e),
        source: Some(std::sync::Arc::new(e)),
    })
}
