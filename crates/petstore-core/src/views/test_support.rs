//! Transport that holds every response until released.

use crate::api::PetstoreApi;
use crate::network::{HttpClient, OutgoingRequest, RawResponse, Transport};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Notify;
use url::Url;

pub(crate) struct GatedTransport {
    gate: Arc<Notify>,
    body: String,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, _request: OutgoingRequest) -> Result<RawResponse> {
        self.gate.notified().await;
        Ok(RawResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: self.body.clone(),
        })
    }
}

/// An API whose GETs answer `body` once the returned gate is notified.
pub(crate) fn gated_api(body: Value) -> (PetstoreApi, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(GatedTransport {
        gate: gate.clone(),
        body: body.to_string(),
    });
    let base = Url::parse("http://petstore.test/v2/").unwrap();
    let api = PetstoreApi::new(HttpClient::with_transport(&base, transport));
    (api, gate)
}
