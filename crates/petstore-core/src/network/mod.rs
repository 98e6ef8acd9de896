//! Network layer: transport seam, HTTP client, and GET cache.

mod cache;
mod client;
mod transport;

pub use cache::{cache_key, CacheEntry};
pub use client::{error_message, HttpClient, FIND_BY_STATUS_PATH};
pub use transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport};
