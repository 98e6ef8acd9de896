//! Short-lived GET result cache and in-flight request table.
//!
//! Both maps are keyed by `"<METHOD> <absolute url>"`. The owner keeps them
//! behind a single mutex and never holds that lock across an `.await`.

use crate::Result;
use futures::future::{BoxFuture, Shared};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use tokio::time::Instant;

/// A request whose eventual result is shared by every caller that asked for it.
pub(crate) type SharedRequest = Shared<BoxFuture<'static, Result<Value>>>;

/// Build the cache key for a method and absolute URL.
pub fn cache_key(method: &Method, absolute_url: &str) -> String {
    format!("{} {}", method.as_str().to_ascii_uppercase(), absolute_url)
}

/// Absolute URL part of a cache key.
fn key_url(key: &str) -> &str {
    key.split_once(' ').map(|(_, url)| url).unwrap_or(key)
}

/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub expiry: Instant,
}

impl CacheEntry {
    /// Entries are valid strictly before their expiry.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expiry
    }
}

#[derive(Default)]
pub(crate) struct CacheState {
    entries: HashMap<String, CacheEntry>,
    inflight: HashMap<String, SharedRequest>,
}

impl CacheState {
    /// Return a fresh value for `key`; expired entries are dropped.
    pub fn fresh(&mut self, key: &str, now: Instant) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.data.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn store(&mut self, key: String, data: Value, expiry: Instant) {
        self.entries.insert(key, CacheEntry { data, expiry });
    }

    pub fn inflight(&self, key: &str) -> Option<SharedRequest> {
        self.inflight.get(key).cloned()
    }

    pub fn start(&mut self, key: String, request: SharedRequest) {
        self.inflight.insert(key, request);
    }

    pub fn finish(&mut self, key: &str) {
        self.inflight.remove(key);
    }

    /// Remove every entry whose URL matches `predicate`; returns how many went.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key_url(key)));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }
}

/// Whether `url` is `resource` itself or `resource` with a query string.
pub fn is_resource_url(url: &str, resource: &str) -> bool {
    match url.strip_prefix(resource) {
        Some(rest) => rest.is_empty() || rest.starts_with('?'),
        None => false,
    }
}
