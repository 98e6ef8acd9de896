//! Pet list view: status filter, name search, de-duplicated results.

use crate::api::PetstoreApi;
use crate::cancel::{CancellationToken, LoadTracker};
use crate::config::StorageKeys;
use crate::models::{Pet, PetStatus};
use crate::storage::KeyValueStore;
use crate::{PetstoreError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const LOAD_FAILED: &str = "Failed to load pets";

/// State behind the pet list.
pub struct PetListView {
    store: Arc<dyn KeyValueStore>,
    status: PetStatus,
    search: String,
    pets: Vec<Pet>,
    loading: bool,
    error: Option<String>,
    loads: LoadTracker,
}

impl PetListView {
    /// Create the view with the status filter restored from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let status = persisted_status(&*store);
        Self {
            store,
            status,
            search: String::new(),
            pets: Vec::new(),
            loading: false,
            error: None,
            loads: LoadTracker::new(),
        }
    }

    pub fn status(&self) -> PetStatus {
        self.status
    }

    /// Switch the status filter and remember it. Callers reload afterwards.
    pub fn pick_status(&mut self, status: PetStatus) {
        if let Err(e) = self.store.set(StorageKeys::SELECTED_STATUS, status.as_str()) {
            warn!("Failed to persist status filter: {}", e);
        }
        self.status = status;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every loaded pet, unfiltered.
    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    /// Pets whose name contains the search query (trimmed, case-insensitive).
    pub fn visible(&self) -> Vec<&Pet> {
        let query = normalize(&self.search);
        self.pets
            .iter()
            .filter(|pet| query.is_empty() || normalize(pet.display_name()).contains(&query))
            .collect()
    }

    /// Loaded fine but nothing to show.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.error.is_none() && self.visible().is_empty()
    }

    /// Start a load, cancelling interest in any earlier one.
    pub fn begin_load(&mut self) -> CancellationToken {
        self.loading = true;
        self.error = None;
        self.loads.begin()
    }

    /// Apply a finished load. Returns `false` if the load was superseded.
    pub fn apply(&mut self, load: &CancellationToken, result: Result<Vec<Pet>>) -> bool {
        if load.is_cancelled() || matches!(result, Err(PetstoreError::Cancelled)) {
            debug!("Discarding superseded pet list load");
            return false;
        }
        self.loading = false;
        match result {
            Ok(pets) => {
                self.pets = pets;
                self.error = None;
            }
            Err(e) => {
                self.pets.clear();
                self.error = Some(display_message(&e, LOAD_FAILED));
            }
        }
        true
    }

    /// Load the current status filter from `api` and apply it.
    pub async fn load(&mut self, api: &PetstoreApi, token: Option<&str>) -> bool {
        let load = self.begin_load();
        let result = fetch_pets(api, self.status, token, &load).await;
        self.apply(&load, result)
    }
}

/// Fetch one status list, stop if cancelled, and drop repeated ids.
pub async fn fetch_pets(
    api: &PetstoreApi,
    status: PetStatus,
    token: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<Pet>> {
    let pets = api.find_pets_by_status(&[status], token).await;
    cancel.check()?;
    Ok(dedupe_by_id(pets?))
}

/// Keep the first pet for each id. Pets without an id are all kept.
pub fn dedupe_by_id(pets: Vec<Pet>) -> Vec<Pet> {
    let mut seen = HashSet::new();
    pets.into_iter()
        .filter(|pet| match pet.id {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect()
}

/// Error text for display, with a fallback for empty messages.
pub(crate) fn display_message(err: &PetstoreError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn persisted_status(store: &dyn KeyValueStore) -> PetStatus {
    store
        .get(StorageKeys::SELECTED_STATUS)
        .ok()
        .flatten()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
