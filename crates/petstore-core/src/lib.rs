//! Petstore Core - headless client library for administering a Petstore catalog.
//!
//! This crate holds everything behind the admin front end: configuration,
//! the HTTP client and its GET cache, the session state machine, persisted
//! preferences, and the list/detail view state.
//!
//! # Example
//!
//! ```rust,ignore
//! use petstore_core::{PetstoreApi, PetStatus, Settings};
//!
//! #[tokio::main]
//! async fn main() -> petstore_core::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let api = PetstoreApi::from_settings(&settings)?;
//!
//!     let pets = api.find_pets_by_status(&[PetStatus::Available], None).await?;
//!     println!("Found {} pets", pets.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cancel;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod session;
pub mod storage;
pub mod views;

// Re-export commonly used types
pub use api::PetstoreApi;
pub use cancel::{CancellationToken, CancelledError, LoadTracker};
pub use config::{FixedCredentials, Settings};
pub use error::{PetstoreError, Result};
pub use models::{Category, LoginResponse, Pet, PetStatus, SignupRequest, Tag};
pub use network::HttpClient;
pub use session::{SessionManager, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use views::{FormErrors, FormField, PetDetailView, PetForm, PetListView, SaveOutcome};
