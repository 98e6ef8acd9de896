//! Startup configuration and shared constants.
//!
//! [`Settings`] is read once at startup from the environment (optionally
//! seeded from a `.env` file). A missing or malformed base URL is the one
//! fatal configuration error.

use crate::error::{PetstoreError, Result};
use std::time::Duration;
use url::Url;

/// Environment variable naming the remote service base URL.
pub const BASE_URL_VAR: &str = "PETSTORE_API_BASE_URL";
/// Environment variable for the fixed-credential username.
pub const APP_USERNAME_VAR: &str = "PETSTORE_APP_USERNAME";
/// Environment variable for the fixed-credential password.
pub const APP_PASSWORD_VAR: &str = "PETSTORE_APP_PASSWORD";
/// Environment variable overriding the GET cache TTL, in seconds.
pub const CACHE_TTL_VAR: &str = "PETSTORE_CACHE_TTL_SECS";

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = "petstore-admin/0.1";
    pub const EXAMPLE_BASE_URL: &'static str = "https://petstore.swagger.io/v2";
}

/// View timing and presentation constants.
pub struct UiConfig;

impl UiConfig {
    /// How long a successful save lingers before returning to the previous view.
    pub const SAVE_RETURN_DELAY: Duration = Duration::from_millis(800);
    /// Token stored for sessions authenticated against fixed credentials.
    pub const LOCAL_SESSION_TOKEN: &'static str = "local-session";
}

/// Keys persisted in the client-side store.
pub struct StorageKeys;

impl StorageKeys {
    pub const TOKEN: &'static str = "token";
    pub const USERNAME: &'static str = "username";
    pub const SELECTED_STATUS: &'static str = "pets_selected_status";
}

/// A fixed username/password pair that replaces remote login.
#[derive(Clone, PartialEq, Eq)]
pub struct FixedCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for FixedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Application settings resolved at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub fixed_credentials: Option<FixedCredentials>,
    pub cache_ttl: Duration,
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base = lookup(BASE_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PetstoreError::Config {
                message: format!(
                    "{} is not defined. Example: {}={}",
                    BASE_URL_VAR,
                    BASE_URL_VAR,
                    NetworkConfig::EXAMPLE_BASE_URL
                ),
            })?;
        let base_url = parse_base_url(&raw_base)?;

        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let fixed_credentials = match (non_empty(APP_USERNAME_VAR), non_empty(APP_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(FixedCredentials { username, password }),
            _ => None,
        };

        let cache_ttl = match lookup(CACHE_TTL_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| PetstoreError::Config {
                    message: format!("{} must be a whole number of seconds: {}", CACHE_TTL_VAR, e),
                })?,
            None => NetworkConfig::DEFAULT_CACHE_TTL,
        };

        Ok(Self {
            base_url,
            fixed_credentials,
            cache_ttl,
        })
    }

    /// Whether login is checked against a fixed pair and sign-up is disabled.
    pub fn is_fixed_credential_mode(&self) -> bool {
        self.fixed_credentials.is_some()
    }
}

/// Parse a base URL and normalize it to end with exactly one `/`.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{}/", trimmed)).map_err(|e| PetstoreError::Config {
        message: format!("Invalid base URL {:?}: {}", raw, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PetstoreError::Config {
            message: format!("Unsupported base URL scheme {:?}", other),
        }),
    }
}
