#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use reqwest::Client;

use crate::constants::{
    DEFAULT_SETTINGS_PATH, HYPERSKILL_DEFAULT_CLIENT_ID, HYPERSKILL_URL, PLUGIN_NAME,
    PLUGIN_VERSION, STEPIK_URL,
};

/// Client id and secret registered with an OAuth platform.
#[derive(Clone, Debug, Default)]
pub struct ClientCredentials {
    /// Public client id.
    client_id:     String,
    /// Client secret; blank for public clients.
    client_secret: String,
}

impl ClientCredentials {
    /// Credentials with the given id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id:     client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads the credentials from `id_env` and `secret_env`, trimming
    /// whitespace. Missing variables read as blank.
    fn from_env(id_env: &str, secret_env: &str) -> Self {
        Self {
            client_id:     read_trimmed(id_env).unwrap_or_default(),
            client_secret: read_trimmed(secret_env).unwrap_or_default(),
        }
    }

    /// Returns the client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

/// Runtime configuration shared across the crate.
pub struct ConfigState {
    /// Shared reqwest HTTP client reused by every connector.
    http_client:           Client,
    /// Stepik site URL without a trailing slash.
    stepik_url:            String,
    /// Stepik OAuth client id.
    stepik_client_id:      String,
    /// CheckiO credentials for the Python mission set.
    checkio_py:            ClientCredentials,
    /// CheckiO credentials for the JavaScript mission set.
    checkio_js:            ClientCredentials,
    /// Hyperskill site URL without a trailing slash.
    hyperskill_url:        String,
    /// Hyperskill OAuth client id.
    hyperskill_client_id:  String,
    /// Timeout applied to every HTTP request.
    http_timeout:          Duration,
    /// Number of submissions fetched at once while syncing solutions.
    solutions_concurrency: usize,
    /// Where settings and accounts are persisted.
    settings_path:         PathBuf,
    /// Interval between two checks for new courses.
    new_courses_interval:  Duration,
}

impl ConfigState {
    /// Construct a new configuration instance from the environment.
    fn new() -> Result<Self> {
        let http_timeout = read_timeout_secs("EDU_HTTP_TIMEOUT_SECS", 10);
        let http_client = Client::builder()
            .timeout(http_timeout)
            .user_agent(user_agent())
            .no_proxy()
            .build()
            .context("Failed to construct shared HTTP client")?;

        let stepik_url = read_url("EDU_STEPIK_URL", STEPIK_URL);
        let stepik_client_id = read_trimmed("EDU_STEPIK_CLIENT_ID").unwrap_or_default();
        let hyperskill_url = read_url("EDU_HYPERSKILL_URL", HYPERSKILL_URL);
        let hyperskill_client_id = read_trimmed("EDU_HYPERSKILL_CLIENT_ID")
            .unwrap_or_else(|| HYPERSKILL_DEFAULT_CLIENT_ID.to_string());

        let solutions_concurrency = std::env::var("EDU_SOLUTIONS_CONCURRENCY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(8);

        let settings_path = read_trimmed("EDU_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

        Ok(Self {
            http_client,
            stepik_url,
            stepik_client_id,
            checkio_py: ClientCredentials::from_env(
                "EDU_CHECKIO_CLIENT_ID",
                "EDU_CHECKIO_CLIENT_SECRET",
            ),
            checkio_js: ClientCredentials::from_env(
                "EDU_JS_CHECKIO_CLIENT_ID",
                "EDU_JS_CHECKIO_CLIENT_SECRET",
            ),
            hyperskill_url,
            hyperskill_client_id,
            http_timeout,
            solutions_concurrency,
            settings_path,
            new_courses_interval: read_timeout_secs("EDU_NEW_COURSES_INTERVAL_SECS", 86_400),
        })
    }

    /// Returns a clone of the shared reqwest HTTP client.
    pub fn http_client(&self) -> Client {
        self.http_client.clone()
    }

    /// Returns the Stepik site URL.
    pub fn stepik_url(&self) -> &str {
        &self.stepik_url
    }

    /// Returns the Stepik OAuth client id.
    pub fn stepik_client_id(&self) -> &str {
        &self.stepik_client_id
    }

    /// Returns the CheckiO credentials for the Python mission set.
    pub fn checkio_py(&self) -> &ClientCredentials {
        &self.checkio_py
    }

    /// Returns the CheckiO credentials for the JavaScript mission set.
    pub fn checkio_js(&self) -> &ClientCredentials {
        &self.checkio_js
    }

    /// Returns the Hyperskill site URL.
    pub fn hyperskill_url(&self) -> &str {
        &self.hyperskill_url
    }

    /// Returns the Hyperskill OAuth client id.
    pub fn hyperskill_client_id(&self) -> &str {
        &self.hyperskill_client_id
    }

    /// Returns the HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Returns how many submissions are fetched at once.
    pub fn solutions_concurrency(&self) -> usize {
        self.solutions_concurrency
    }

    /// Returns the settings file path.
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Returns the interval between new-course checks.
    pub fn new_courses_interval(&self) -> Duration {
        self.new_courses_interval
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Builds a fresh configuration instance and wraps it in an `Arc`.
fn build_default() -> Result<Arc<ConfigState>> {
    ConfigState::new().map(Arc::new)
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot
        .lock()
        .map_err(|_| anyhow::anyhow!("config slot poisoned"))?;
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = build_default()?;
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> Result<ConfigHandle> {
    ensure_initialized()
}

/// Returns the configured settings file path.
pub fn settings_path() -> Result<PathBuf> {
    Ok(get()?.settings_path().clone())
}

/// User agent sent with every request.
pub fn user_agent() -> String {
    format!(
        "{PLUGIN_NAME}/version({PLUGIN_VERSION})/{}/rust",
        std::env::consts::OS
    )
}

/// Reads an environment variable, trimmed; blank values read as missing.
fn read_trimmed(env: &str) -> Option<String> {
    std::env::var(env)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Reads a base URL, dropping the trailing slash.
fn read_url(env: &str, default: &str) -> String {
    read_trimmed(env)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
