//! Client configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `taskboard.toml` in the working directory (optional)
//! 3. Environment variables prefixed `TASKBOARD_`, with `__` between
//!    sections (a `.env` file is loaded first when present)
//!
//! # Environment Variables
//!
//! - `TASKBOARD_STORE__BACKEND`: `memory` (default) or `rest`
//! - `TASKBOARD_STORE__URL`: Data service URL (required for `rest`)
//! - `TASKBOARD_STORE__API_KEY`: Public API key (required for `rest`)
//! - `TASKBOARD_STORE__ACCESS_TOKEN`: Session token
//! - `TASKBOARD_STORE__TIMEOUT_SECS`: Request timeout (default: 10)
//! - `TASKBOARD_SYNC__DEBOUNCE_MS`: Change-feed debounce window (default: 100)
//! - `TASKBOARD_PREFERENCES__PATH`: View-mode file (default: `.taskboard/view-mode`)
//! - `TASKBOARD_SESSION__USER_ID`: User to sign in at startup
//!
//! # Example
//!
//! ```no_run
//! use taskboard_shared::config::ClientConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! println!("Debounce window: {:?}", config.sync.debounce());
//! # Ok(())
//! # }
//! ```

use crate::store::RestConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// A setting required by the selected backend is missing
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

/// Which store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store seeded with demo data
    Memory,

    /// Hosted data service over PostgREST
    Rest,
}

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub preferences: PreferencesConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    #[validate(url)]
    pub url: Option<String>,

    pub api_key: Option<String>,

    pub access_token: Option<String>,

    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

/// Synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// Quiet period before a burst of change events triggers one refetch
    #[validate(range(min = 1, max = 10000))]
    pub debounce_ms: u64,
}

/// Preference storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// File holding the last selected view mode
    pub path: PathBuf,
}

/// Startup session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// User signed in at startup; a fresh id is used when absent
    pub user_id: Option<Uuid>,

    pub email: Option<String>,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { debounce_ms: 100 }
    }
}

impl StoreConfig {
    /// REST connection settings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `url` or `api_key` is unset.
    pub fn rest(&self) -> Result<RestConfig, ConfigError> {
        Ok(RestConfig {
            url: self.url.clone().ok_or(ConfigError::Missing("store.url"))?,
            api_key: self
                .api_key
                .clone()
                .ok_or(ConfigError::Missing("store.api_key"))?,
            access_token: self.access_token.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

impl ClientConfig {
    /// Loads configuration from defaults, `taskboard.toml` and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("taskboard").required(false))
            .add_source(
                Environment::with_prefix("TASKBOARD")
                    .prefix_separator("_")
                    .separator("__"),
            );
        Self::finish(builder.build()?)
    }

    /// Loads configuration from a TOML document over the defaults
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::load`].
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder.build()?)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(builder
            .set_default("store.backend", "memory")?
            .set_default("store.timeout_secs", 10_i64)?
            .set_default("sync.debounce_ms", 100_i64)?
            .set_default("preferences.path", ".taskboard/view-mode")?)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let parsed: ClientConfig = config.try_deserialize()?;
        parsed.store.validate()?;
        parsed.sync.validate()?;
        if parsed.store.backend == StoreBackend::Rest {
            parsed.store.rest()?;
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.timeout_secs, 10);
        assert_eq!(config.sync.debounce(), Duration::from_millis(100));
        assert_eq!(config.preferences.path, PathBuf::from(".taskboard/view-mode"));
        assert!(config.session.user_id.is_none());
    }

    #[test]
    fn test_rest_backend_requires_url_and_key() {
        let err = ClientConfig::from_toml_str("[store]\nbackend = \"rest\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("store.url")));

        let config = ClientConfig::from_toml_str(
            "[store]\nbackend = \"rest\"\nurl = \"http://localhost:54321\"\napi_key = \"anon\"\n",
        )
        .unwrap();
        let rest = config.store.rest().unwrap();
        assert_eq!(rest.url, "http://localhost:54321");
        assert_eq!(rest.bearer_token(), "anon");
    }

    #[test]
    fn test_debounce_out_of_range_is_rejected() {
        let err = ClientConfig::from_toml_str("[sync]\ndebounce_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_session_user_id_parses() {
        let id = Uuid::new_v4();
        let config =
            ClientConfig::from_toml_str(&format!("[session]\nuser_id = \"{}\"\n", id)).unwrap();
        assert_eq!(config.session.user_id, Some(id));
    }
}
