//! Service endpoints and timing.
//!
//! Native builds layer configuration with figment, highest priority last:
//! 1. Built-in defaults
//! 2. `prorev/prorev.toml` in the user config directory
//! 3. `./prorev.toml`
//! 4. `PROREV_*` environment variables (`PROREV_API_BASE`, `PROREV_BUCKET`, ...)
//!
//! The browser build starts from the defaults and applies `?api=`,
//! `?storage=` and `?bucket=` parameters from the page URL.

use crate::debounce::DEFAULT_FEEDBACK_DELAY;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(target_arch = "wasm32")]
use web_time::Duration;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5001";
pub const DEFAULT_BUCKET: &str = "PDFBucket";
/// Longest a single storage or service call may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[cfg(not(target_arch = "wasm32"))]
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Where the remote collaborators live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the extraction and feedback API.
    pub api_base: String,
    /// Base URL of the storage service. Uploads stay local when unset.
    pub storage_base: Option<String>,
    pub bucket: String,
    /// Sent as `apikey` and bearer token to the storage service.
    pub api_key: Option<String>,
    /// Drawing pause before feedback is requested.
    pub debounce_ms: u64,
    /// A call still unanswered after this long is abandoned.
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            storage_base: None,
            bucket: DEFAULT_BUCKET.to_string(),
            api_key: None,
            debounce_ms: DEFAULT_FEEDBACK_DELAY.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ServiceConfig {
    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check values that would otherwise fail on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("api_base", &self.api_base)?;
        if let Some(storage) = &self.storage_base {
            check_url("storage_base", storage)?;
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bucket".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Apply `api`, `storage` and `bucket` parameters from a URL query string
    /// or fragment. Empty values are ignored.
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.trim_start_matches(['?', '#']);
        let Ok(url) = Url::parse(&format!("http://localhost/?{query}")) else {
            return self;
        };
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "api" => self.api_base = value.into_owned(),
                "storage" => self.storage_base = Some(value.into_owned()),
                "bucket" => self.bucket = value.into_owned(),
                _ => {}
            }
        }
        self
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue { field: field.to_string(), reason };
    let url = Url::parse(value).map_err(|e| invalid(format!("{value}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ServiceConfig {
    /// Load and validate configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain.
    pub fn figment() -> Figment {
        Self::layered(Self::global_config_path())
    }

    fn layered(global_path: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = global_path {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from("prorev.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("PROREV_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prorev").join("prorev.toml"))
    }
}

#[cfg(target_arch = "wasm32")]
impl ServiceConfig {
    /// Defaults overridden by the page's query string and fragment.
    pub fn from_location() -> Self {
        let mut config = Self::default();
        if let Some(window) = web_sys::window() {
            let location = window.location();
            if let Ok(search) = location.search() {
                config = config.with_query(&search);
            }
            if let Ok(hash) = location.hash() {
                config = config.with_query(&hash);
            }
        }
        if let Err(e) = config.validate() {
            log::warn!("Ignoring URL configuration: {}", e);
            return Self::default();
        }
        config
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.api_base, "http://127.0.0.1:5001");
        assert_eq!(config.bucket, "PDFBucket");
        assert_eq!(config.feedback_delay(), Duration::from_millis(1500));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.storage_base.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "prorev.toml",
                r#"
                api_base = "http://tutor.local:8080"
                storage_base = "https://abc.supabase.co"
                debounce_ms = 900
                "#,
            )?;
            jail.set_env("PROREV_BUCKET", "Homework");
            jail.set_env("PROREV_DEBOUNCE_MS", "2000");
            jail.set_env("PROREV_REQUEST_TIMEOUT_MS", "15000");

            let config: ServiceConfig = ServiceConfig::layered(None).extract()?;
            assert_eq!(config.api_base, "http://tutor.local:8080");
            assert_eq!(config.storage_base.as_deref(), Some("https://abc.supabase.co"));
            assert_eq!(config.bucket, "Homework");
            assert_eq!(config.debounce_ms, 2000);
            assert_eq!(config.request_timeout(), Duration::from_secs(15));
            Ok(())
        });
    }

    #[test]
    fn figment_builds_without_files() {
        Jail::expect_with(|_| {
            let config: ServiceConfig = ServiceConfig::layered(None).extract()?;
            assert_eq!(config, ServiceConfig::default());
            Ok(())
        });
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = ServiceConfig { api_base: "localhost:5001".into(), ..ServiceConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = ServiceConfig { bucket: " ".into(), ..ServiceConfig::default() };
        assert!(config.validate().is_err());

        let config = ServiceConfig { debounce_ms: 0, ..ServiceConfig::default() };
        assert!(config.validate().is_err());

        let config = ServiceConfig { request_timeout_ms: 0, ..ServiceConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn query_parameters() {
        let config = ServiceConfig::default()
            .with_query("?api=https%3A%2F%2Fapi.example.com&bucket=Hw&unused=1&storage=");
        assert_eq!(config.api_base, "https://api.example.com");
        assert_eq!(config.bucket, "Hw");
        assert!(config.storage_base.is_none());

        let config = ServiceConfig::default().with_query("#storage=https://s.example.com");
        assert_eq!(config.storage_base.as_deref(), Some("https://s.example.com"));
    }
}
