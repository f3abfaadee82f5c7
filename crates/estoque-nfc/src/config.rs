//! # Scan Configuration
//!
//! Configuration for the inventory API client and scan sessions.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ESTOQUE_API_URL=http://10.0.0.5:5000/api                           │
//! │     ESTOQUE_SCAN_TIMEOUT_SECS=15                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/nfc/nfc.toml (Linux)                                     │
//! │     ~/Library/Application Support/com.estoque.nfc/nfc.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:5000/api, 10 s scan deadline                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # nfc.toml
//! [api]
//! base_url = "http://localhost:5000/api"
//! request_timeout_secs = 10
//!
//! [scan]
//! timeout_secs = 10
//! mode = "movement"  # movement | lookup | register
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::workflow::ScanMode;

// =============================================================================
// API Settings
// =============================================================================

/// Where the inventory REST API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl ApiSettings {
    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Scan Settings
// =============================================================================

/// Scan session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// How long a session waits for a tag before giving up (seconds).
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,

    /// Workflow run by the scan station.
    #[serde(default)]
    pub mode: ScanMode,
}

fn default_scan_timeout() -> u64 {
    10
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            timeout_secs: default_scan_timeout(),
            mode: ScanMode::default(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NfcConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub scan: ScanSettings,
}

impl NfcConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (nfc.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scan.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "scan timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ESTOQUE_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(secs) = std::env::var("ESTOQUE_API_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric ESTOQUE_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(secs) = std::env::var("ESTOQUE_SCAN_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.scan.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric ESTOQUE_SCAN_TIMEOUT_SECS"),
            }
        }

        if let Ok(mode) = std::env::var("ESTOQUE_SCAN_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding scan mode from environment");
                    self.scan.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown scan mode in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "estoque", "nfc")
            .map(|dirs| dirs.config_dir().join("nfc.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Deadline for one tag read.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.timeout_secs)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NfcConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.scan_timeout(), Duration::from_secs(10));
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.scan.mode, ScanMode::Movement);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = NfcConfig::default();

        config.api.base_url = "ws://localhost:5000".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.api.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.api.base_url = "https://estoque.example.com/api".into();
        assert!(config.validate().is_ok());

        config.scan.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NfcConfig = toml::from_str(
            r#"
            [scan]
            mode = "lookup"
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.mode, ScanMode::Lookup);
        assert_eq!(config.scan.timeout_secs, 10);
        assert_eq!(config.api.request_timeout_secs, 10);
    }

    #[test]
    fn test_toml_serialization() {
        let config = NfcConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[scan]"));
        assert!(toml_str.contains("mode = \"movement\""));
    }

    #[test]
    fn test_save_and_load_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("estoque-nfc-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nfc.toml");

        let mut config = NfcConfig::default();
        config.scan.timeout_secs = 25;
        config.save(Some(path.clone())).unwrap();

        let loaded = NfcConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.scan.timeout_secs, 25);

        std::fs::remove_dir_all(dir).ok();
    }
}
