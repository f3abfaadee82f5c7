//! # Scan Error Types
//!
//! Error types for the scan workflow.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Tag            │  │  Catalog        │  │     API                 │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Parse          │  │  ProductNotFound│  │  Transport              │ │
//! │  │  Reader         │  │  Validation     │  │  Rejected (verbatim)    │ │
//! │  │  NfcUnsupported │  │                 │  │  Decode                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Session        │  │  Config         │  │                         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Concurrency    │  │  InvalidConfig  │  │                         │ │
//! │  │  Timeout        │  │  InvalidUrl     │  │                         │ │
//! │  │  Cancelled      │  │  Load/Save      │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `ScanError` is terminal for the current scan attempt. None of them
//! is retried automatically: a movement POST is not idempotent, so the
//! user's manual re-scan is the only retry.

use std::time::Duration;

use estoque_core::{CoreError, ParseError, ValidationError};
use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for inventory API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Scan Error
// =============================================================================

/// Everything that can end a scan attempt.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The device has no usable NFC reader.
    #[error("NFC is not supported on this device")]
    NfcUnsupported,

    /// The reader reported an error instead of a tag.
    #[error("Failed to read NFC tag: {0}")]
    Reader(String),

    /// The tag text could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No catalog entry matches the tag.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A precondition failed before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The inventory API failed or refused the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Another session already owns the reader.
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// No tag was read before the deadline.
    #[error("No NFC tag read within {0:?}")]
    Timeout(Duration),

    /// The user cancelled the session.
    #[error("Scan cancelled")]
    Cancelled,
}

impl From<CoreError> for ScanError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(what) => ScanError::ProductNotFound(what),
            CoreError::Parse(e) => ScanError::Parse(e),
            CoreError::Validation(e) => ScanError::Validation(e),
        }
    }
}

impl ScanError {
    /// Returns true if the session ended without an actual failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, ScanError::Cancelled | ScanError::Timeout(_))
    }
}

// =============================================================================
// Concurrency Error
// =============================================================================

/// Overlapping session attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    #[error("A scan session is already active")]
    SessionAlreadyActive,
}

// =============================================================================
// API Error
// =============================================================================

/// Failures talking to the inventory REST API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("Inventory API unreachable: {0}")]
    Transport(String),

    /// The server answered with an error status or `success: false`.
    /// The message is the server's, shown as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The response body was not what the endpoint promises.
    #[error("Unexpected response from inventory API: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration load/save/validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        ConfigError::InvalidUrl(err.to_string())
    }
}
