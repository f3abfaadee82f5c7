//! # estoque-nfc: Scan Workflow for the Inventory Client
//!
//! This crate runs NFC scan sessions end to end: it waits for one tag,
//! decodes it, resolves the product against the live catalog and records the
//! requested stock movement through the inventory REST API.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Scan Session                                 │
//! │                                                                         │
//! │  ┌──────────────┐  scan()   ┌──────────────┐  tag   ┌────────────────┐ │
//! │  │ Front end    │ ────────► │ ScanSession  │ ◄───── │ TagReader      │ │
//! │  │ (any)        │           │ Controller   │        │ (subscription) │ │
//! │  │              │ ◄──────── │              │        └────────────────┘ │
//! │  └──────────────┘ ScanEvent └──────┬───────┘                           │
//! │                                    │ NdefMessage                        │
//! │                                    ▼                                    │
//! │                           ┌──────────────┐      ┌─────────────────────┐ │
//! │                           │ ScanWorkflow │ ───► │ InventoryApi        │ │
//! │                           │ + Executor   │      │ GET  /produtos      │ │
//! │                           └──────────────┘      │ POST /estoque/..    │ │
//! │                                                 └─────────────────────┘ │
//! │                                                                         │
//! │  • one session at a time       • no retries, ever                      │
//! │  • cancel and timeout race the tag read                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - `ScanSessionController` and its state machine
//! - [`workflow`] - Movement, lookup and registration workflows
//! - [`executor`] - Stock movement execution
//! - [`api`] - `InventoryApi` trait and the `reqwest` client
//! - [`reader`] - `TagReader` trait and tag subscriptions
//! - [`events`] - Notices and UI events
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use estoque_nfc::{HttpInventoryApi, NfcConfig, ScanSessionController};
//!
//! let config = NfcConfig::load_or_default(None);
//! let api = Arc::new(HttpInventoryApi::new(&config.api)?);
//! let controller = ScanSessionController::from_config(reader, api, &config);
//!
//! let mut events = controller.subscribe();
//! let outcome = controller.scan(config.scan.mode).await?;
//! println!("{}", outcome.notice().message);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod reader;
pub mod session;
pub mod workflow;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{HttpInventoryApi, InventoryApi};
pub use config::{ApiSettings, NfcConfig, ScanSettings};
pub use error::{ApiError, ApiResult, ConcurrencyError, ConfigError, ScanError, ScanResult};
pub use events::{Notice, NoticeLevel, ScanEvent, View};
pub use executor::MovementExecutor;
pub use reader::{ChannelTagReader, ReaderEvent, TagReader, TagSubscription};
pub use session::{ScanSessionController, SessionState};
pub use workflow::{ScanMode, ScanOutcome, ScanWorkflow};
