//! # estoque-core: Pure Logic for the NFC Stock Workflow
//!
//! This crate holds everything in the scan-to-act workflow that does not touch
//! the network or the NFC hardware.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     NFC Stock Workflow                                  │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Browser front end (out of scope)                 │   │
//! │  │    Notices ◄── Waiting indicator ◄── Catalog/Stock tables       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ScanEvent stream                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           estoque-nfc (sessions, REST client, reader)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ estoque-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │    tag    │  │ resolver  │  │validation │  │   types   │  │   │
//! │  │   │  NDEF →   │  │ id, code, │  │ movement  │  │  Product  │  │   │
//! │  │   │TagPayload │  │   name    │  │  checks   │  │ Movement  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO HARDWARE • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tag`] - NDEF message types and the tag payload parser
//! - [`resolver`] - Tag → catalog product lookup
//! - [`validation`] - Movement and registration preconditions
//! - [`types`] - Wire types (Product, MovementRequest, ...)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use estoque_core::tag::{parse_message, NdefMessage, NdefRecord};
//! use estoque_core::{resolver, validation, Product};
//!
//! let message = NdefMessage::new(vec![NdefRecord::text(
//!     r#"{"produto_id": 7, "tipo": "entrada", "quantidade": 5}"#,
//! )]);
//! let payload = parse_message(&message).unwrap();
//!
//! let catalog = vec![Product { id: 7, name: "Parafuso M8".into(), barcode: None, stock: Some(10) }];
//! let product = resolver::resolve(&payload, &catalog).unwrap();
//!
//! let request = validation::movement_request(product, &payload).unwrap();
//! assert_eq!(request.path(), "/estoque/7/entrada");
//! assert_eq!(request.quantity, 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod resolver;
pub mod tag;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ParseError, ValidationError};
pub use tag::{NdefMessage, NdefRecord, TagPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name given to products registered from a tag without `nome`.
pub const DEFAULT_PRODUCT_NAME: &str = "Produto NFC";

/// Category given to products registered from a tag without `categoria`.
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Minimum stock level for products registered from a tag.
pub const DEFAULT_MIN_STOCK: i64 = 10;

/// Maximum stock level for products registered from a tag.
pub const DEFAULT_MAX_STOCK: i64 = 100;
