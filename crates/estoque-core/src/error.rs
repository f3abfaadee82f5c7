//! # Error Types
//!
//! Domain-specific error types for estoque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  estoque-core errors (this file)                                        │
//! │  ├── CoreError        - Resolution failures + wrappers                  │
//! │  ├── ParseError       - Tag text could not be decoded                   │
//! │  └── ValidationError  - Movement/registration preconditions             │
//! │                                                                         │
//! │  estoque-nfc errors (separate crate)                                    │
//! │  └── ScanError        - Session boundary (API, timeout, concurrency)    │
//! │                                                                         │
//! │  Flow: ParseError/ValidationError → CoreError → ScanError → Notice      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No catalog entry matches the scanned tag.
    ///
    /// ## When This Occurs
    /// - `produto_id` doesn't match any product id
    /// - `codigo_barras` doesn't match any barcode
    /// - `nome` isn't a substring of any product name
    /// - The tag carries none of the three keys
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Tag text could not be decoded (wraps ParseError).
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Parse Error
// =============================================================================

/// Failures while turning a scanned NDEF message into a `TagPayload`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The message carries no record of type "text".
    #[error("Tag has no text record")]
    NoTextRecord,

    /// The text record is not valid UTF-8.
    #[error("Tag text is not valid UTF-8")]
    InvalidEncoding,

    /// The text is not a JSON object.
    #[error("Malformed tag payload: {0}")]
    MalformedPayload(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Precondition failures checked before any write reaches the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Movement tags must identify the product by id or barcode.
    #[error("Tag must contain a product id or barcode")]
    MissingIdentifier,

    /// `tipo` or `quantidade` is absent.
    #[error("Tag must contain a movement type and quantity")]
    MissingFields,

    /// `quantidade` does not coerce to a positive integer.
    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: String },

    /// `tipo` is neither "entrada" nor "saida".
    #[error("Invalid movement type '{value}': expected entrada or saida")]
    InvalidMovementType { value: String },

    /// Exit would take stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan tag (saida, qty: 20)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 20 }
    ///      │
    ///      ▼
    /// Notice: "Insufficient stock. Available: 3, requested: 20"
    /// ```
    #[error("Insufficient stock. Available: {available}, requested: {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Registration tags must carry a name or a barcode.
    #[error("Tag must contain at least a product name or barcode")]
    MissingProductIdentity,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
