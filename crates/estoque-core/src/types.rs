//! # Domain Types
//!
//! Wire types shared with the inventory REST API and the browser front end.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ MovementRequest │   │ MovementOutcome │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  product_id     │   │  product_name   │       │
//! │  │  nome           │   │  movement_type  │   │  movement_type  │       │
//! │  │  codigo_barras  │   │  quantidade     │   │  quantity       │       │
//! │  │  quantidade     │   │  descricao      │   │  recorded_at    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  MovementType   │   │   NewProduct    │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Entry (entrada)│   │  registration   │                             │
//! │  │  Exit  (saida)  │   │  body           │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names are English in Rust and Portuguese on the wire; every
//! renamed field carries a `#[serde(rename)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry as returned by `GET /produtos`.
///
/// Only the attributes the scan workflow reads are modelled; unknown fields
/// in the response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier assigned by the catalog service.
    pub id: i64,

    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,

    /// Barcode, not guaranteed unique across the catalog.
    #[serde(rename = "codigo_barras", default)]
    pub barcode: Option<String>,

    /// Current stock level. `null` when the product has no stock row yet.
    #[serde(rename = "quantidade", default)]
    pub stock: Option<i64>,
}

impl Product {
    /// Current stock, reading a missing stock row as zero.
    #[inline]
    pub fn available(&self) -> i64 {
        self.stock.unwrap_or(0)
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MovementType {
    /// Stock increase.
    #[serde(rename = "entrada")]
    Entry,
    /// Stock decrease.
    #[serde(rename = "saida")]
    Exit,
}

impl MovementType {
    /// Path segment used by the `/estoque/{id}/{tipo}` endpoint.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "entrada",
            MovementType::Exit => "saida",
        }
    }

    /// Human-readable label for notices.
    pub const fn label(&self) -> &'static str {
        match self {
            MovementType::Entry => "Entry",
            MovementType::Exit => "Exit",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" => Ok(MovementType::Entry),
            "saida" => Ok(MovementType::Exit),
            _ => Err(ValidationError::InvalidMovementType {
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Movement Request
// =============================================================================

/// A validated stock movement, alive for the duration of one API call.
///
/// Only `quantidade` and `descricao` travel in the body; the product id and
/// the direction are part of the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct MovementRequest {
    #[serde(skip)]
    pub product_id: i64,

    #[serde(skip)]
    pub movement_type: MovementType,

    /// Always positive.
    #[serde(rename = "quantidade")]
    pub quantity: i64,

    #[serde(rename = "descricao")]
    pub description: String,
}

impl MovementRequest {
    /// Request path relative to the API base.
    pub fn path(&self) -> String {
        format!("/estoque/{}/{}", self.product_id, self.movement_type)
    }
}

// =============================================================================
// Movement Outcome
// =============================================================================

/// What the UI shows after a movement is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementOutcome {
    pub product_id: i64,
    pub product_name: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

impl MovementOutcome {
    /// Success message, e.g. "Entry of 5 units recorded for Parafuso M8".
    pub fn summary(&self) -> String {
        format!(
            "{} of {} units recorded for {}",
            self.movement_type.label(),
            self.quantity,
            self.product_name
        )
    }
}

// =============================================================================
// Movement Draft
// =============================================================================

/// A movement read from a tag without `auto_movimentacao`.
///
/// Type and quantity are already validated; stock is checked again when the
/// draft is confirmed, against a fresh catalog read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct MovementDraft {
    pub product: Product,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub description: String,
}

// =============================================================================
// New Product
// =============================================================================

/// Registration body for `POST /produtos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "codigo_barras")]
    pub barcode: String,
    #[serde(rename = "quantidade")]
    pub initial_stock: i64,
    #[serde(rename = "estoque_minimo")]
    pub min_stock: i64,
    #[serde(rename = "estoque_maximo")]
    pub max_stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_from_catalog_row() {
        let json = r#"{"id": 7, "nome": "Parafuso M8", "codigo_barras": null,
                       "quantidade": 10, "estoque_minimo": 5, "categoria": "Ferragens"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.name, "Parafuso M8");
        assert_eq!(product.barcode, None);
        assert_eq!(product.available(), 10);
    }

    #[test]
    fn test_missing_stock_reads_as_zero() {
        let product: Product = serde_json::from_str(r#"{"id": 1, "nome": "X"}"#).unwrap();
        assert_eq!(product.available(), 0);
    }

    #[test]
    fn test_movement_type_parsing() {
        assert_eq!("entrada".parse::<MovementType>().unwrap(), MovementType::Entry);
        assert_eq!(" SAIDA ".parse::<MovementType>().unwrap(), MovementType::Exit);
        assert!(matches!(
            "transfer".parse::<MovementType>(),
            Err(ValidationError::InvalidMovementType { .. })
        ));
    }

    #[test]
    fn test_movement_request_body_and_path() {
        let request = MovementRequest {
            product_id: 7,
            movement_type: MovementType::Entry,
            quantity: 5,
            description: "Reposição".to_string(),
        };
        assert_eq!(request.path(), "/estoque/7/entrada");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"quantidade": 5, "descricao": "Reposição"})
        );
    }

    #[test]
    fn test_outcome_summary() {
        let outcome = MovementOutcome {
            product_id: 7,
            product_name: "Parafuso M8".to_string(),
            movement_type: MovementType::Exit,
            quantity: 2,
            recorded_at: Utc::now(),
        };
        assert_eq!(outcome.summary(), "Exit of 2 units recorded for Parafuso M8");
    }
}
