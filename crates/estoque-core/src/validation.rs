//! # Validation Module
//!
//! Preconditions checked before anything is written to the inventory API.
//!
//! ## Movement Checks (first violation wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Movement Validation                                │
//! │                                                                         │
//! │  1. tipo and quantidade present?     ── no ──► MissingFields            │
//! │  2. quantidade a positive integer?   ── no ──► InvalidQuantity          │
//! │  3. tipo is entrada | saida?         ── no ──► InvalidMovementType      │
//! │  4. saida and stock < quantidade?    ── yes ─► InsufficientStock        │
//! │                                                                         │
//! │  Only then is a MovementRequest built.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are never checked against stock.

use crate::error::ValidationError;
use crate::tag::{RawField, TagPayload};
use crate::types::{MovementDraft, MovementRequest, MovementType, NewProduct, Product};
use crate::{
    DEFAULT_CATEGORY, DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, DEFAULT_PRODUCT_NAME,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Movement tags must name the product by id or barcode.
pub fn validate_movement_identifier(payload: &TagPayload) -> ValidationResult<()> {
    if payload.has_movement_identifier() {
        Ok(())
    } else {
        Err(ValidationError::MissingIdentifier)
    }
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound beyond `i64`
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::InvalidQuantity {
            value: qty.to_string(),
        });
    }
    Ok(())
}

/// Checks presence and shape of `tipo` and `quantidade`.
///
/// Returns the parsed direction and the positive quantity.
pub fn validate_movement_fields(payload: &TagPayload) -> ValidationResult<(MovementType, i64)> {
    let (Some(raw_type), Some(raw_quantity)) = (&payload.movement_type, &payload.quantity) else {
        return Err(ValidationError::MissingFields);
    };

    let quantity = raw_quantity
        .as_integer()
        .ok_or_else(|| ValidationError::InvalidQuantity {
            value: raw_quantity.to_string(),
        })?;
    validate_quantity(quantity)?;

    let movement_type = raw_type.parse::<MovementType>()?;
    Ok((movement_type, quantity))
}

/// Rejects exits that exceed current stock.
pub fn check_stock(
    product: &Product,
    movement_type: MovementType,
    quantity: i64,
) -> ValidationResult<()> {
    if movement_type == MovementType::Exit && product.available() < quantity {
        return Err(ValidationError::InsufficientStock {
            available: product.available(),
            requested: quantity,
        });
    }
    Ok(())
}

// =============================================================================
// Descriptions
// =============================================================================

/// Description sent when a tag executes a movement on its own.
pub fn auto_movement_description(movement_type: MovementType) -> String {
    format!("Movimentação automática via NFC - {}", movement_type)
}

/// Description prefilled when a tag only drafts a movement.
pub fn draft_movement_description(movement_type: MovementType) -> String {
    format!("Movimentação via NFC - {}", movement_type)
}

// =============================================================================
// Builders
// =============================================================================

/// Validates a tag against a resolved product and builds the write request.
pub fn movement_request(product: &Product, payload: &TagPayload) -> ValidationResult<MovementRequest> {
    let (movement_type, quantity) = validate_movement_fields(payload)?;
    check_stock(product, movement_type, quantity)?;

    Ok(MovementRequest {
        product_id: product.id,
        movement_type,
        quantity,
        description: payload
            .description
            .clone()
            .unwrap_or_else(|| auto_movement_description(movement_type)),
    })
}

/// Builds a draft for review. Stock is not checked here.
pub fn movement_draft(product: &Product, payload: &TagPayload) -> ValidationResult<MovementDraft> {
    let (movement_type, quantity) = validate_movement_fields(payload)?;

    Ok(MovementDraft {
        product: product.clone(),
        movement_type,
        quantity,
        description: payload
            .description
            .clone()
            .unwrap_or_else(|| draft_movement_description(movement_type)),
    })
}

/// Turns a confirmed draft into a request, checking stock on `current`.
///
/// `current` is the product as re-read at confirmation time; the draft's own
/// snapshot may be stale.
pub fn confirm_draft(draft: &MovementDraft, current: &Product) -> ValidationResult<MovementRequest> {
    validate_quantity(draft.quantity)?;
    check_stock(current, draft.movement_type, draft.quantity)?;

    Ok(MovementRequest {
        product_id: current.id,
        movement_type: draft.movement_type,
        quantity: draft.quantity,
        description: draft.description.clone(),
    })
}

/// Builds a registration body from a tag, filling catalog defaults.
pub fn new_product(payload: &TagPayload) -> ValidationResult<NewProduct> {
    if payload.name.is_none() && payload.registration_barcode().is_none() {
        return Err(ValidationError::MissingProductIdentity);
    }

    let int_or = |field: &Option<RawField>, default: i64| {
        field.as_ref().and_then(|f| f.as_integer()).unwrap_or(default)
    };

    Ok(NewProduct {
        name: payload
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
        description: payload.description.clone().unwrap_or_default(),
        category: payload
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        price: payload
            .price
            .as_ref()
            .and_then(|p| p.as_decimal())
            .unwrap_or(0.0),
        barcode: payload.registration_barcode().unwrap_or_default().to_string(),
        initial_stock: payload
            .quantity
            .as_ref()
            .or(payload.initial_stock.as_ref())
            .and_then(|q| q.as_integer())
            .unwrap_or(0),
        min_stock: int_or(&payload.min_stock, DEFAULT_MIN_STOCK),
        max_stock: int_or(&payload.max_stock, DEFAULT_MAX_STOCK),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_text;

    fn product(stock: i64) -> Product {
        Product {
            id: 7,
            name: "Parafuso M8".to_string(),
            barcode: Some("ABC123".to_string()),
            stock: Some(stock),
        }
    }

    #[test]
    fn test_missing_fields_wins_first() {
        let payload = parse_text(r#"{"produto_id": 7, "quantidade": -1}"#).unwrap();
        assert_eq!(
            movement_request(&product(10), &payload),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_invalid_quantity() {
        for raw in [r#"0"#, r#"-4"#, r#""muitos""#, r#"true"#] {
            let text = format!(r#"{{"tipo": "entrada", "quantidade": {}}}"#, raw);
            let payload = parse_text(&text).unwrap();
            assert!(
                matches!(
                    movement_request(&product(10), &payload),
                    Err(ValidationError::InvalidQuantity { .. })
                ),
                "quantity {} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_quantity_checked_before_type() {
        let payload = parse_text(r#"{"tipo": "transferencia", "quantidade": 0}"#).unwrap();
        assert!(matches!(
            validate_movement_fields(&payload),
            Err(ValidationError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_invalid_movement_type() {
        let payload = parse_text(r#"{"tipo": "transferencia", "quantidade": 2}"#).unwrap();
        assert!(matches!(
            movement_request(&product(10), &payload),
            Err(ValidationError::InvalidMovementType { .. })
        ));
    }

    #[test]
    fn test_exit_beyond_stock_is_rejected() {
        let payload = parse_text(r#"{"tipo": "saida", "quantidade": 20}"#).unwrap();
        assert_eq!(
            movement_request(&product(3), &payload),
            Err(ValidationError::InsufficientStock {
                available: 3,
                requested: 20
            })
        );
    }

    #[test]
    fn test_exit_of_entire_stock_is_allowed() {
        let payload = parse_text(r#"{"tipo": "saida", "quantidade": 3}"#).unwrap();
        assert!(movement_request(&product(3), &payload).is_ok());
    }

    #[test]
    fn test_entry_ignores_stock() {
        for (stock, qty) in [(0, 1), (3, 20), (10, i64::MAX)] {
            let text = format!(r#"{{"tipo": "entrada", "quantidade": {}}}"#, qty);
            let payload = parse_text(&text).unwrap();
            let request = movement_request(&product(stock), &payload).unwrap();
            assert_eq!(request.quantity, qty);
            assert_eq!(request.movement_type, MovementType::Entry);
        }
    }

    #[test]
    fn test_default_description() {
        let payload = parse_text(r#"{"tipo": "Entrada", "quantidade": "5"}"#).unwrap();
        let request = movement_request(&product(10), &payload).unwrap();
        assert_eq!(request.description, "Movimentação automática via NFC - entrada");

        let payload =
            parse_text(r#"{"tipo": "entrada", "quantidade": 5, "descricao": "Lote 12"}"#).unwrap();
        let request = movement_request(&product(10), &payload).unwrap();
        assert_eq!(request.description, "Lote 12");
    }

    #[test]
    fn test_draft_defers_stock_check() {
        let payload = parse_text(r#"{"tipo": "saida", "quantidade": 20}"#).unwrap();
        let draft = movement_draft(&product(3), &payload).unwrap();
        assert_eq!(draft.description, "Movimentação via NFC - saida");

        assert!(matches!(
            confirm_draft(&draft, &product(3)),
            Err(ValidationError::InsufficientStock { .. })
        ));
        assert!(confirm_draft(&draft, &product(25)).is_ok());
    }

    #[test]
    fn test_identifier_required_for_movements() {
        let payload = parse_text(r#"{"nome": "Parafuso", "tipo": "entrada"}"#).unwrap();
        assert_eq!(
            validate_movement_identifier(&payload),
            Err(ValidationError::MissingIdentifier)
        );
    }

    #[test]
    fn test_new_product_defaults() {
        let payload = parse_text(r#"{"codigo_barras": "789"}"#).unwrap();
        let body = new_product(&payload).unwrap();
        assert_eq!(body.name, DEFAULT_PRODUCT_NAME);
        assert_eq!(body.category, DEFAULT_CATEGORY);
        assert_eq!(body.price, 0.0);
        assert_eq!(body.barcode, "789");
        assert_eq!(body.initial_stock, 0);
        assert_eq!(body.min_stock, 10);
        assert_eq!(body.max_stock, 100);
    }

    #[test]
    fn test_new_product_reads_tag_fields() {
        let payload = parse_text(
            r#"{"nome": "Luva", "preco": "12.50", "estoque_inicial": 30,
                "estoque_minimo": "5", "categoria": "EPI"}"#,
        )
        .unwrap();
        let body = new_product(&payload).unwrap();
        assert_eq!(body.price, 12.5);
        assert_eq!(body.initial_stock, 30);
        assert_eq!(body.min_stock, 5);
        assert_eq!(body.category, "EPI");
    }

    #[test]
    fn test_new_product_needs_name_or_barcode() {
        let payload = parse_text(r#"{"preco": 3}"#).unwrap();
        assert_eq!(
            new_product(&payload),
            Err(ValidationError::MissingProductIdentity)
        );
    }
}
