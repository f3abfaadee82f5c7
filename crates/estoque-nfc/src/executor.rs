//! # Movement Executor
//!
//! Validates and records one stock movement against a resolved product.
//!
//! ## Execution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  execute(product, payload)          confirm(draft)                      │
//! │         │                                 │                             │
//! │         │                                 ▼                             │
//! │         │                        GET /produtos (fresh stock)            │
//! │         │                                 │                             │
//! │         ▼                                 ▼                             │
//! │  validation::movement_request    validation::confirm_draft              │
//! │         │                                 │                             │
//! │         └──────────────┬──────────────────┘                             │
//! │                        ▼                                                │
//! │          POST /estoque/{id}/{tipo}   (exactly once, never retried)      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                 MovementOutcome                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed precondition returns before any write is attempted.

use std::sync::Arc;

use chrono::Utc;
use estoque_core::validation;
use estoque_core::{MovementDraft, MovementOutcome, MovementRequest, Product, TagPayload};
use tracing::{error, info};

use crate::api::InventoryApi;
use crate::error::{ScanError, ScanResult};

/// Applies stock movements through the inventory API.
#[derive(Clone)]
pub struct MovementExecutor {
    api: Arc<dyn InventoryApi>,
}

impl MovementExecutor {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        MovementExecutor { api }
    }

    /// Validates `payload` against `product` and records the movement.
    pub async fn execute(
        &self,
        product: &Product,
        payload: &TagPayload,
    ) -> ScanResult<MovementOutcome> {
        let request = validation::movement_request(product, payload)?;
        self.submit(product, request).await
    }

    /// Records a previously drafted movement.
    ///
    /// Stock is re-read first, so an exit that became impossible since the
    /// draft was made is rejected without writing.
    pub async fn confirm(&self, draft: &MovementDraft) -> ScanResult<MovementOutcome> {
        let products = self.api.list_products().await?;
        let current = products
            .iter()
            .find(|p| p.id == draft.product.id)
            .ok_or_else(|| ScanError::ProductNotFound(format!("id {}", draft.product.id)))?;

        let request = validation::confirm_draft(draft, current)?;
        self.submit(current, request).await
    }

    async fn submit(
        &self,
        product: &Product,
        request: MovementRequest,
    ) -> ScanResult<MovementOutcome> {
        info!(
            product_id = request.product_id,
            tipo = %request.movement_type,
            quantity = request.quantity,
            "Recording stock movement"
        );

        if let Err(e) = self.api.record_movement(&request).await {
            error!(product_id = request.product_id, error = %e, "Stock movement failed");
            return Err(e.into());
        }

        Ok(MovementOutcome {
            product_id: product.id,
            product_name: product.name.clone(),
            movement_type: request.movement_type,
            quantity: request.quantity,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::{catalog, product, RecordingApi};
    use estoque_core::tag::parse_text;
    use estoque_core::{MovementType, ValidationError};

    fn executor(api: &Arc<RecordingApi>) -> MovementExecutor {
        MovementExecutor::new(api.clone())
    }

    #[tokio::test]
    async fn test_entry_is_recorded_with_default_description() {
        let api = Arc::new(RecordingApi::with_products(catalog()));
        let payload = parse_text(r#"{"produto_id": 7, "tipo": "entrada", "quantidade": 5}"#).unwrap();

        let outcome = executor(&api)
            .execute(&product(7, "Parafuso M8", None, 10), &payload)
            .await
            .unwrap();

        assert_eq!(outcome.product_id, 7);
        assert_eq!(outcome.summary(), "Entry of 5 units recorded for Parafuso M8");

        let movements = api.movements();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].path(), "/estoque/7/entrada");
        assert_eq!(movements[0].quantity, 5);
        assert_eq!(
            movements[0].description,
            "Movimentação automática via NFC - entrada"
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let api = Arc::new(RecordingApi::with_products(catalog()));
        let payload =
            parse_text(r#"{"codigo_barras": "ABC123", "tipo": "saida", "quantidade": 20}"#).unwrap();

        let err = executor(&api)
            .execute(&product(12, "Arruela", Some("ABC123"), 3), &payload)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScanError::Validation(ValidationError::InsufficientStock {
                available: 3,
                requested: 20
            })
        ));
        assert!(api.movements().is_empty());
    }

    #[tokio::test]
    async fn test_api_rejection_is_surfaced() {
        let api = Arc::new(
            RecordingApi::with_products(catalog()).failing_writes(ApiError::Rejected {
                status: 200,
                message: "Estoque insuficiente".into(),
            }),
        );
        let payload = parse_text(r#"{"produto_id": 7, "tipo": "saida", "quantidade": 1}"#).unwrap();

        let err = executor(&api)
            .execute(&product(7, "Parafuso M8", None, 10), &payload)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Estoque insuficiente");
    }

    #[tokio::test]
    async fn test_confirm_uses_fresh_stock() {
        let api = Arc::new(RecordingApi::with_products(catalog()));
        let draft = MovementDraft {
            product: product(20, "Luva de Nitrilo", Some("789"), 50),
            movement_type: MovementType::Exit,
            quantity: 30,
            description: "Movimentação via NFC - saida".into(),
        };

        api.set_stock(20, 10);
        let err = executor(&api).confirm(&draft).await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::Validation(ValidationError::InsufficientStock { available: 10, .. })
        ));
        assert!(api.movements().is_empty());

        api.set_stock(20, 40);
        let outcome = executor(&api).confirm(&draft).await.unwrap();
        assert_eq!(outcome.quantity, 30);
        assert_eq!(api.movements().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_for_deleted_product() {
        let api = Arc::new(RecordingApi::with_products(vec![]));
        let draft = MovementDraft {
            product: product(99, "Removido", None, 5),
            movement_type: MovementType::Entry,
            quantity: 1,
            description: String::new(),
        };

        let err = executor(&api).confirm(&draft).await.unwrap_err();
        assert!(matches!(err, ScanError::ProductNotFound(_)));
    }
}
