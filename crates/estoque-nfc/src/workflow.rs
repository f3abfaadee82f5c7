//! # Scan Workflows
//!
//! What happens to a tag once it has been read.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MOVEMENT                                                               │
//! │  parse ─► identifier + tipo/quantidade ─► GET /produtos ─► resolve      │
//! │        ─► auto_movimentacao ? execute : MovementPending(draft)          │
//! │                                                                         │
//! │  LOOKUP                                                                 │
//! │  parse ─► GET /produtos ─► resolve ─► ProductFound                      │
//! │                                                                         │
//! │  REGISTER                                                               │
//! │  parse ─► nome | codigo_barras ─► auto_cadastro ?                       │
//! │                     POST /produtos : ProductPending(new product)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog is fetched fresh for every tag; nothing is cached.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use estoque_core::tag::parse_message;
use estoque_core::{resolver, validation};
use estoque_core::{MovementDraft, MovementOutcome, NdefMessage, NewProduct, Product};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::InventoryApi;
use crate::error::{ConfigError, ScanResult};
use crate::events::{Notice, View};
use crate::executor::MovementExecutor;

// =============================================================================
// Scan Mode
// =============================================================================

/// Which workflow a scan feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Record a stock entry or exit.
    #[default]
    Movement,
    /// Find a product and show its stock.
    Lookup,
    /// Register a new product.
    Register,
}

impl ScanMode {
    /// Text shown next to the waiting indicator.
    pub fn prompt(&self) -> &'static str {
        match self {
            ScanMode::Movement => "Hold the NFC tag near the device to record a stock movement",
            ScanMode::Lookup => "Hold the NFC tag near the device to look up the product",
            ScanMode::Register => "Hold the NFC tag near the device to register the product",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Movement => "movement",
            ScanMode::Lookup => "lookup",
            ScanMode::Register => "register",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movement" | "movimentacao" | "estoque" => Ok(ScanMode::Movement),
            "lookup" | "busca" | "search" => Ok(ScanMode::Lookup),
            "register" | "cadastro" => Ok(ScanMode::Register),
            other => Err(ConfigError::InvalidConfig(format!(
                "unknown scan mode: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// Successful end of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The movement was written.
    MovementRecorded(MovementOutcome),
    /// The tag did not ask for automatic execution; awaiting confirmation.
    MovementPending(MovementDraft),
    /// Lookup result, with the text to prefill search boxes with.
    ProductFound {
        product: Product,
        search_term: Option<String>,
    },
    /// The product was created.
    ProductRegistered { name: String, id: Option<i64> },
    /// Registration data read from the tag, awaiting confirmation.
    ProductPending(NewProduct),
}

impl ScanOutcome {
    /// Notice shown to the user.
    pub fn notice(&self) -> Notice {
        match self {
            ScanOutcome::MovementRecorded(outcome) => Notice::success(outcome.summary()),
            ScanOutcome::MovementPending(draft) => Notice::info(format!(
                "Confirm {} of {} units for {}",
                draft.movement_type.label().to_lowercase(),
                draft.quantity,
                draft.product.name
            )),
            ScanOutcome::ProductFound { product, .. } => Notice::success(format!(
                "Product found: {} - stock: {}",
                product.name,
                product.available()
            )),
            ScanOutcome::ProductRegistered { name, .. } => {
                Notice::success(format!("Product {} registered", name))
            }
            ScanOutcome::ProductPending(product) => {
                Notice::info(format!("Review {} before registering", product.name))
            }
        }
    }

    /// Views whose data changed.
    pub fn refreshes(&self) -> &'static [View] {
        match self {
            ScanOutcome::MovementRecorded(_) => &[View::Catalog, View::Stock],
            ScanOutcome::ProductRegistered { .. } => &[View::Catalog],
            _ => &[],
        }
    }
}

// =============================================================================
// Scan Workflow
// =============================================================================

/// Turns a read tag into a `ScanOutcome`.
#[derive(Clone)]
pub struct ScanWorkflow {
    api: Arc<dyn InventoryApi>,
    executor: MovementExecutor,
}

impl ScanWorkflow {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        let executor = MovementExecutor::new(Arc::clone(&api));
        ScanWorkflow { api, executor }
    }

    /// Runs the workflow for `mode` on a scanned message.
    pub async fn process(&self, mode: ScanMode, message: &NdefMessage) -> ScanResult<ScanOutcome> {
        let payload = parse_message(message)?;
        debug!(%mode, ?payload, "Tag decoded");

        match mode {
            ScanMode::Movement => {
                validation::validate_movement_identifier(&payload)?;
                validation::validate_movement_fields(&payload)?;

                let products = self.api.list_products().await?;
                let product = resolver::resolve(&payload, &products)?;

                if payload.auto_movement {
                    let outcome = self.executor.execute(product, &payload).await?;
                    Ok(ScanOutcome::MovementRecorded(outcome))
                } else {
                    let draft = validation::movement_draft(product, &payload)?;
                    info!(product_id = product.id, "Movement drafted for confirmation");
                    Ok(ScanOutcome::MovementPending(draft))
                }
            }
            ScanMode::Lookup => {
                debug!(key = ?resolver::lookup_key(&payload), "Looking up product");
                let products = self.api.list_products().await?;
                let product = resolver::resolve(&payload, &products)?;
                Ok(ScanOutcome::ProductFound {
                    product: product.clone(),
                    search_term: payload.search_term().map(str::to_string),
                })
            }
            ScanMode::Register => {
                let new_product = validation::new_product(&payload)?;
                if payload.auto_register {
                    self.register(new_product).await
                } else {
                    Ok(ScanOutcome::ProductPending(new_product))
                }
            }
        }
    }

    /// Executes a drafted movement.
    pub async fn confirm_movement(&self, draft: &MovementDraft) -> ScanResult<ScanOutcome> {
        let outcome = self.executor.confirm(draft).await?;
        Ok(ScanOutcome::MovementRecorded(outcome))
    }

    /// Registers a reviewed product.
    pub async fn confirm_product(&self, product: NewProduct) -> ScanResult<ScanOutcome> {
        self.register(product).await
    }

    async fn register(&self, product: NewProduct) -> ScanResult<ScanOutcome> {
        let id = self.api.create_product(&product).await?;
        info!(name = %product.name, ?id, "Product registered");
        Ok(ScanOutcome::ProductRegistered {
            name: product.name,
            id,
        })
    }
}
