//! # Inventory API Client
//!
//! Typed client for the external inventory REST API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory REST API                                 │
//! │                                                                         │
//! │  GET  {base}/produtos              ──► [Product]                        │
//! │  POST {base}/estoque/{id}/{tipo}   ──► {success, ...}                   │
//! │       body {quantidade, descricao}                                      │
//! │  POST {base}/produtos              ──► {success, id}                    │
//! │       body NewProduct                                                   │
//! │                                                                         │
//! │  FAILURE BODIES                                                        │
//! │  ──────────────                                                        │
//! │  non-2xx            → message | error | "Request failed"                │
//! │  2xx, success:false → same lookup, reported as Rejected                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call is made once. Movements are not idempotent, so a failed POST
//! is never replayed here.

use async_trait::async_trait;
use estoque_core::{MovementRequest, NewProduct, Product};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiSettings;
use crate::error::{ApiError, ApiResult};

/// Message used when a failure body carries neither `message` nor `error`.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

// =============================================================================
// Inventory API Trait
// =============================================================================

/// The three inventory calls the scan workflow needs.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Fetches the whole catalog.
    async fn list_products(&self) -> ApiResult<Vec<Product>>;

    /// Records one stock movement.
    async fn record_movement(&self, request: &MovementRequest) -> ApiResult<()>;

    /// Registers a product, returning the id the server assigned (if any).
    async fn create_product(&self, product: &NewProduct) -> ApiResult<Option<i64>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `reqwest`-backed client.
#[derive(Debug, Clone)]
pub struct HttpInventoryApi {
    client: Client,
    base_url: String,
}

impl HttpInventoryApi {
    /// Creates a client for the configured base URL.
    pub fn new(settings: &ApiSettings) -> ApiResult<Self> {
        Url::parse(&settings.base_url)?;

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpInventoryApi {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Sends one request and returns the status and decoded JSON body of a
    /// 2xx reply.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<(StatusCode, Value)> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "Inventory API request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            let message = failure_message(&body);
            warn!(status = status.as_u16(), %message, "Inventory API rejected request");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok((status, body))
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        let (_, body) = self.send::<()>(Method::GET, "/produtos", None).await?;
        let products: Vec<Product> =
            serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(count = products.len(), "Catalog fetched");
        Ok(products)
    }

    async fn record_movement(&self, request: &MovementRequest) -> ApiResult<()> {
        let (status, body) = self
            .send(Method::POST, &request.path(), Some(request))
            .await?;
        ensure_success(status, &body)
    }

    async fn create_product(&self, product: &NewProduct) -> ApiResult<Option<i64>> {
        let (status, body) = self.send(Method::POST, "/produtos", Some(product)).await?;
        ensure_success(status, &body)?;
        Ok(body.get("id").and_then(Value::as_i64))
    }
}

// =============================================================================
// Body Helpers
// =============================================================================

/// Server message for a failure body: `message`, then `error`, then a
/// generic fallback.
pub fn failure_message(body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
        .to_string()
}

/// Turns a 2xx body with `success: false` into a rejection.
fn ensure_success(status: StatusCode, body: &Value) -> ApiResult<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = failure_message(body);
        warn!(status = status.as_u16(), %message, "Inventory API reported success: false");
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(())
}
