//! In-memory `InventoryApi` used by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use estoque_core::{MovementRequest, MovementType, NewProduct, Product};
use tokio::sync::Notify;

use crate::api::InventoryApi;
use crate::error::{ApiError, ApiResult};

/// Records every write and applies movements to its own catalog.
#[derive(Default)]
pub struct RecordingApi {
    products: Mutex<Vec<Product>>,
    movements: Mutex<Vec<MovementRequest>>,
    created: Mutex<Vec<NewProduct>>,
    list_calls: AtomicUsize,
    write_failure: Mutex<Option<ApiError>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingApi {
    pub fn with_products(products: Vec<Product>) -> Self {
        RecordingApi {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    /// Writes wait on `gate` before completing.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every write fails with `err`.
    pub fn failing_writes(self, err: ApiError) -> Self {
        *self.write_failure.lock().unwrap() = Some(err);
        self
    }

    pub fn set_stock(&self, product_id: i64, stock: i64) {
        let mut products = self.products.lock().unwrap();
        if let Some(p) = products.iter_mut().find(|p| p.id == product_id) {
            p.stock = Some(stock);
        }
    }

    pub fn movements(&self) -> Vec<MovementRequest> {
        self.movements.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewProduct> {
        self.created.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn before_write(&self) -> ApiResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.write_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InventoryApi for RecordingApi {
    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.lock().unwrap().clone())
    }

    async fn record_movement(&self, request: &MovementRequest) -> ApiResult<()> {
        self.before_write().await?;

        let mut products = self.products.lock().unwrap();
        if let Some(p) = products.iter_mut().find(|p| p.id == request.product_id) {
            let delta = match request.movement_type {
                MovementType::Entry => request.quantity,
                MovementType::Exit => -request.quantity,
            };
            p.stock = Some(p.available() + delta);
        }
        self.movements.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn create_product(&self, product: &NewProduct) -> ApiResult<Option<i64>> {
        self.before_write().await?;

        let mut products = self.products.lock().unwrap();
        let id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        products.push(Product {
            id,
            name: product.name.clone(),
            barcode: Some(product.barcode.clone()).filter(|b| !b.is_empty()),
            stock: Some(product.initial_stock),
        });
        self.created.lock().unwrap().push(product.clone());
        Ok(Some(id))
    }
}

pub fn product(id: i64, name: &str, barcode: Option<&str>, stock: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        barcode: barcode.map(str::to_string),
        stock: Some(stock),
    }
}

/// The catalog most tests run against.
pub fn catalog() -> Vec<Product> {
    vec![
        product(7, "Parafuso M8", None, 10),
        product(12, "Arruela", Some("ABC123"), 3),
        product(20, "Luva de Nitrilo", Some("789"), 50),
    ]
}
