//! # Product Resolver
//!
//! Maps a scanned [`TagPayload`] to a catalog [`Product`].
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  produto_id present?    ── yes ──► id == coerce(produto_id)             │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  codigo_barras present? ── yes ──► codigo_barras == barcode (exact)     │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  nome present?          ── yes ──► name contains nome (case-insensitive)│
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  ProductNotFound                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first key present decides the strategy. A miss on that key is final;
//! the resolver never falls through to the next key.
//!
//! ## Known Limitation
//! Name lookup returns the first product in catalog order whose name contains
//! the tag's `nome`. There is no ranking: "Parafuso" matches both
//! "Parafuso M6" and "Parafuso M8" and the earlier one wins. Barcodes are not
//! unique in the catalog either; the first exact match wins.

use crate::error::{CoreError, CoreResult};
use crate::tag::TagPayload;
use crate::types::Product;

/// Which tag key resolved (or failed to resolve) the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Id,
    Barcode,
    Name,
}

/// Resolves the product a tag refers to.
pub fn resolve<'a>(payload: &TagPayload, products: &'a [Product]) -> CoreResult<&'a Product> {
    if let Some(raw_id) = &payload.product_id {
        let found = raw_id
            .as_integer()
            .and_then(|id| products.iter().find(|p| p.id == id));
        return found.ok_or_else(|| CoreError::ProductNotFound(format!("id {}", raw_id)));
    }

    if let Some(barcode) = &payload.barcode {
        return products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(barcode.as_str()))
            .ok_or_else(|| CoreError::ProductNotFound(format!("barcode {}", barcode)));
    }

    if let Some(name) = &payload.name {
        let needle = name.to_lowercase();
        return products
            .iter()
            .find(|p| p.name.to_lowercase().contains(&needle))
            .ok_or_else(|| CoreError::ProductNotFound(format!("name {}", name)));
    }

    Err(CoreError::ProductNotFound(
        "tag has no product id, barcode or name".to_string(),
    ))
}

/// Returns the key `resolve` will use for this payload.
pub fn lookup_key(payload: &TagPayload) -> Option<LookupKey> {
    if payload.product_id.is_some() {
        Some(LookupKey::Id)
    } else if payload.barcode.is_some() {
        Some(LookupKey::Barcode)
    } else if payload.name.is_some() {
        Some(LookupKey::Name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_text;

    fn product(id: i64, name: &str, barcode: Option<&str>, stock: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            stock: Some(stock),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(3, "Parafuso M6", Some("ABC123"), 40),
            product(7, "Parafuso M8", None, 10),
            product(9, "Luva Nitrílica", Some("ABC123"), 3),
        ]
    }

    #[test]
    fn test_resolves_by_id() {
        let products = catalog();
        let payload = parse_text(r#"{"produto_id": 7}"#).unwrap();
        assert_eq!(resolve(&payload, &products).unwrap().id, 7);
    }

    #[test]
    fn test_resolves_by_id_string() {
        let products = catalog();
        let payload = parse_text(r#"{"produto_id": "9"}"#).unwrap();
        assert_eq!(resolve(&payload, &products).unwrap().id, 9);
    }

    #[test]
    fn test_id_miss_does_not_fall_through_to_barcode() {
        let products = catalog();
        let payload = parse_text(r#"{"produto_id": 42, "codigo_barras": "ABC123"}"#).unwrap();
        assert!(matches!(
            resolve(&payload, &products),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_non_numeric_id_is_not_found() {
        let products = catalog();
        let payload = parse_text(r#"{"produto_id": "sete"}"#).unwrap();
        assert!(resolve(&payload, &products).is_err());
    }

    #[test]
    fn test_duplicate_barcode_takes_first_in_catalog_order() {
        let products = catalog();
        let payload = parse_text(r#"{"codigo_barras": "ABC123"}"#).unwrap();
        assert_eq!(resolve(&payload, &products).unwrap().id, 3);
    }

    #[test]
    fn test_name_substring_is_case_insensitive() {
        let products = catalog();
        let payload = parse_text(r#"{"nome": "luva"}"#).unwrap();
        assert_eq!(resolve(&payload, &products).unwrap().id, 9);
    }

    #[test]
    fn test_ambiguous_name_takes_first_match() {
        // Both M6 and M8 match; no disambiguation is attempted.
        let products = catalog();
        let payload = parse_text(r#"{"nome": "PARAFUSO"}"#).unwrap();
        assert_eq!(resolve(&payload, &products).unwrap().id, 3);
    }

    #[test]
    fn test_payloads_without_keys_are_not_found() {
        let products = catalog();
        for text in [
            r#"{}"#,
            r#"{"tipo": "entrada", "quantidade": 5}"#,
            r#"{"produto_id": null, "codigo_barras": "", "nome": " "}"#,
        ] {
            let payload = parse_text(text).unwrap();
            assert_eq!(lookup_key(&payload), None);
            assert!(matches!(
                resolve(&payload, &products),
                Err(CoreError::ProductNotFound(_))
            ));
        }
    }

    #[test]
    fn test_empty_catalog() {
        let payload = parse_text(r#"{"produto_id": 7}"#).unwrap();
        assert!(resolve(&payload, &[]).is_err());
    }
}
