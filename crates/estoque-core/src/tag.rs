//! # Tag Payload Parser
//!
//! Turns a scanned NDEF message into a [`TagPayload`].
//!
//! ## Parse Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tag Parse Flow                                    │
//! │                                                                         │
//! │  NdefMessage { records: [url, text, mime] }                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  First record with type "text" ── none? ──► ParseError::NoTextRecord    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UTF-8 decode ─────────────────── bad? ───► ParseError::InvalidEncoding │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  JSON object? ─────────────────── no? ────► ParseError::MalformedPayload│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TagPayload (every field optional, nothing checked for presence)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tag Format
//! ```json
//! {"produto_id": 7, "tipo": "entrada", "quantidade": 5, "auto_movimentacao": true}
//! ```
//!
//! Integer-like fields keep their raw JSON value. Coercion happens where the
//! value is consumed, so the resolver and the validator each decide what a
//! bad value means for them.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// Record type carrying the JSON document.
pub const TEXT_RECORD_TYPE: &str = "text";

// =============================================================================
// NDEF Message
// =============================================================================

/// One record of a scanned NDEF message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    /// Record type tag ("text", "url", "mime", ...).
    pub record_type: String,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

impl NdefRecord {
    pub fn new(record_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        NdefRecord {
            record_type: record_type.into(),
            data: data.into(),
        }
    }

    /// Creates a text record holding `text` as UTF-8.
    pub fn text(text: &str) -> Self {
        NdefRecord::new(TEXT_RECORD_TYPE, text.as_bytes())
    }

    /// Returns true if this is a text record.
    pub fn is_text(&self) -> bool {
        self.record_type.eq_ignore_ascii_case(TEXT_RECORD_TYPE)
    }
}

/// A message delivered by one tag read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdefMessage {
    pub records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Self {
        NdefMessage { records }
    }

    /// Returns the first text record, if any.
    pub fn first_text_record(&self) -> Option<&NdefRecord> {
        self.records.iter().find(|r| r.is_text())
    }
}

// =============================================================================
// Raw Field
// =============================================================================

/// An untyped scalar read from the tag, coerced on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField(Value);

impl RawField {
    pub fn new(value: Value) -> Self {
        RawField(value)
    }

    /// Integer coercion.
    ///
    /// ## Rules
    /// - Numbers truncate toward zero (`5.9` → `5`)
    /// - Strings parse their leading integer after trimming (`" 12 un"` → `12`)
    /// - Values outside `i64` and everything else fail
    pub fn as_integer(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => leading_integer(s),
            _ => None,
        }
    }

    /// Decimal coercion, used for prices.
    pub fn as_decimal(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

impl std::fmt::Display for RawField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    format!("{}{}", sign, digits).parse::<i64>().ok()
}

// =============================================================================
// Tag Payload
// =============================================================================

/// Structured content of a scanned tag.
///
/// JSON `null` and blank strings are read as absent. Flags are set only by a
/// literal JSON `true`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPayload {
    /// `produto_id`
    pub product_id: Option<RawField>,
    /// `codigo_barras`
    pub barcode: Option<String>,
    /// `nome`
    pub name: Option<String>,
    /// `tipo`, unvalidated.
    pub movement_type: Option<String>,
    /// `quantidade`
    pub quantity: Option<RawField>,
    /// `descricao`
    pub description: Option<String>,
    /// `auto_movimentacao`
    pub auto_movement: bool,

    // Registration-only fields
    /// `barcode`, alias of `codigo_barras` on registration tags.
    pub barcode_alias: Option<String>,
    /// `categoria`
    pub category: Option<String>,
    /// `preco`
    pub price: Option<RawField>,
    /// `estoque_inicial`, alias of `quantidade` on registration tags.
    pub initial_stock: Option<RawField>,
    /// `estoque_minimo`
    pub min_stock: Option<RawField>,
    /// `estoque_maximo`
    pub max_stock: Option<RawField>,
    /// `auto_cadastro`
    pub auto_register: bool,
}

impl TagPayload {
    /// Builds a payload from a decoded JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        TagPayload {
            product_id: raw_field(object, "produto_id"),
            barcode: text_field(object, "codigo_barras"),
            name: text_field(object, "nome"),
            movement_type: text_field(object, "tipo"),
            quantity: raw_field(object, "quantidade"),
            description: text_field(object, "descricao"),
            auto_movement: flag(object, "auto_movimentacao"),
            barcode_alias: text_field(object, "barcode"),
            category: text_field(object, "categoria"),
            price: raw_field(object, "preco"),
            initial_stock: raw_field(object, "estoque_inicial"),
            min_stock: raw_field(object, "estoque_minimo"),
            max_stock: raw_field(object, "estoque_maximo"),
            auto_register: flag(object, "auto_cadastro"),
        }
    }

    /// Movement tags need `produto_id` or `codigo_barras`.
    pub fn has_movement_identifier(&self) -> bool {
        self.product_id.is_some() || self.barcode.is_some()
    }

    /// Barcode for registration, accepting either key.
    pub fn registration_barcode(&self) -> Option<&str> {
        self.barcode.as_deref().or(self.barcode_alias.as_deref())
    }

    /// Text used to prefill catalog and stock search boxes.
    pub fn search_term(&self) -> Option<&str> {
        self.barcode.as_deref().or(self.name.as_deref())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn raw_field(object: &Map<String, Value>, key: &str) -> Option<RawField> {
    object
        .get(key)
        .filter(|v| !is_blank(v))
        .map(|v| RawField::new(v.clone()))
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    matches!(object.get(key), Some(Value::Bool(true)))
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses the first text record of a scanned message.
pub fn parse_message(message: &NdefMessage) -> Result<TagPayload, ParseError> {
    let record = message
        .first_text_record()
        .ok_or(ParseError::NoTextRecord)?;
    let text = std::str::from_utf8(&record.data).map_err(|_| ParseError::InvalidEncoding)?;
    parse_text(text)
}

/// Parses tag text that must hold a JSON object.
pub fn parse_text(text: &str) -> Result<TagPayload, ParseError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

    match value {
        Value::Object(object) => Ok(TagPayload::from_object(&object)),
        other => Err(ParseError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
