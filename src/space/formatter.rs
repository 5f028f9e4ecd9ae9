//! Value Formatter Module
//!
//! Coerces cache-resident values into requested types and back.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::Value;
use crate::error::Result;

// == Value Formatter ==
/// Reads raw values as typed values and formats typed values for storage.
pub trait ValueFormatter {
    /// Interprets `raw` as a `T`. A failed coercion is `None`, never an error.
    fn read<T: DeserializeOwned>(&self, raw: &Value) -> Option<T>;

    /// Formats `value` for storage in a layer.
    fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value>;
}

// == JSON Formatter ==
/// Formatter backed by serde_json.
///
/// String values are also tried as JSON text, so the raw string `"5"` read
/// from a properties file can be read as an integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ValueFormatter for JsonFormatter {
    fn read<T: DeserializeOwned>(&self, raw: &Value) -> Option<T> {
        let typed = serde_json::to_value(raw)
            .ok()
            .and_then(|json| serde_json::from_value(json).ok());
        if typed.is_some() {
            return typed;
        }
        match raw {
            Value::String(text) => serde_json::from_str(text).ok(),
            _ => None,
        }
    }

    fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        Ok(Value::from(serde_json::to_value(value)?))
    }
}
