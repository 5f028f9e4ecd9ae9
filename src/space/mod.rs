//! Config Space Module
//!
//! Thin typed read/write facade over one cache layer.

mod formatter;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheLayer, ChainBuilder, InMemoryLayer, LayerRef, Value};
use crate::error::{CacheError, Result};

pub use formatter::{JsonFormatter, ValueFormatter};

// == Config Space ==
/// Typed access to the chain headed by `layer`.
pub struct ConfigSpace<F = JsonFormatter> {
    layer: LayerRef,
    formatter: F,
}

impl ConfigSpace<JsonFormatter> {
    pub fn new(layer: LayerRef) -> Self {
        Self::with_formatter(layer, JsonFormatter)
    }

    /// Config space over an in-memory copy of `map`, capped by a sink.
    pub fn from_map(map: HashMap<String, Value>) -> Self {
        let mut memory = InMemoryLayer::new("config-space");
        memory.put_all(map);
        Self::new(ChainBuilder::new().stack(memory).build())
    }
}

impl<F: ValueFormatter> ConfigSpace<F> {
    pub fn with_formatter(layer: LayerRef, formatter: F) -> Self {
        Self { layer, formatter }
    }

    /// Head of the underlying chain.
    pub fn layer(&self) -> LayerRef {
        self.layer.clone()
    }

    /// Typed value for `key`; `None` when absent or not coercible to `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.layer.borrow_mut().lookup(key)?;
        Ok(raw.and_then(|raw| self.formatter.read(&raw)))
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Like [`ConfigSpace::get`] but absence is an error.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)?
            .ok_or_else(|| CacheError::MissingRequired(key.to_string()))
    }

    /// Formats and stores `value` in the head layer, returning the previous value.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<Option<Value>> {
        let formatted = self.formatter.write(value)?;
        Ok(self.layer.borrow_mut().put(key, formatted))
    }

    /// Whether `key` resolves anywhere in the chain.
    pub fn has(&self, key: &str) -> Result<bool> {
        Ok(self.layer.borrow_mut().lookup(key)?.is_some())
    }

    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        self.layer.borrow_mut().remove(key)
    }

    pub fn flush(&self) -> Result<()> {
        self.layer.borrow_mut().flush()
    }
}
