//! Sink Layer Module
//!
//! Terminal layer that stores nothing. Every chain ends in one.

use std::collections::HashMap;

use crate::cache::{CacheLayer, Entries, LayerRef, Value};
use crate::error::Result;

// == Sink Layer ==
/// Accepts every operation as a no-op; lookups always miss.
#[derive(Debug, Clone)]
pub struct SinkLayer {
    name: String,
}

impl SinkLayer {
    pub fn new() -> Self {
        Self::named("sink")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SinkLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheLayer for SinkLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_through(&self) -> Option<LayerRef> {
        None
    }

    fn lookup(&mut self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn has_value(&self, _key: &str) -> bool {
        false
    }

    fn put(&mut self, _key: &str, _value: Value) -> Option<Value> {
        None
    }

    fn put_all(&mut self, _entries: HashMap<String, Value>) {}

    fn invalidate(&mut self, _key: &str) -> Option<Value> {
        None
    }

    fn remove(&mut self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn clear(&mut self) {}

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn entries(&self) -> Entries<'_> {
        Box::new(std::iter::empty())
    }
}
