//! Cache Module
//!
//! A chain of cache layers, each able to answer a lookup locally or delegate it
//! to its write-through layer, and able to flush local values downstream.
//!
//! Chains are built bottom-up: a [`SinkLayer`] first, then each layer is linked
//! to the one below it before it is shared. A shared layer can no longer be
//! re-linked, so a chain cannot contain a cycle.
//!
//! Layers are handed around as [`LayerRef`] (`Rc<RefCell<..>>`). A chain is not
//! thread-safe and is not `Send`; confine it to one thread, or guard the whole
//! chain with a single lock if several threads need it.

mod chain;
mod entry;
mod file;
mod loader;
mod memory;
mod sink;
mod stats;


use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::rc::Rc;

use crate::error::{CacheError, Result};

// Re-export public types
pub use chain::{layer_names, ChainBuilder};
pub use entry::{Entry, Value};
pub use file::{FileLayer, JsonLayer, PropertiesLayer};
pub use loader::{BulkLoader, Encoding, JsonLoader, PropertiesLoader};
pub use memory::{InMemoryLayer, RemovableIter};
pub use sink::SinkLayer;
pub use stats::LayerStats;

/// Lazy sequence of the entries resident in one layer.
pub type Entries<'a> = Box<dyn Iterator<Item = Entry> + 'a>;

/// Shared, non-owning handle to a layer in a chain.
pub type LayerRef = Rc<RefCell<dyn CacheLayer>>;

/// Wraps a layer so it can be linked into a chain.
///
/// The concrete handle coerces into a [`LayerRef`] while the caller keeps
/// typed access to the layer.
pub fn shared<L: CacheLayer + 'static>(layer: L) -> Rc<RefCell<L>> {
    Rc::new(RefCell::new(layer))
}

// == Cache Layer ==
/// Capability set shared by every layer variant.
pub trait CacheLayer {
    /// Label used in logs and errors.
    fn name(&self) -> &str;

    /// The next layer of the chain, if linked.
    fn write_through(&self) -> Option<LayerRef>;

    /// Resolves `key` through the chain.
    ///
    /// Returns the local value when present, otherwise the downstream result.
    /// Fails with [`CacheError::Initialization`] when the lookup has to go
    /// downstream and there is no write-through layer.
    fn lookup(&mut self, key: &str) -> Result<Option<Value>>;

    /// Whether `key` is resident in this layer. Never consults downstream.
    fn has_value(&self, key: &str) -> bool;

    /// Stores locally, returning the previous local value.
    fn put(&mut self, key: &str, value: Value) -> Option<Value>;

    /// Bulk `put`.
    fn put_all(&mut self, entries: HashMap<String, Value>);

    /// Deletes `key` from this layer only.
    fn invalidate(&mut self, key: &str) -> Option<Value>;

    /// Deletes `key` from this layer and every layer below it.
    fn remove(&mut self, key: &str) -> Result<Option<Value>>;

    /// Empties local storage without touching downstream.
    fn clear(&mut self);

    /// Pushes every local entry into the write-through layer. Local storage
    /// is left as is.
    fn flush(&mut self) -> Result<()>;

    /// Attaches the layer to a backing stream. No-op unless file-backed.
    fn warm(&mut self, _source: &mut dyn Read, _encoding: Encoding) -> Result<()> {
        Ok(())
    }

    /// Entries physically resident in this layer.
    fn entries(&self) -> Entries<'_>;

    fn get_boolean(&mut self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .lookup(key)?
            .and_then(|value| value.as_bool())
            .unwrap_or(default))
    }

    fn get_double(&mut self, key: &str, default: f64) -> Result<f64> {
        Ok(self
            .lookup(key)?
            .and_then(|value| value.as_double())
            .unwrap_or(default))
    }

    fn get_int(&mut self, key: &str, default: i64) -> Result<i64> {
        Ok(self
            .lookup(key)?
            .and_then(|value| value.as_int())
            .unwrap_or(default))
    }

    fn get_string(&mut self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .lookup(key)?
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string()))
    }
}

/// A layer that can be given its write-through target.
///
/// Linking consumes the layer, so it must happen before the layer is shared.
pub trait Linkable: CacheLayer + Sized + 'static {
    fn with_write_through(self, next: LayerRef) -> Self;
}

// == Write Through ==
/// The outgoing link every non-terminal layer embeds.
#[derive(Clone, Default)]
pub struct WriteThrough {
    next: Option<LayerRef>,
}

impl WriteThrough {
    pub fn unlinked() -> Self {
        Self { next: None }
    }

    pub fn to(next: LayerRef) -> Self {
        Self { next: Some(next) }
    }

    pub fn is_linked(&self) -> bool {
        self.next.is_some()
    }

    pub fn get(&self) -> Option<LayerRef> {
        self.next.clone()
    }

    /// The next layer, or the initialization error for `layer`.
    pub fn require(&self, layer: &str) -> Result<&LayerRef> {
        self.next.as_ref().ok_or_else(|| CacheError::unlinked(layer))
    }
}

impl fmt::Debug for WriteThrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.next {
            None => f.write_str("WriteThrough(unlinked)"),
            Some(next) => match next.try_borrow() {
                Ok(layer) => write!(f, "WriteThrough({})", layer.name()),
                Err(_) => f.write_str("WriteThrough(<in use>)"),
            },
        }
    }
}
