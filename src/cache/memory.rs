//! In-Memory Layer Module
//!
//! HashMap-backed layer with read-fill on miss and full local mutation.
//! Usually the head of a chain.

use std::collections::HashMap;
use std::vec;

use tracing::{debug, info, info_span, Span};

use crate::cache::{
    CacheLayer, Entries, Entry, LayerRef, LayerStats, Linkable, Value, WriteThrough,
};
use crate::error::Result;

// == In-Memory Layer ==
/// Associative cache layer.
#[derive(Debug)]
pub struct InMemoryLayer {
    /// Layer label
    name: String,
    /// Key-value storage
    entries: HashMap<String, Value>,
    /// Next layer of the chain
    write_through: WriteThrough,
    /// Activity counters
    stats: LayerStats,
    /// Span the layer logs under
    span: Span,
}

impl InMemoryLayer {
    // == Constructor ==
    /// Creates an empty, unlinked layer.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = info_span!("cache_layer", layer = %name, kind = "memory");
        Self {
            name,
            entries: HashMap::new(),
            write_through: WriteThrough::unlinked(),
            stats: LayerStats::new(),
            span,
        }
    }

    /// Replaces the span the layer logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // == Stats ==
    /// Returns current layer statistics.
    pub fn stats(&self) -> LayerStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Removable Iteration ==
    /// Iterates over the live entries; the iterator can delete the entry it
    /// last yielded.
    pub fn iter_removable(&mut self) -> RemovableIter<'_> {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        RemovableIter {
            entries: &mut self.entries,
            keys: keys.into_iter(),
            current: None,
        }
    }

    /// Local value without consulting downstream or touching stats.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Linkable for InMemoryLayer {
    fn with_write_through(mut self, next: LayerRef) -> Self {
        self.write_through = WriteThrough::to(next);
        self
    }
}

impl CacheLayer for InMemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_through(&self) -> Option<LayerRef> {
        self.write_through.get()
    }

    // == Lookup ==
    fn lookup(&mut self, key: &str) -> Result<Option<Value>> {
        let _enter = self.span.enter();

        if let Some(value) = self.entries.get(key) {
            self.stats.record_hit();
            return Ok(Some(value.clone()));
        }

        self.stats.record_miss();
        let next = self.write_through.require(&self.name)?;
        debug!("Miss on '{}', delegating downstream", key);
        let resolved = next.borrow_mut().lookup(key)?;

        // Read-fill
        if let Some(value) = &resolved {
            debug!("Caching '{}' resolved downstream", key);
            self.entries.insert(key.to_string(), value.clone());
            self.stats.record_fill();
        }
        Ok(resolved)
    }

    fn has_value(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn put(&mut self, key: &str, value: Value) -> Option<Value> {
        self.entries.insert(key.to_string(), value)
    }

    fn put_all(&mut self, entries: HashMap<String, Value>) {
        self.entries.extend(entries);
    }

    fn invalidate(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    // == Remove ==
    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        let _enter = self.span.enter();
        let next = self.write_through.require(&self.name)?;

        self.stats.record_removal();
        debug!("Removing '{}' from the rest of the chain", key);
        next.borrow_mut().remove(key)?;
        // Local state only changes once downstream has succeeded
        Ok(self.entries.remove(key))
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    // == Flush ==
    fn flush(&mut self) -> Result<()> {
        let _enter = self.span.enter();
        let next = self.write_through.require(&self.name)?;

        info!("Flushing {} entries downstream", self.entries.len());
        next.borrow_mut().put_all(self.entries.clone());
        self.stats.record_flush();
        Ok(())
    }

    fn entries(&self) -> Entries<'_> {
        Box::new(
            self.entries
                .iter()
                .map(|(key, value)| Entry::new(key.clone(), value.clone())),
        )
    }
}

// == Removable Iterator ==
/// Iterator over an in-memory layer that supports deleting the current entry.
///
/// Entries deleted through [`RemovableIter::delete_current`] are removed from
/// the layer itself.
pub struct RemovableIter<'a> {
    entries: &'a mut HashMap<String, Value>,
    keys: vec::IntoIter<String>,
    current: Option<String>,
}

impl RemovableIter<'_> {
    /// Deletes the entry most recently yielded by `next`.
    ///
    /// Returns `None` before the first `next`, after the iterator is
    /// exhausted, or when the current entry was already deleted.
    pub fn delete_current(&mut self) -> Option<Value> {
        let key = self.current.take()?;
        self.entries.remove(&key)
    }
}

impl Iterator for RemovableIter<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        for key in self.keys.by_ref() {
            if let Some(value) = self.entries.get(&key) {
                let entry = Entry::new(key.clone(), value.clone());
                self.current = Some(key);
                return Some(entry);
            }
        }
        self.current = None;
        None
    }
}
