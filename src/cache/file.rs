//! File-Backed Layer Module
//!
//! Read-only layer over a warmed text buffer. Every lookup is a linear scan
//! from the top of the buffer, so these layers belong behind a faster
//! in-memory layer.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::iter;
use std::path::Path;

use tracing::{debug, info, info_span, warn, Span};

use crate::cache::{
    BulkLoader, CacheLayer, Encoding, Entries, JsonLoader, LayerRef, Linkable, PropertiesLoader,
    Value, WriteThrough,
};
use crate::error::{CacheError, Result};

/// File layer in the `key=value` dialect.
pub type PropertiesLayer = FileLayer<PropertiesLoader>;

/// File layer in the JSON object dialect.
pub type JsonLayer = FileLayer<JsonLoader>;

// == File Layer ==
/// Layer backed by a decoded document, scanned through a [`BulkLoader`].
///
/// `put`, `put_all`, `invalidate` and `clear` are no-ops. `remove` is only
/// forwarded downstream. Lookups before `warm` fail with
/// [`CacheError::Initialization`].
#[derive(Debug)]
pub struct FileLayer<L> {
    name: String,
    loader: L,
    /// Decoded document, set by `warm`
    buffer: Option<String>,
    write_through: WriteThrough,
    span: Span,
}

impl<L: BulkLoader + Default> FileLayer<L> {
    /// Creates an unwarmed, unlinked layer using the dialect's default loader.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_loader(name, L::default())
    }
}

impl<L: BulkLoader> FileLayer<L> {
    pub fn with_loader(name: impl Into<String>, loader: L) -> Self {
        let name = name.into();
        let span = info_span!("cache_layer", layer = %name, kind = loader.dialect());
        Self {
            name,
            loader,
            buffer: None,
            write_through: WriteThrough::unlinked(),
            span,
        }
    }

    /// Replaces the span the layer logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_warmed(&self) -> bool {
        self.buffer.is_some()
    }

    // == Warm ==
    /// Reads `reader` to the end, decodes it with `encoding` and checks that
    /// the loader accepts the document.
    ///
    /// Re-warming replaces the previous buffer.
    pub fn warm_from_reader<R: Read>(&mut self, mut reader: R, encoding: Encoding) -> Result<()> {
        let _enter = self.span.enter();

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| self.warming_error(e))?;
        let text = encoding.decode(bytes).map_err(|e| self.warming_error(e))?;
        let count = self
            .loader
            .load(&text)
            .map_err(|e| self.warming_error(e))?
            .count();

        info!("Warmed {} layer with {} entries", self.loader.dialect(), count);
        self.buffer = Some(text);
        Ok(())
    }

    /// Opens `path` and warms from it.
    pub fn warm_from_path(&mut self, path: impl AsRef<Path>, encoding: Encoding) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            self.warming_error(io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        self.warm_from_reader(BufReader::new(file), encoding)
    }

    fn warming_error(&self, source: io::Error) -> CacheError {
        CacheError::Warming {
            layer: self.name.clone(),
            source,
        }
    }

    // == Scan ==
    /// Fresh pass over the buffer. Decode failures degrade to an empty pass.
    fn decode<'a>(&self, text: &'a str) -> Entries<'a> {
        match self.loader.load(text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to decode {} layer: {}", self.loader.dialect(), e);
                Box::new(iter::empty())
            }
        }
    }

    fn buffer(&self) -> Result<&str> {
        self.buffer
            .as_deref()
            .ok_or_else(|| CacheError::not_warmed(&self.name))
    }

    /// First entry for `key` in document order.
    fn scan(&self, key: &str) -> Result<Option<Value>> {
        let text = self.buffer()?;
        Ok(self
            .decode(text)
            .find(|entry| entry.key == key)
            .map(|entry| entry.value))
    }
}

impl<L: BulkLoader + 'static> Linkable for FileLayer<L> {
    fn with_write_through(mut self, next: LayerRef) -> Self {
        self.write_through = WriteThrough::to(next);
        self
    }
}

impl<L: BulkLoader> CacheLayer for FileLayer<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_through(&self) -> Option<LayerRef> {
        self.write_through.get()
    }

    // == Lookup ==
    fn lookup(&mut self, key: &str) -> Result<Option<Value>> {
        let _enter = self.span.enter();

        if let Some(value) = self.scan(key)? {
            return Ok(Some(value));
        }

        let next = self.write_through.require(&self.name)?;
        debug!("'{}' not in file, delegating downstream", key);
        next.borrow_mut().lookup(key)
    }

    fn has_value(&self, key: &str) -> bool {
        matches!(self.scan(key), Ok(Some(_)))
    }

    fn put(&mut self, key: &str, _value: Value) -> Option<Value> {
        debug!(parent: &self.span, "Ignoring put of '{}' on read-only layer", key);
        None
    }

    fn put_all(&mut self, entries: HashMap<String, Value>) {
        debug!(parent: &self.span, "Ignoring put_all of {} entries on read-only layer", entries.len());
    }

    fn invalidate(&mut self, _key: &str) -> Option<Value> {
        None
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        let next = self.write_through.require(&self.name)?;
        next.borrow_mut().remove(key)?;
        Ok(None)
    }

    fn clear(&mut self) {}

    // == Flush ==
    /// Pushes the document's entries downstream. The first occurrence of a
    /// key wins, matching what a lookup would return.
    fn flush(&mut self) -> Result<()> {
        let _enter = self.span.enter();
        let next = self.write_through.require(&self.name)?;
        let text = self.buffer()?;

        let mut exported = HashMap::new();
        for entry in self.decode(text) {
            exported.entry(entry.key).or_insert(entry.value);
        }
        info!("Flushing {} entries downstream", exported.len());
        next.borrow_mut().put_all(exported);
        Ok(())
    }

    fn warm(&mut self, source: &mut dyn Read, encoding: Encoding) -> Result<()> {
        self.warm_from_reader(source, encoding)
    }

    fn entries(&self) -> Entries<'_> {
        match &self.buffer {
            Some(text) => self.decode(text),
            None => {
                warn!(parent: &self.span, "Iterating layer '{}' before warm", self.name);
                Box::new(iter::empty())
            }
        }
    }
}
