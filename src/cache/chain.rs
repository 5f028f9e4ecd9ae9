//! Chain Module
//!
//! Bottom-up construction of layer chains.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::cache::{shared, CacheLayer, LayerRef, Linkable, SinkLayer};

// == Chain Builder ==
/// Builds a chain from the terminal sink upwards.
///
/// Each stacked layer is linked to the current head and becomes the new head,
/// so links always point at layers that already existed.
pub struct ChainBuilder {
    head: LayerRef,
    depth: usize,
}

impl ChainBuilder {
    /// Starts a chain capped by a default [`SinkLayer`].
    pub fn new() -> Self {
        Self::with_sink(SinkLayer::new())
    }

    pub fn with_sink(sink: SinkLayer) -> Self {
        Self {
            head: shared(sink),
            depth: 1,
        }
    }

    /// Links `layer` on top of the current head.
    pub fn stack<L: Linkable>(self, layer: L) -> Self {
        self.stack_shared(layer).0
    }

    /// Like [`ChainBuilder::stack`], also returning a typed handle to the layer.
    pub fn stack_shared<L: Linkable>(self, layer: L) -> (Self, Rc<RefCell<L>>) {
        let linked = shared(layer.with_write_through(self.head));
        debug!("Stacked layer '{}' at depth {}", linked.borrow().name(), self.depth);
        let head: LayerRef = linked.clone();
        let builder = Self {
            head,
            depth: self.depth + 1,
        };
        (builder, linked)
    }

    /// Number of layers, sink included.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Finishes the chain, returning its head.
    pub fn build(self) -> LayerRef {
        self.head
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the layers reachable from `head`, head first.
pub fn layer_names(head: &LayerRef) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(head.clone());
    while let Some(layer_ref) = current {
        let layer = layer_ref.borrow();
        names.push(layer.name().to_string());
        current = layer.write_through();
    }
    names
}
