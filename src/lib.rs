//! Config Chain - A typed configuration-value store
//!
//! Values are resolved through a chain of write-through cache layers: an
//! in-memory head, file-backed layers, and a terminal sink.

pub mod cache;
pub mod config;
pub mod error;
pub mod space;

pub use cache::{CacheLayer, ChainBuilder, LayerRef, Value};
pub use config::{Config, Format};
pub use error::{CacheError, Result};
pub use space::ConfigSpace;
