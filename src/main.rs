//! Config Chain - command-line lookup tool
//!
//! Resolves keys through a `[memory -> file -> sink]` chain built from the
//! environment and prints them as `key=value` lines.

use std::env;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config_chain::cache::{
    layer_names, BulkLoader, ChainBuilder, Encoding, FileLayer, InMemoryLayer, JsonLoader,
    LayerRef, PropertiesLoader,
};
use config_chain::{Config, Format};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Warm the file-backed layer and build the chain
/// 4. Print each requested key, or the whole file when no key is given
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "config_chain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: file={:?}, format={:?}, encoding={:?}",
        config.file, config.format, config.encoding
    );

    let (head, file) = build_chain(&config)?;
    info!("Chain: {}", layer_names(&head).join(" -> "));

    let keys: Vec<String> = env::args().skip(1).collect();
    if keys.is_empty() {
        match file {
            Some(file) => {
                for entry in file.borrow().entries() {
                    println!("{}={}", entry.key, entry.value);
                }
            }
            None => warn!("No CONFIG_CHAIN_FILE set and no keys requested"),
        }
        return Ok(());
    }

    for key in keys {
        let value = head
            .borrow_mut()
            .lookup(&key)
            .with_context(|| format!("looking up '{}'", key))?;
        match value {
            Some(value) => println!("{}={}", key, value),
            None => warn!("'{}' is not set", key),
        }
    }
    Ok(())
}

/// Builds the chain bottom-up, returning the head and the file layer if any.
fn build_chain(config: &Config) -> anyhow::Result<(LayerRef, Option<LayerRef>)> {
    let mut builder = ChainBuilder::new();
    let mut file: Option<LayerRef> = None;

    if let Some(path) = &config.file {
        let layer = match config.format {
            Format::Properties => {
                let (next, layer) =
                    builder.stack_shared(warmed::<PropertiesLoader>(path, config.encoding)?);
                builder = next;
                layer as LayerRef
            }
            Format::Json => {
                let (next, layer) =
                    builder.stack_shared(warmed::<JsonLoader>(path, config.encoding)?);
                builder = next;
                layer as LayerRef
            }
        };
        file = Some(layer);
    }

    let head = builder.stack(InMemoryLayer::new("memory")).build();
    Ok((head, file))
}

fn warmed<L: BulkLoader + Default + 'static>(
    path: &Path,
    encoding: Encoding,
) -> anyhow::Result<FileLayer<L>> {
    let mut layer = FileLayer::<L>::new("file");
    layer
        .warm_from_path(path, encoding)
        .with_context(|| format!("warming {}", path.display()))?;
    Ok(layer)
}
