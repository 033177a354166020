use anyhow::Context;
use respondr_core::InMemoryCatalog;
use std::path::Path;
use tracing::info;

/// Sample Miami directory compiled into the binary.
const BUNDLED_SERVICES: &str = include_str!("../data/services.json");

/// Loads the service directory from `path`, or the bundled sample when no path is set.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<InMemoryCatalog> {
    let catalog = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog file {}", path.display()))?;
            InMemoryCatalog::from_json(&json)
                .with_context(|| format!("invalid catalog file {}", path.display()))?
        }
        None => InMemoryCatalog::from_json(BUNDLED_SERVICES)
            .context("bundled service directory is invalid")?,
    };

    info!(
        source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "bundled".to_string()),
        services = catalog.len(),
        "service directory loaded"
    );
    Ok(catalog)
}
