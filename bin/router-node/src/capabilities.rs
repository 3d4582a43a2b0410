//! Loading capability entries from disk

use anyhow::{Context, Result};
use router_api::CapabilityEntry;
use std::path::Path;
use tracing::info;

/// Read capability entries from a YAML or JSON file (chosen by extension)
pub fn load_entries(path: &Path) -> Result<Vec<CapabilityEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capabilities file {}", path.display()))?;
    let entries = parse_entries(&raw, path)?;
    info!("Loaded {} capabilities from {}", entries.len(), path.display());
    Ok(entries)
}

fn parse_entries(raw: &str, path: &Path) -> Result<Vec<CapabilityEntry>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let entries: Vec<CapabilityEntry> = if is_json {
        serde_json::from_str(raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    };
    Ok(entries)
}
