use std::path::Path;

use anyhow::Context;
use leafline_ledger::{BookSeed, StaticRegistry};

/// The catalog shipped with the web app.
pub fn builtin() -> StaticRegistry {
    StaticRegistry::from_seeds([
        BookSeed::new("atlas-of-echoes", 182, 0).titled("Atlas of Echoes"),
        BookSeed::new("luminary-threads", 264, 0).titled("Luminary Threads"),
        BookSeed::new("the-quiet-observatory", 198, 0).titled("The Quiet Observatory"),
        BookSeed::new("harvest-of-tides", 241, 0).titled("Harvest of Tides"),
        BookSeed::new("notes-from-aurora", 156, 0).titled("Notes from Aurora"),
        BookSeed::new("embers-of-ki", 205, 0).titled("Embers of Ki"),
    ])
}

/// Load the catalog at `path`, or the built-in one.
pub fn load(path: Option<&Path>) -> anyhow::Result<StaticRegistry> {
    let Some(path) = path else {
        return Ok(builtin());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let registry = StaticRegistry::from_json_str(&raw)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    tracing::info!(path = %path.display(), books = registry.len(), "catalog loaded");
    Ok(registry)
}
