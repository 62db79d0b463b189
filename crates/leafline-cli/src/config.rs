//! CLI configuration loaded from environment variables.

use std::path::PathBuf;

use leafline_ledger::LedgerConfig;

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// SQLite file holding the ledger tables.
    /// Env: `LEAFLINE_DB_PATH`
    /// Default: `leafline.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// JSON catalog of `{ id, title, likes, saves }` rows.
    /// Env: `LEAFLINE_CATALOG`
    /// Default: the built-in catalog.
    pub catalog_path: Option<PathBuf>,

    /// Ledger settings (`LEAFLINE_NAMESPACE`, `LEAFLINE_MAX_ACTIVITY`, ...).
    pub ledger: LedgerConfig,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), LedgerConfig::from_env())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, ledger: LedgerConfig) -> Self {
        Self {
            db_path: non_empty_path(&lookup, "LEAFLINE_DB_PATH"),
            catalog_path: non_empty_path(&lookup, "LEAFLINE_CATALOG"),
            ledger,
        }
    }
}

fn non_empty_path(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<PathBuf> {
    let raw = lookup(name)?;
    if raw.trim().is_empty() {
        tracing::warn!(variable = name, "Empty path, using default");
        return None;
    }
    Some(PathBuf::from(raw.trim()))
}
