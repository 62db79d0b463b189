//! Ledger configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the ledger works with zero
//! configuration.

use leafline_shared::constants::{
    ACTIVITY_PREVIEW_LEN, MAX_ACTIVITY, MAX_COMMENT_LEN, MIN_COMMENT_LEN, STORAGE_NAMESPACE,
};

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Versioned prefix of every persisted table key.
    /// Env: `LEAFLINE_NAMESPACE`
    /// Default: `leafline-state-v1`
    pub namespace: String,

    /// Activity log capacity; the oldest entries are evicted first.
    /// Env: `LEAFLINE_MAX_ACTIVITY`
    /// Default: `30`
    pub max_activity: usize,

    /// Minimum trimmed comment length, in characters.
    /// Env: `LEAFLINE_MIN_COMMENT_LEN`
    /// Default: `2`
    pub min_comment_len: usize,

    /// Maximum trimmed comment length, in characters.
    /// Env: `LEAFLINE_MAX_COMMENT_LEN`
    /// Default: `500`
    pub max_comment_len: usize,

    /// Length of the comment preview stored with `comment_added` entries.
    pub preview_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            namespace: STORAGE_NAMESPACE.to_string(),
            max_activity: MAX_ACTIVITY,
            min_comment_len: MIN_COMMENT_LEN,
            max_comment_len: MAX_COMMENT_LEN,
            preview_len: ACTIVITY_PREVIEW_LEN,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(namespace) = lookup("LEAFLINE_NAMESPACE") {
            if namespace.trim().is_empty() {
                tracing::warn!("Empty LEAFLINE_NAMESPACE, using default");
            } else {
                config.namespace = namespace.trim().to_string();
            }
        }

        if let Some(n) = parse_positive(&lookup, "LEAFLINE_MAX_ACTIVITY") {
            config.max_activity = n;
        }

        if let Some(n) = parse_positive(&lookup, "LEAFLINE_MIN_COMMENT_LEN") {
            config.min_comment_len = n;
        }

        if let Some(n) = parse_positive(&lookup, "LEAFLINE_MAX_COMMENT_LEN") {
            config.max_comment_len = n;
        }

        if config.min_comment_len > config.max_comment_len {
            tracing::warn!(
                min = config.min_comment_len,
                max = config.max_comment_len,
                "Comment length bounds are inverted, using defaults"
            );
            config.min_comment_len = MIN_COMMENT_LEN;
            config.max_comment_len = MAX_COMMENT_LEN;
        }

        config
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    let raw = lookup(name)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            None
        }
    }
}
