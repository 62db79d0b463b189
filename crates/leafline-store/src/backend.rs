//! Synchronous key-value backends underneath the table layer.
//!
//! [`KvBackend`] is the seam between the typed table store and the host's
//! durable storage. The SQLite [`Database`](crate::Database) is the durable
//! implementation; [`MemoryBackend`] keeps everything in process and can be
//! told to fail, which is how the store's failure handling is exercised.

use std::collections::BTreeMap;

use crate::error::{Result, StoreError};

/// Minimal string-keyed, string-valued store.
pub trait KvBackend {
    /// Short tag used in log fields.
    fn backend_tag(&self) -> &'static str;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<B: KvBackend + ?Sized> KvBackend for Box<B> {
    fn backend_tag(&self) -> &'static str {
        (**self).backend_tag()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// In-process backend with an optional byte budget.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: None,
            available: true,
        }
    }

    /// Reject any write that would push the total of key and value bytes
    /// above `limit`.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::new()
        }
    }

    /// A backend on which every call fails, like a disabled browser store.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory backend disabled".to_string()))
        }
    }
}

impl KvBackend for MemoryBackend {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.check_available()?;
        Ok(self.entries.keys().cloned().collect())
    }
}
