//! Whole-document table access with defensive decoding.
//!
//! Every logical table is one JSON document stored under
//! `"<namespace>:<table>"`. Reads never fail: a missing, unreadable or
//! malformed document is equivalent to the table's default. Writes never
//! fail either: a rejected write is logged and the document is kept in a
//! session overlay, so the running process keeps seeing its own changes
//! even though they will not survive a restart.

use std::collections::HashMap;

use leafline_shared::constants::STORAGE_NAMESPACE;
use serde::Serialize;
use serde_json::Value;

use crate::backend::KvBackend;

/// The logical tables persisted by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKey {
    User,
    Counts,
    UserActions,
    Comments,
    Favorites,
    Activity,
}

impl TableKey {
    pub const ALL: [TableKey; 6] = [
        Self::User,
        Self::Counts,
        Self::UserActions,
        Self::Comments,
        Self::Favorites,
        Self::Activity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Counts => "counts",
            Self::UserActions => "user-actions",
            Self::Comments => "comments",
            Self::Favorites => "favorites",
            Self::Activity => "activity",
        }
    }

    /// Document returned when the table is absent or unreadable.
    pub fn default_value(&self) -> Value {
        match self {
            Self::User => Value::Null,
            Self::Activity => Value::Array(Vec::new()),
            _ => Value::Object(serde_json::Map::new()),
        }
    }

    /// Top-level shape check. Anything deeper is the ledger schema's job.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::User => value.is_object() || value.is_null(),
            Self::Activity => value.is_array(),
            _ => value.is_object(),
        }
    }
}

impl std::fmt::Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed table layer over a [`KvBackend`].
pub struct TableStore<B> {
    backend: B,
    namespace: String,
    overlay: HashMap<TableKey, Value>,
}

impl<B: KvBackend> TableStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_namespace(backend, STORAGE_NAMESPACE)
    }

    pub fn with_namespace(backend: B, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            overlay: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Physical backend key of `table`.
    pub fn storage_key(&self, table: TableKey) -> String {
        format!("{}:{}", self.namespace, table.name())
    }

    /// Read and decode `table`, falling back to its default on any failure.
    pub fn read_table(&self, table: TableKey) -> Value {
        if let Some(pending) = self.overlay.get(&table) {
            return pending.clone();
        }

        let key = self.storage_key(table);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return table.default_value(),
            Err(e) => {
                tracing::warn!(
                    table = %table,
                    backend = self.backend.backend_tag(),
                    error = %e,
                    "table read failed, using default"
                );
                return table.default_value();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if table.accepts(&value) => value,
            Ok(_) => {
                tracing::warn!(table = %table, "persisted table has the wrong shape, using default");
                table.default_value()
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "persisted table is not valid JSON, using default");
                table.default_value()
            }
        }
    }

    /// Encode and write `table`. Failures are logged and the document is
    /// kept in the session overlay.
    pub fn write_table<T: Serialize + ?Sized>(&mut self, table: TableKey, value: &T) {
        let document = match serde_json::to_value(value) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "failed to encode table, write dropped");
                return;
            }
        };

        let key = self.storage_key(table);
        let written = serde_json::to_string(&document)
            .map_err(|e| e.to_string())
            .and_then(|raw| self.backend.set(&key, &raw).map_err(|e| e.to_string()));

        match written {
            Ok(()) => {
                self.overlay.remove(&table);
            }
            Err(e) => {
                tracing::warn!(
                    table = %table,
                    backend = self.backend.backend_tag(),
                    error = %e,
                    "table write failed, keeping change for this session only"
                );
                self.overlay.insert(table, document);
            }
        }
    }

    /// Tables whose latest version only lives in the session overlay.
    pub fn unpersisted_tables(&self) -> Vec<TableKey> {
        TableKey::ALL
            .into_iter()
            .filter(|table| self.overlay.contains_key(table))
            .collect()
    }

    /// Remove every table of this namespace.
    pub fn clear(&mut self) {
        self.overlay.clear();
        for table in TableKey::ALL {
            let key = self.storage_key(table);
            if let Err(e) = self.backend.remove(&key) {
                tracing::warn!(table = %table, error = %e, "failed to clear table");
            }
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn missing_tables_read_as_defaults() {
        let store = TableStore::new(MemoryBackend::new());
        assert_eq!(store.read_table(TableKey::User), Value::Null);
        assert_eq!(store.read_table(TableKey::Counts), json!({}));
        assert_eq!(store.read_table(TableKey::Activity), json!([]));
    }

    #[test]
    fn keys_are_namespaced_and_versioned() {
        let store = TableStore::new(MemoryBackend::new());
        assert_eq!(
            store.storage_key(TableKey::UserActions),
            "leafline-state-v1:user-actions"
        );

        let custom = TableStore::with_namespace(MemoryBackend::new(), "test-v2");
        assert_eq!(custom.storage_key(TableKey::Counts), "test-v2:counts");
    }

    #[test]
    fn write_then_read() {
        let mut store = TableStore::new(MemoryBackend::new());
        store.write_table(TableKey::Favorites, &json!({"user-1": ["a", "b"]}));
        assert_eq!(
            store.read_table(TableKey::Favorites),
            json!({"user-1": ["a", "b"]})
        );
        assert!(store.unpersisted_tables().is_empty());
    }

    #[test]
    fn corrupt_json_reads_as_default() {
        let mut backend = MemoryBackend::new();
        backend.set("leafline-state-v1:comments", "{not json").unwrap();
        let store = TableStore::new(backend);
        assert_eq!(store.read_table(TableKey::Comments), json!({}));
    }

    #[test]
    fn wrong_shape_reads_as_default() {
        let mut backend = MemoryBackend::new();
        backend.set("leafline-state-v1:activity", r#"{"a":1}"#).unwrap();
        backend.set("leafline-state-v1:counts", "[1,2,3]").unwrap();
        let store = TableStore::new(backend);
        assert_eq!(store.read_table(TableKey::Activity), json!([]));
        assert_eq!(store.read_table(TableKey::Counts), json!({}));
    }

    #[test]
    fn unavailable_backend_never_raises_and_keeps_session_state() {
        let mut store = TableStore::new(MemoryBackend::unavailable());
        assert_eq!(store.read_table(TableKey::Counts), json!({}));

        store.write_table(TableKey::Counts, &json!({"a": {"likes": 1, "saves": 0}}));
        assert_eq!(
            store.read_table(TableKey::Counts),
            json!({"a": {"likes": 1, "saves": 0}})
        );
        assert_eq!(store.unpersisted_tables(), vec![TableKey::Counts]);
    }

    #[test]
    fn overlay_is_dropped_once_a_write_succeeds() {
        let mut store = TableStore::new(MemoryBackend::unavailable());
        store.write_table(TableKey::Favorites, &json!({"u": ["a"]}));

        store.backend_mut().set_available(true);
        store.write_table(TableKey::Favorites, &json!({"u": ["b"]}));

        assert!(store.unpersisted_tables().is_empty());
        assert_eq!(
            store.backend().get("leafline-state-v1:favorites").unwrap().as_deref(),
            Some(r#"{"u":["b"]}"#)
        );
    }

    #[test]
    fn quota_exceeded_write_is_swallowed() {
        let mut store = TableStore::new(MemoryBackend::with_quota(40));
        store.write_table(TableKey::Activity, &json!(["x".repeat(100)]));

        assert!(store.backend().is_empty());
        assert_eq!(store.read_table(TableKey::Activity), json!(["x".repeat(100)]));
    }

    #[test]
    fn clear_removes_every_table() {
        let mut store = TableStore::new(MemoryBackend::new());
        store.write_table(TableKey::Counts, &json!({}));
        store.write_table(TableKey::Activity, &json!([]));
        store.backend_mut().set("other-app:key", "1").unwrap();

        store.clear();
        assert_eq!(store.backend().keys().unwrap(), vec!["other-app:key".to_string()]);
    }
}
