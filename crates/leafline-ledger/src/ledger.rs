//! The [`InteractionLedger`] handle and its commit step.
//!
//! Operations live in sibling modules as further `impl InteractionLedger`
//! blocks. Every operation reads the tables it needs fresh from the store,
//! runs them through the [`Schema`](crate::schema::Schema), and writes back
//! whole tables. Nothing is cached between calls, so two handles over the
//! same backend are last-writer-wins per table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use leafline_shared::BookId;
use leafline_store::{KvBackend, TableKey, TableStore, User};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{LedgerEvent, Outcome};
use crate::registry::BookRegistry;
use crate::schema::{ActionsTable, ActivityLog, CommentsTable, CountsTable, FavoritesTable, Schema};

pub struct InteractionLedger<B> {
    pub(crate) store: TableStore<B>,
    pub(crate) registry: Arc<dyn BookRegistry>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: LedgerConfig,
}

impl<B: KvBackend> InteractionLedger<B> {
    /// Open a ledger over `backend` using the system clock.
    pub fn open(backend: B, registry: Arc<dyn BookRegistry>, config: LedgerConfig) -> Self {
        Self::open_with_clock(backend, registry, Arc::new(SystemClock), config)
    }

    /// Open a ledger, normalizing every persisted table once and writing
    /// the cleaned tables back.
    pub fn open_with_clock(
        backend: B,
        registry: Arc<dyn BookRegistry>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        let store = TableStore::with_namespace(backend, config.namespace.clone());
        let mut ledger = Self {
            store,
            registry,
            clock,
            config,
        };
        ledger.normalize_on_load();
        ledger
    }

    pub(crate) fn normalize_on_load(&mut self) {
        let user = match Schema::user(&self.store.read_table(TableKey::User)) {
            Some(user) => user,
            None => {
                let user = User::default();
                self.store.write_table(TableKey::User, &user);
                user
            }
        };

        let schema = Schema::new(self.registry.as_ref(), &self.config, &user);
        let counts = schema.counts(&self.store.read_table(TableKey::Counts));
        let mut actions = schema.actions(&self.store.read_table(TableKey::UserActions));
        let favorites = schema.favorites(&self.store.read_table(TableKey::Favorites));
        let comments = schema.comments(&self.store.read_table(TableKey::Comments));
        let activity = schema.activity(&self.store.read_table(TableKey::Activity));
        Schema::reconcile_favorites(&mut actions.value, &favorites.value);

        let dropped = counts.dropped
            + actions.dropped
            + favorites.dropped
            + comments.dropped
            + activity.dropped;

        self.store.write_table(TableKey::Counts, &counts.value);
        self.store.write_table(TableKey::UserActions, &actions.value);
        self.store.write_table(TableKey::Favorites, &favorites.value);
        self.store.write_table(TableKey::Comments, &comments.value);
        self.store.write_table(TableKey::Activity, &activity.value);

        info!(
            namespace = %self.config.namespace,
            backend = self.store.backend().backend_tag(),
            user = %user.id,
            dropped,
            "ledger opened"
        );
    }

    /// The local user. Falls back to the default identity, without writing,
    /// if the persisted record has gone missing since open.
    pub fn current_user(&self) -> User {
        Schema::user(&self.store.read_table(TableKey::User)).unwrap_or_default()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn registry(&self) -> &dyn BookRegistry {
        self.registry.as_ref()
    }

    pub fn store(&self) -> &TableStore<B> {
        &self.store
    }

    pub fn into_store(self) -> TableStore<B> {
        self.store
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Run one mutation body and append the activity entry for its event.
    pub(crate) fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut Self, &User, DateTime<Utc>) -> Outcome<T>,
    ) -> T {
        let user = self.current_user();
        let now = self.clock.now();

        match op(self, &user, now) {
            Outcome::Unchanged(value) => value,
            Outcome::Changed(value, event) => {
                self.record(event, now);
                value
            }
        }
    }

    fn record(&mut self, event: LedgerEvent, now: DateTime<Utc>) {
        let entry = event.into_entry(now);
        debug!(kind = %entry.kind, book = ?entry.book_id.as_ref().map(BookId::as_str), "activity");

        let mut log = self.load_activity();
        log.insert(0, entry);
        log.truncate(self.config.max_activity);
        self.store.write_table(TableKey::Activity, &log);
    }

    pub(crate) fn ensure_known(&self, book_id: &BookId) -> Result<()> {
        if self.registry.is_known(book_id) {
            Ok(())
        } else {
            Err(LedgerError::UnknownBook(book_id.clone()))
        }
    }

    // ------------------------------------------------------------------
    // Typed table reads
    // ------------------------------------------------------------------

    pub(crate) fn load_counts(&self) -> CountsTable {
        let user = self.current_user();
        self.schema(&user)
            .counts(&self.store.read_table(TableKey::Counts))
            .value
    }

    pub(crate) fn load_actions(&self) -> ActionsTable {
        let user = self.current_user();
        self.schema(&user)
            .actions(&self.store.read_table(TableKey::UserActions))
            .value
    }

    pub(crate) fn load_favorites(&self) -> FavoritesTable {
        let user = self.current_user();
        self.schema(&user)
            .favorites(&self.store.read_table(TableKey::Favorites))
            .value
    }

    pub(crate) fn load_comments(&self) -> CommentsTable {
        let user = self.current_user();
        self.schema(&user)
            .comments(&self.store.read_table(TableKey::Comments))
            .value
    }

    pub(crate) fn load_activity(&self) -> ActivityLog {
        let user = self.current_user();
        self.schema(&user)
            .activity(&self.store.read_table(TableKey::Activity))
            .value
    }

    pub(crate) fn schema<'a>(&'a self, user: &'a User) -> Schema<'a> {
        Schema::new(self.registry.as_ref(), &self.config, user)
    }
}

#[cfg(test)]
mod tests {
    use leafline_store::MemoryBackend;
    use serde_json::json;

    use super::*;
    use crate::registry::StaticRegistry;

    fn registry() -> Arc<dyn BookRegistry> {
        Arc::new(StaticRegistry::from_ids(["atlas-of-echoes", "luminary-threads"]))
    }

    #[test]
    fn test_open_fabricates_user_once() {
        let ledger = InteractionLedger::open(MemoryBackend::new(), registry(), LedgerConfig::default());
        let user = ledger.current_user();
        assert_eq!(user, User::default());

        let backend = ledger.into_store().into_backend();
        assert_eq!(
            backend.get("leafline-state-v1:user").unwrap().as_deref(),
            Some(r#"{"id":"user-1","name":"You"}"#)
        );
    }

    #[test]
    fn test_open_keeps_existing_user() {
        let mut backend = MemoryBackend::new();
        backend
            .set("leafline-state-v1:user", r#"{"id":"user-42","name":"Ada"}"#)
            .unwrap();

        let ledger = InteractionLedger::open(backend, registry(), LedgerConfig::default());
        assert_eq!(ledger.current_user().id.as_str(), "user-42");
        assert_eq!(ledger.current_user().name, "Ada");
    }

    #[test]
    fn test_open_writes_normalized_tables_back() {
        let mut backend = MemoryBackend::new();
        backend
            .set(
                "leafline-state-v1:favorites",
                r#"{"user-1":["ghost-1","atlas-of-echoes","atlas-of-echoes"]}"#,
            )
            .unwrap();

        let ledger = InteractionLedger::open(backend, registry(), LedgerConfig::default());
        let store = ledger.into_store();
        assert_eq!(
            store.read_table(TableKey::Favorites),
            json!({"user-1": ["atlas-of-echoes"]})
        );
        assert_eq!(
            store.read_table(TableKey::UserActions),
            json!({"user-1": {"atlas-of-echoes": {"liked": false, "saved": false, "favorited": true}}})
        );
    }

    #[test]
    fn test_custom_namespace() {
        let config = LedgerConfig {
            namespace: "sandbox-v1".to_string(),
            ..LedgerConfig::default()
        };
        let ledger = InteractionLedger::open(MemoryBackend::new(), registry(), config);
        let keys = ledger.store().backend().keys().unwrap();
        assert!(keys.iter().all(|key| key.starts_with("sandbox-v1:")));
        assert!(!keys.is_empty());
    }

    #[test]
    fn test_unknown_book_is_rejected() {
        let ledger = InteractionLedger::open(MemoryBackend::new(), registry(), LedgerConfig::default());
        assert!(matches!(
            ledger.ensure_known(&BookId::from("ghost-1")),
            Err(LedgerError::UnknownBook(_))
        ));
        assert!(ledger.ensure_known(&BookId::from("atlas-of-echoes")).is_ok());
    }
}
