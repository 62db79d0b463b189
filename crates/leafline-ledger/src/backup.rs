//! Bulk export, import and reset of the current user's data.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use leafline_shared::BookId;
use leafline_store::{KvBackend, TableKey, User, UserAction};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::ledger::InteractionLedger;
use crate::schema::{CommentsTable, Schema};

/// Snapshot of everything the current user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataExport {
    pub user: User,
    pub actions: BTreeMap<BookId, UserAction>,
    pub favorites: Vec<BookId>,
    pub comments: CommentsTable,
    pub timestamp: DateTime<Utc>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Books with imported flags, or `None` if the payload had no actions.
    pub actions: Option<usize>,
    /// Size of the imported favorites list, or `None` if absent.
    pub favorites: Option<usize>,
    pub comments_added: usize,
    /// Records discarded by normalization.
    pub dropped: usize,
}

impl<B: KvBackend> InteractionLedger<B> {
    pub fn export_user_data(&self) -> UserDataExport {
        let user = self.current_user();
        UserDataExport {
            actions: self.load_actions().remove(&user.id).unwrap_or_default(),
            favorites: self.get_favorites(),
            comments: self.load_comments(),
            timestamp: self.clock.now(),
            user,
        }
    }

    /// Merge a payload produced by [`export_user_data`](Self::export_user_data).
    ///
    /// Comments are merged per book, keeping existing ones and adding those
    /// with unseen ids. Actions and favorites, when present, replace the
    /// current user's wholesale. A field of the wrong type rejects the whole
    /// payload before anything is written. Imports are not logged as activity.
    ///
    /// Imported `liked` / `saved` flags leave the aggregate counts alone, so
    /// a later toggle moves the count relative to its current value, which
    /// may take it below the catalog seed.
    pub fn import_user_data(&mut self, data: &Value) -> Result<ImportStats> {
        let payload = data
            .as_object()
            .ok_or_else(|| LedgerError::Format(format!("expected an object, got {}", kind_of(data))))?;

        let actions_in = field(payload, "actions", Value::is_object, "an object")?;
        let favorites_in = field(payload, "favorites", Value::is_array, "an array")?;
        let comments_in = field(payload, "comments", Value::is_object, "an object")?;

        let user = self.current_user();
        let schema = self.schema(&user);
        let mut stats = ImportStats::default();

        let imported_actions = actions_in.map(|raw| {
            let mut wrapped = Map::new();
            wrapped.insert(user.id.to_string(), raw.clone());
            let normalized = schema.actions(&Value::Object(wrapped));
            stats.dropped += normalized.dropped;
            normalized.value.into_values().next().unwrap_or_default()
        });
        let imported_favorites = favorites_in.and_then(Value::as_array).map(|list| {
            let normalized = schema.book_list(list);
            stats.dropped += normalized.dropped;
            normalized.value
        });
        let imported_comments = comments_in.map(|raw| {
            let normalized = schema.comments(raw);
            stats.dropped += normalized.dropped;
            normalized.value
        });

        if imported_actions.is_some() || imported_favorites.is_some() {
            let mut actions = self.load_actions();
            let mut favorites = self.load_favorites();

            if let Some(per_book) = imported_actions {
                stats.actions = Some(per_book.len());
                actions.insert(user.id.clone(), per_book);
            }
            if let Some(list) = imported_favorites {
                stats.favorites = Some(list.len());
                favorites.insert(user.id.clone(), list);
            }
            favorites.retain(|_, list| !list.is_empty());
            Schema::reconcile_favorites(&mut actions, &favorites);

            self.store.write_table(TableKey::UserActions, &actions);
            self.store.write_table(TableKey::Favorites, &favorites);
        }

        if let Some(incoming) = imported_comments {
            let mut comments = self.load_comments();
            for (book_id, list) in incoming {
                let existing = comments.entry(book_id).or_default();
                let mut seen: HashSet<_> = existing.iter().map(|c| c.id.clone()).collect();
                for comment in list {
                    if seen.insert(comment.id.clone()) {
                        existing.push(comment);
                        stats.comments_added += 1;
                    }
                }
                existing.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            self.store.write_table(TableKey::Comments, &comments);
        }

        info!(
            actions = ?stats.actions,
            favorites = ?stats.favorites,
            comments_added = stats.comments_added,
            dropped = stats.dropped,
            "user data imported"
        );
        Ok(stats)
    }

    /// Erase every table and start over with a fresh identity.
    pub fn reset(&mut self) {
        self.store.clear();
        self.normalize_on_load();
        info!(namespace = %self.config.namespace, "ledger reset");
    }
}

/// An optional payload field that must have the expected JSON type.
fn field<'v>(
    payload: &'v Map<String, Value>,
    name: &str,
    check: fn(&Value) -> bool,
    expected: &str,
) -> Result<Option<&'v Value>> {
    match payload.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) if check(value) => Ok(Some(value)),
        Some(value) => Err(LedgerError::Format(format!(
            "`{name}` must be {expected}, got {}",
            kind_of(value)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
