//! Load-time normalization of persisted tables.
//!
//! Persisted JSON is untrusted: it may come from an older catalog, another
//! version of the app, or a hand-edited store. Each table has one function
//! here that turns whatever was stored into the typed in-memory shape,
//! dropping what cannot be repaired. Nothing in this module fails; the worst
//! case is losing the unrecoverable fragment.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use leafline_shared::constants::DEFAULT_USER_NAME;
use leafline_shared::{ActivityId, ActivityKind, BookId, CommentId, UserId};
use leafline_store::{ActivityEntry, Comment, EngagementCounts, User, UserAction};
use serde_json::{Map, Value};

use crate::config::LedgerConfig;
use crate::registry::BookRegistry;

pub type CountsTable = BTreeMap<BookId, EngagementCounts>;
pub type ActionsTable = BTreeMap<UserId, BTreeMap<BookId, UserAction>>;
pub type CommentsTable = BTreeMap<BookId, Vec<Comment>>;
pub type FavoritesTable = BTreeMap<UserId, Vec<BookId>>;
pub type ActivityLog = Vec<ActivityEntry>;

/// A normalized table plus how many records were discarded on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub dropped: usize,
}

impl<T> Normalized<T> {
    fn new(value: T, dropped: usize) -> Self {
        Self { value, dropped }
    }
}

pub struct Schema<'a> {
    registry: &'a dyn BookRegistry,
    config: &'a LedgerConfig,
    /// Attributed to legacy comments that carry no author.
    author: &'a User,
}

impl<'a> Schema<'a> {
    pub fn new(registry: &'a dyn BookRegistry, config: &'a LedgerConfig, author: &'a User) -> Self {
        Self {
            registry,
            config,
            author,
        }
    }

    /// A user record is usable only with a non-empty string id.
    pub fn user(value: &Value) -> Option<User> {
        let fields = value.as_object()?;
        let id = fields.get("id")?.as_str().and_then(user_key)?;
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_USER_NAME);

        Some(User {
            id,
            name: name.to_string(),
        })
    }

    pub fn counts(&self, value: &Value) -> Normalized<CountsTable> {
        let mut table = CountsTable::new();
        let mut dropped = 0;

        for (raw_id, entry) in as_object(value) {
            match (self.known(raw_id), entry.as_object()) {
                (Some(id), Some(fields)) => {
                    table.insert(
                        id,
                        EngagementCounts::new(counter(fields.get("likes")), counter(fields.get("saves"))),
                    );
                }
                _ => dropped += 1,
            }
        }

        Normalized::new(table, dropped)
    }

    pub fn actions(&self, value: &Value) -> Normalized<ActionsTable> {
        let mut table = ActionsTable::new();
        let mut dropped = 0;

        for (raw_user, books) in as_object(value) {
            let (Some(user_id), Some(books)) = (user_key(raw_user), books.as_object()) else {
                dropped += 1;
                continue;
            };

            let mut per_book = BTreeMap::new();
            for (raw_id, flags) in books {
                match (self.known(raw_id), flags.as_object()) {
                    (Some(id), Some(flags)) => {
                        per_book.insert(
                            id,
                            UserAction {
                                liked: flag(flags.get("liked")),
                                saved: flag(flags.get("saved")),
                                favorited: flag(flags.get("favorited")),
                            },
                        );
                    }
                    _ => dropped += 1,
                }
            }

            if !per_book.is_empty() {
                table.entry(user_id).or_default().extend(per_book);
            }
        }

        Normalized::new(table, dropped)
    }

    pub fn favorites(&self, value: &Value) -> Normalized<FavoritesTable> {
        let mut table = FavoritesTable::new();
        let mut dropped = 0;

        for (raw_user, list) in as_object(value) {
            let (Some(user_id), Some(list)) = (user_key(raw_user), list.as_array()) else {
                dropped += 1;
                continue;
            };

            let books = self.book_list(list);
            dropped += books.dropped;
            if books.value.is_empty() {
                continue;
            }
            let merged = table.entry(user_id).or_default();
            for book_id in books.value {
                if merged.contains(&book_id) {
                    dropped += 1;
                } else {
                    merged.push(book_id);
                }
            }
        }

        Normalized::new(table, dropped)
    }

    /// Known, unique book ids in their original order.
    pub fn book_list(&self, list: &[Value]) -> Normalized<Vec<BookId>> {
        let mut seen = HashSet::new();
        let mut books = Vec::new();
        let mut dropped = 0;

        for item in list {
            match item.as_str().and_then(|raw| self.known(raw)) {
                Some(id) if seen.insert(id.clone()) => books.push(id),
                _ => dropped += 1,
            }
        }

        Normalized::new(books, dropped)
    }

    pub fn comments(&self, value: &Value) -> Normalized<CommentsTable> {
        let mut table = CommentsTable::new();
        let mut dropped = 0;

        for (raw_id, list) in as_object(value) {
            let (Some(book_id), Some(list)) = (self.known(raw_id), list.as_array()) else {
                dropped += 1;
                continue;
            };

            let mut seen = HashSet::new();
            let mut comments = Vec::with_capacity(list.len());
            for item in list {
                match self.comment(&book_id, item) {
                    Some(comment) if seen.insert(comment.id.clone()) => comments.push(comment),
                    _ => dropped += 1,
                }
            }

            if comments.is_empty() {
                continue;
            }
            comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            table.insert(book_id, comments);
        }

        Normalized::new(table, dropped)
    }

    fn comment(&self, book_id: &BookId, value: &Value) -> Option<Comment> {
        let fields = value.as_object()?;

        // `text` / `timestamp` are the field names of the first storage layout.
        let content = fields
            .get("content")
            .or_else(|| fields.get("text"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|content| !content.is_empty())?;
        let created_at = fields
            .get("createdAt")
            .or_else(|| fields.get("timestamp"))
            .and_then(timestamp)?;

        let author_id = non_empty_str(fields, "authorId")
            .map(UserId::from)
            .unwrap_or_else(|| self.author.id.clone());
        let author_name = non_empty_str(fields, "authorName")
            .map(str::to_string)
            .unwrap_or_else(|| self.author.name.clone());
        // Missing ids must come out the same on every read, or the comment
        // could never be addressed by update or delete.
        let id = non_empty_str(fields, "id").map(CommentId::from).unwrap_or_else(|| {
            CommentId::derived(&format!(
                "{book_id}\n{}\n{author_id}\n{content}",
                created_at.to_rfc3339()
            ))
        });

        Some(Comment {
            id,
            author_id,
            author_name,
            content: content.to_string(),
            created_at,
            updated_at: fields.get("updatedAt").and_then(timestamp),
        })
    }

    pub fn activity(&self, value: &Value) -> Normalized<ActivityLog> {
        let Some(list) = value.as_array() else {
            return Normalized::new(Vec::new(), 0);
        };

        let mut entries: ActivityLog = Vec::with_capacity(list.len().min(self.config.max_activity));
        let mut dropped = 0;
        for item in list {
            match self.activity_entry(item) {
                Some(entry) => entries.push(entry),
                None => dropped += 1,
            }
        }

        if entries.len() > self.config.max_activity {
            dropped += entries.len() - self.config.max_activity;
            entries.truncate(self.config.max_activity);
        }

        Normalized::new(entries, dropped)
    }

    fn activity_entry(&self, value: &Value) -> Option<ActivityEntry> {
        let fields = value.as_object()?;

        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(ActivityKind::from_str_opt)?;
        let timestamp = fields.get("timestamp").and_then(timestamp)?;
        let book_id = match fields.get("bookId") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(self.known(raw)?),
            Some(_) => return None,
        };
        let detail = fields
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string);
        let id = non_empty_str(fields, "id")
            .map(|id| ActivityId(id.to_string()))
            .unwrap_or_else(|| {
                ActivityId::derived(&format!(
                    "{kind}\n{}\n{}\n{}",
                    book_id.as_ref().map_or("", BookId::as_str),
                    detail.as_deref().unwrap_or(""),
                    timestamp.to_rfc3339()
                ))
            });

        Some(ActivityEntry {
            id,
            kind,
            book_id,
            detail,
            timestamp,
        })
    }

    /// Make every `favorited` flag agree with the favorites table, which is
    /// the source of truth for membership.
    pub fn reconcile_favorites(actions: &mut ActionsTable, favorites: &FavoritesTable) {
        for (user_id, per_book) in actions.iter_mut() {
            let members = favorites.get(user_id);
            for (book_id, action) in per_book.iter_mut() {
                action.favorited = members.is_some_and(|list| list.contains(book_id));
            }
        }

        for (user_id, list) in favorites {
            let per_book = actions.entry(user_id.clone()).or_default();
            for book_id in list {
                per_book.entry(book_id.clone()).or_default().favorited = true;
            }
        }
    }

    fn known(&self, raw: &str) -> Option<BookId> {
        let id = BookId::new(raw);
        self.registry.is_known(&id).then_some(id)
    }
}

fn as_object(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    value.as_object().into_iter().flat_map(Map::iter)
}

/// User ids are compared trimmed, in the user record and as table keys alike.
fn user_key(raw: &str) -> Option<UserId> {
    let id = raw.trim();
    (!id.is_empty()).then(|| UserId::new(id))
}

fn non_empty_str<'v>(fields: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn flag(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

/// Non-negative integer counter; negatives, fractions below one and
/// non-numbers become zero.
fn counter(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.floor() as u64)
            })
            .unwrap_or(0),
        _ => 0,
    }
}

/// RFC 3339 string or epoch milliseconds.
pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::StaticRegistry;

    fn fixture() -> (StaticRegistry, LedgerConfig, User) {
        (
            StaticRegistry::from_ids(["known-1", "known-2"]),
            LedgerConfig::default(),
            User::default(),
        )
    }

    #[test]
    fn test_user_requires_id() {
        assert_eq!(Schema::user(&json!(null)), None);
        assert_eq!(Schema::user(&json!({"name": "x"})), None);
        assert_eq!(Schema::user(&json!({"id": ""})), None);
        assert_eq!(
            Schema::user(&json!({"id": "user-7"})),
            Some(User {
                id: UserId::from("user-7"),
                name: "You".to_string()
            })
        );
    }

    #[test]
    fn test_counts_clamp_and_prune() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);

        let counts = schema.counts(&json!({
            "known-1": {"likes": -4, "saves": 2.7},
            "known-2": {"likes": "7"},
            "ghost-99": {"likes": 3, "saves": 0},
            "bad": 12
        }));

        assert_eq!(counts.value.len(), 2);
        assert_eq!(counts.value[&BookId::from("known-1")], EngagementCounts::new(0, 2));
        assert_eq!(counts.value[&BookId::from("known-2")], EngagementCounts::new(0, 0));
        assert_eq!(counts.dropped, 2);
    }

    #[test]
    fn test_favorites_prune_and_dedupe() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);

        let favorites = schema.favorites(&json!({
            "user-1": ["known-1", "ghost-99", "known-1", 5],
            "user-2": "known-2"
        }));

        assert_eq!(
            favorites.value[&UserId::from("user-1")],
            vec![BookId::from("known-1")]
        );
        assert!(!favorites.value.contains_key(&UserId::from("user-2")));
        assert_eq!(favorites.dropped, 4);
    }

    #[test]
    fn test_comments_repair_legacy_records() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);

        let comments = schema.comments(&json!({
            "known-1": [
                {"text": "old layout", "timestamp": "2023-01-01T00:00:00.000Z"},
                {"id": "c2", "content": "newer", "createdAt": 1704067200000i64, "authorId": "user-1", "authorName": "You"},
                {"id": "c3", "content": "   ", "createdAt": 1704067200000i64},
                {"id": "c4", "content": "no timestamp"},
                "not an object"
            ],
            "known-2": [{"id": "c5", "content": "x"}],
            "ghost-99": [{"id": "c6", "content": "orphan", "createdAt": 1}]
        }));

        let list = &comments.value[&BookId::from("known-1")];
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, CommentId::from("c2"));
        assert_eq!(list[1].content, "old layout");
        assert!(list[1].id.as_str().starts_with("comment-"));
        assert_eq!(list[1].author_id, UserId::from("user-1"));
        assert!(!comments.value.contains_key(&BookId::from("known-2")));
        assert_eq!(comments.dropped, 5);
    }

    #[test]
    fn test_activity_filters_and_caps() {
        let (registry, _, user) = fixture();
        let config = LedgerConfig {
            max_activity: 2,
            ..LedgerConfig::default()
        };
        let schema = Schema::new(&registry, &config, &user);

        let activity = schema.activity(&json!([
            {"id": "a1", "type": "like_added", "bookId": "known-1", "timestamp": "2024-01-03T00:00:00Z"},
            {"id": "a2", "type": "teleported", "bookId": "known-1", "timestamp": "2024-01-02T00:00:00Z"},
            {"id": "a3", "type": "favorite_added", "bookId": "ghost-99", "timestamp": "2024-01-02T00:00:00Z"},
            {"type": "comment_removed", "bookId": null, "detail": "bye", "timestamp": "2024-01-01T00:00:00Z"},
            {"id": "a5", "type": "like_removed", "bookId": "known-2", "timestamp": "2023-12-31T00:00:00Z"}
        ]));

        assert_eq!(activity.value.len(), 2);
        assert_eq!(activity.value[0].id, ActivityId("a1".to_string()));
        assert_eq!(activity.value[1].kind, ActivityKind::CommentRemoved);
        assert_eq!(activity.value[1].detail.as_deref(), Some("bye"));
        assert_eq!(activity.dropped, 3);
    }

    #[test]
    fn test_type_mismatch_is_absent() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);

        assert!(schema.favorites(&json!(["known-1"])).value.is_empty());
        assert!(schema.comments(&json!("nope")).value.is_empty());
        assert!(schema.activity(&json!({"0": {}})).value.is_empty());
        assert!(schema.actions(&json!(42)).value.is_empty());
    }

    #[test]
    fn test_user_keys_are_trimmed_like_the_user_record() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);

        let owner = Schema::user(&json!({"id": " user-7 "})).unwrap();
        assert_eq!(owner.id, UserId::from("user-7"));

        let actions = schema.actions(&json!({
            " user-7 ": {"known-1": {"liked": true}},
            "user-7": {"known-2": {"saved": true}},
            "  ": {"known-1": {"liked": true}}
        }));
        let per_book = &actions.value[&owner.id];
        assert!(per_book[&BookId::from("known-1")].liked);
        assert!(per_book[&BookId::from("known-2")].saved);
        assert_eq!(actions.value.len(), 1);
        assert_eq!(actions.dropped, 1);

        let favorites = schema.favorites(&json!({
            " user-7 ": ["known-1"],
            "user-7": ["known-1", "known-2"]
        }));
        assert_eq!(favorites.value[&owner.id].len(), 2);
        assert_eq!(favorites.dropped, 1);
    }

    #[test]
    fn test_missing_ids_are_stable_across_reads() {
        let (registry, config, user) = fixture();
        let schema = Schema::new(&registry, &config, &user);
        let comments = json!({"known-1": [
            {"content": "first", "createdAt": "2024-01-01T00:00:00Z"},
            {"content": "second", "createdAt": "2024-01-01T00:00:00Z"}
        ]});
        let activity = json!([{"type": "like_added", "bookId": "known-1", "timestamp": "2024-01-01T00:00:00Z"}]);

        let first = schema.comments(&comments).value;
        let again = schema.comments(&comments).value;
        assert_eq!(first, again);
        let list = &first[&BookId::from("known-1")];
        assert_ne!(list[0].id, list[1].id);

        assert_eq!(
            schema.activity(&activity).value[0].id,
            schema.activity(&activity).value[0].id
        );
    }

    #[test]
    fn test_reconcile_favorites() {
        let mut actions = ActionsTable::new();
        actions.entry(UserId::from("user-1")).or_default().insert(
            BookId::from("known-2"),
            UserAction {
                liked: true,
                saved: false,
                favorited: true,
            },
        );
        let mut favorites = FavoritesTable::new();
        favorites.insert(UserId::from("user-1"), vec![BookId::from("known-1")]);

        Schema::reconcile_favorites(&mut actions, &favorites);

        let per_book = &actions[&UserId::from("user-1")];
        assert!(per_book[&BookId::from("known-1")].favorited);
        assert!(!per_book[&BookId::from("known-2")].favorited);
        assert!(per_book[&BookId::from("known-2")].liked);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(timestamp(&json!("2024-01-01T00:00:00Z")), Some(expected));
        assert_eq!(timestamp(&json!("2024-01-01T01:00:00+01:00")), Some(expected));
        assert_eq!(timestamp(&json!(1704067200000i64)), Some(expected));
        assert_eq!(timestamp(&json!("yesterday")), None);
        assert_eq!(timestamp(&json!(true)), None);
    }
}
