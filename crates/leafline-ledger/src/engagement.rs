//! Likes, saves and favorites.

use leafline_shared::BookId;
use leafline_store::{EngagementCounts, KvBackend, TableKey, User, UserAction};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::events::{LedgerEvent, Outcome};
use crate::ledger::InteractionLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub counts: EngagementCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub saved: bool,
    pub counts: EngagementCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteOutcome {
    pub favorited: bool,
    /// The user's favorites after the toggle, most recent first.
    pub favorites: Vec<BookId>,
}

/// The two counters backed by a per-user flag.
#[derive(Debug, Clone, Copy)]
enum Counter {
    Likes,
    Saves,
}

impl Counter {
    fn flag(self, action: &mut UserAction) -> &mut bool {
        match self {
            Self::Likes => &mut action.liked,
            Self::Saves => &mut action.saved,
        }
    }

    fn count(self, counts: &mut EngagementCounts) -> &mut u64 {
        match self {
            Self::Likes => &mut counts.likes,
            Self::Saves => &mut counts.saves,
        }
    }

    fn event(self, book_id: BookId, on: bool) -> LedgerEvent {
        match (self, on) {
            (Self::Likes, true) => LedgerEvent::LikeAdded(book_id),
            (Self::Likes, false) => LedgerEvent::LikeRemoved(book_id),
            (Self::Saves, true) => LedgerEvent::SaveAdded(book_id),
            (Self::Saves, false) => LedgerEvent::SaveRemoved(book_id),
        }
    }
}

/// Move a counter one step, never below zero.
fn step(value: u64, up: bool) -> u64 {
    if up {
        value.saturating_add(1)
    } else {
        value.saturating_sub(1)
    }
}

impl<B: KvBackend> InteractionLedger<B> {
    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    /// Seed counts for `book_id` if none exist yet and return what is stored.
    pub fn ensure_counts(&mut self, book_id: &BookId, defaults: EngagementCounts) -> Result<EngagementCounts> {
        self.ensure_known(book_id)?;

        let mut counts = self.load_counts();
        if let Some(existing) = counts.get(book_id) {
            return Ok(*existing);
        }

        counts.insert(book_id.clone(), defaults);
        self.store.write_table(TableKey::Counts, &counts);
        debug!(book = %book_id, likes = defaults.likes, saves = defaults.saves, "counts seeded");
        Ok(defaults)
    }

    /// Stored counts, or the catalog defaults for a book never touched.
    pub fn get_counts(&self, book_id: &BookId) -> EngagementCounts {
        self.load_counts()
            .get(book_id)
            .copied()
            .unwrap_or_else(|| self.registry.default_counts(book_id))
    }

    // ------------------------------------------------------------------
    // Toggles
    // ------------------------------------------------------------------

    pub fn toggle_like(&mut self, book_id: &BookId) -> Result<LikeOutcome> {
        let (liked, counts) = self.toggle_counter(book_id, Counter::Likes)?;
        Ok(LikeOutcome { liked, counts })
    }

    pub fn toggle_save(&mut self, book_id: &BookId) -> Result<SaveOutcome> {
        let (saved, counts) = self.toggle_counter(book_id, Counter::Saves)?;
        Ok(SaveOutcome { saved, counts })
    }

    fn toggle_counter(&mut self, book_id: &BookId, counter: Counter) -> Result<(bool, EngagementCounts)> {
        self.ensure_known(book_id)?;

        Ok(self.apply(|ledger, user, _| {
            let mut actions = ledger.load_actions();
            let flag = counter.flag(
                actions
                    .entry(user.id.clone())
                    .or_default()
                    .entry(book_id.clone())
                    .or_default(),
            );
            *flag = !*flag;
            let on = *flag;

            let mut counts = ledger.load_counts();
            let entry = counts
                .entry(book_id.clone())
                .or_insert_with(|| ledger.registry.default_counts(book_id));
            let count = counter.count(entry);
            *count = step(*count, on);
            let current = *entry;

            ledger.store.write_table(TableKey::UserActions, &actions);
            ledger.store.write_table(TableKey::Counts, &counts);
            debug!(book = %book_id, ?counter, on, likes = current.likes, saves = current.saves, "toggled");

            Outcome::Changed((on, current), counter.event(book_id.clone(), on))
        }))
    }

    pub fn toggle_favorite(&mut self, book_id: &BookId) -> Result<FavoriteOutcome> {
        self.ensure_known(book_id)?;

        Ok(self.apply(|ledger, user, _| {
            let mut favorites = ledger.load_favorites();
            let list = favorites.entry(user.id.clone()).or_default();
            let favorited = match list.iter().position(|id| id == book_id) {
                Some(index) => {
                    list.remove(index);
                    false
                }
                None => {
                    list.insert(0, book_id.clone());
                    true
                }
            };
            let current = list.clone();
            if current.is_empty() {
                favorites.remove(&user.id);
            }

            ledger.store.write_table(TableKey::Favorites, &favorites);
            ledger.set_favorited(user, book_id, favorited);

            let event = if favorited {
                LedgerEvent::FavoriteAdded(book_id.clone())
            } else {
                LedgerEvent::FavoriteRemoved(book_id.clone())
            };
            Outcome::Changed(
                FavoriteOutcome {
                    favorited,
                    favorites: current,
                },
                event,
            )
        }))
    }

    /// Drop `book_id` from the favorites. Returns `false` if it was not there.
    pub fn remove_favorite(&mut self, book_id: &BookId) -> bool {
        self.apply(|ledger, user, _| {
            let mut favorites = ledger.load_favorites();
            let Some(list) = favorites.get_mut(&user.id) else {
                return Outcome::Unchanged(false);
            };
            let Some(index) = list.iter().position(|id| id == book_id) else {
                return Outcome::Unchanged(false);
            };

            list.remove(index);
            if list.is_empty() {
                favorites.remove(&user.id);
            }

            ledger.store.write_table(TableKey::Favorites, &favorites);
            ledger.set_favorited(user, book_id, false);
            Outcome::Changed(true, LedgerEvent::FavoriteRemoved(book_id.clone()))
        })
    }

    fn set_favorited(&mut self, user: &User, book_id: &BookId, favorited: bool) {
        let mut actions = self.load_actions();
        actions
            .entry(user.id.clone())
            .or_default()
            .entry(book_id.clone())
            .or_default()
            .favorited = favorited;
        self.store.write_table(TableKey::UserActions, &actions);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The current user's flags for `book_id`. `favorited` always reflects
    /// membership in the favorites list.
    pub fn get_user_action(&self, book_id: &BookId) -> UserAction {
        let user = self.current_user();
        let mut action = self
            .load_actions()
            .get(&user.id)
            .and_then(|per_book| per_book.get(book_id))
            .copied()
            .unwrap_or_default();
        action.favorited = self.get_favorites().contains(book_id);
        action
    }

    /// Favorited books, most recent first.
    pub fn get_favorites(&self) -> Vec<BookId> {
        let user = self.current_user();
        self.load_favorites().remove(&user.id).unwrap_or_default()
    }

    /// Books the current user has saved for later.
    pub fn get_saved_books(&self) -> Vec<BookId> {
        let user = self.current_user();
        self.load_actions()
            .remove(&user.id)
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, action)| action.saved)
            .map(|(book_id, _)| book_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use leafline_store::MemoryBackend;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::registry::{BookSeed, StaticRegistry};

    fn ledger() -> InteractionLedger<MemoryBackend> {
        let registry = StaticRegistry::from_seeds([
            BookSeed::new("atlas-of-echoes", 182, 0),
            BookSeed::new("luminary-threads", 264, 12),
        ]);
        InteractionLedger::open(MemoryBackend::new(), Arc::new(registry), LedgerConfig::default())
    }

    fn atlas() -> BookId {
        BookId::from("atlas-of-echoes")
    }

    #[test]
    fn test_step_clamps_at_zero() {
        assert_eq!(step(0, false), 0);
        assert_eq!(step(0, true), 1);
        assert_eq!(step(5, false), 4);
        assert_eq!(step(u64::MAX, true), u64::MAX);
    }

    #[test]
    fn test_ensure_counts_is_idempotent() {
        let mut ledger = ledger();
        let first = ledger.ensure_counts(&atlas(), EngagementCounts::new(10, 2)).unwrap();
        let second = ledger.ensure_counts(&atlas(), EngagementCounts::new(99, 99)).unwrap();
        assert_eq!(first, EngagementCounts::new(10, 2));
        assert_eq!(second, first);
        assert!(ledger.get_recent_activity(10).is_empty());
    }

    #[test]
    fn test_get_counts_falls_back_to_catalog() {
        let ledger = ledger();
        assert_eq!(ledger.get_counts(&atlas()), EngagementCounts::new(182, 0));
        assert_eq!(
            ledger.get_counts(&BookId::from("ghost-1")),
            EngagementCounts::default()
        );
    }

    #[test]
    fn test_toggle_like_seeds_from_catalog() {
        let mut ledger = ledger();
        let outcome = ledger.toggle_like(&atlas()).unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.counts, EngagementCounts::new(183, 0));
        assert!(ledger.get_user_action(&atlas()).liked);
    }

    #[test]
    fn test_toggle_save_is_an_involution() {
        let mut ledger = ledger();
        let book = BookId::from("luminary-threads");
        let on = ledger.toggle_save(&book).unwrap();
        let off = ledger.toggle_save(&book).unwrap();

        assert!(on.saved);
        assert_eq!(on.counts.saves, 13);
        assert!(!off.saved);
        assert_eq!(off.counts, EngagementCounts::new(264, 12));
        assert!(ledger.get_saved_books().is_empty());
    }

    #[test]
    fn test_toggle_unknown_book_fails_without_logging() {
        let mut ledger = ledger();
        assert!(ledger.toggle_like(&BookId::from("ghost-1")).is_err());
        assert!(ledger.toggle_favorite(&BookId::from("ghost-1")).is_err());
        assert!(ledger.get_recent_activity(10).is_empty());
    }

    #[test]
    fn test_favorites_are_most_recent_first() {
        let mut ledger = ledger();
        let threads = BookId::from("luminary-threads");
        ledger.toggle_favorite(&atlas()).unwrap();
        let outcome = ledger.toggle_favorite(&threads).unwrap();

        assert_eq!(outcome.favorites, vec![threads.clone(), atlas()]);
        assert!(ledger.get_user_action(&atlas()).favorited);

        let outcome = ledger.toggle_favorite(&atlas()).unwrap();
        assert!(!outcome.favorited);
        assert_eq!(outcome.favorites, vec![threads]);
        assert!(!ledger.get_user_action(&atlas()).favorited);
    }

    #[test]
    fn test_remove_favorite() {
        let mut ledger = ledger();
        assert!(!ledger.remove_favorite(&atlas()));

        ledger.toggle_favorite(&atlas()).unwrap();
        assert!(ledger.remove_favorite(&atlas()));
        assert!(ledger.get_favorites().is_empty());
        assert!(!ledger.get_user_action(&atlas()).favorited);

        let kinds: Vec<_> = ledger.get_recent_activity(10).iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                leafline_shared::ActivityKind::FavoriteRemoved,
                leafline_shared::ActivityKind::FavoriteAdded
            ]
        );
    }

    #[test]
    fn test_saved_books() {
        let mut ledger = ledger();
        ledger.toggle_save(&atlas()).unwrap();
        ledger.toggle_like(&BookId::from("luminary-threads")).unwrap();
        assert_eq!(ledger.get_saved_books(), vec![atlas()]);
    }
}
