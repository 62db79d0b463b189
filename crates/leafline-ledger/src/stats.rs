use chrono::{DateTime, Utc};
use leafline_store::KvBackend;
use serde::Serialize;

use crate::ledger::InteractionLedger;

/// Dashboard summary for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_favorites: usize,
    /// Books the current user currently likes.
    pub likes_cast: usize,
    /// Comments across all books, by anyone.
    pub total_comments: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

impl<B: KvBackend> InteractionLedger<B> {
    pub fn get_statistics(&self) -> Statistics {
        let user = self.current_user();

        let likes_cast = self
            .load_actions()
            .get(&user.id)
            .map(|per_book| per_book.values().filter(|action| action.liked).count())
            .unwrap_or(0);
        let total_comments = self.load_comments().values().map(Vec::len).sum();

        Statistics {
            total_favorites: self.get_favorites().len(),
            likes_cast,
            total_comments,
            last_activity: self.load_activity().first().map(|entry| entry.timestamp),
        }
    }
}
