//! Reading and rendering the activity log.

use leafline_shared::constants::ACTIVITY_PREVIEW_LEN;
use leafline_shared::ActivityKind;
use leafline_store::{ActivityEntry, KvBackend};

use crate::ledger::InteractionLedger;

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// One-line, human-readable summary of `entry`. `title` is the book title
/// if the catalog knows it.
pub fn describe(entry: &ActivityEntry, title: Option<&str>) -> String {
    let title = match title {
        Some(title) => format!("\"{title}\""),
        None => "a book".to_string(),
    };
    let detail = || truncate(entry.detail.as_deref().unwrap_or_default(), ACTIVITY_PREVIEW_LEN);

    match entry.kind {
        ActivityKind::FavoriteAdded => format!("Added {title} to favorites."),
        ActivityKind::FavoriteRemoved => format!("Removed {title} from favorites."),
        ActivityKind::LikeAdded => format!("Liked {title}."),
        ActivityKind::LikeRemoved => format!("Unliked {title}."),
        ActivityKind::SaveAdded => format!("Saved {title} for later."),
        ActivityKind::SaveRemoved => format!("Removed {title} from saved books."),
        ActivityKind::CommentAdded => format!("Commented on {title}: {}", detail()),
        ActivityKind::CommentUpdated => format!("Edited a comment on {title}: {}", detail()),
        ActivityKind::CommentRemoved => format!("Deleted a comment from {title}."),
    }
}

impl<B: KvBackend> InteractionLedger<B> {
    /// The `limit` most recent entries, newest first.
    pub fn get_recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut log = self.load_activity();
        log.truncate(limit);
        log
    }

    pub fn describe_activity(&self, entry: &ActivityEntry) -> String {
        let title = entry
            .book_id
            .as_ref()
            .and_then(|book_id| self.registry.title(book_id));
        describe(entry, title.as_deref())
    }
}
