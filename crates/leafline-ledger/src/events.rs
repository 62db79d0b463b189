use chrono::{DateTime, Utc};
use leafline_shared::{ActivityId, ActivityKind, BookId};
use leafline_store::ActivityEntry;

/// What a successful mutation did. Each mutation yields at most one event
/// and each event becomes exactly one activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LedgerEvent {
    LikeAdded(BookId),
    LikeRemoved(BookId),
    SaveAdded(BookId),
    SaveRemoved(BookId),
    FavoriteAdded(BookId),
    FavoriteRemoved(BookId),
    CommentAdded { book_id: BookId, preview: String },
    CommentUpdated { book_id: BookId, preview: String },
    CommentRemoved { book_id: BookId, text: String },
}

impl LedgerEvent {
    pub(crate) fn kind(&self) -> ActivityKind {
        match self {
            Self::LikeAdded(_) => ActivityKind::LikeAdded,
            Self::LikeRemoved(_) => ActivityKind::LikeRemoved,
            Self::SaveAdded(_) => ActivityKind::SaveAdded,
            Self::SaveRemoved(_) => ActivityKind::SaveRemoved,
            Self::FavoriteAdded(_) => ActivityKind::FavoriteAdded,
            Self::FavoriteRemoved(_) => ActivityKind::FavoriteRemoved,
            Self::CommentAdded { .. } => ActivityKind::CommentAdded,
            Self::CommentUpdated { .. } => ActivityKind::CommentUpdated,
            Self::CommentRemoved { .. } => ActivityKind::CommentRemoved,
        }
    }

    pub(crate) fn into_entry(self, timestamp: DateTime<Utc>) -> ActivityEntry {
        let kind = self.kind();
        let (book_id, detail) = match self {
            Self::LikeAdded(book_id)
            | Self::LikeRemoved(book_id)
            | Self::SaveAdded(book_id)
            | Self::SaveRemoved(book_id)
            | Self::FavoriteAdded(book_id)
            | Self::FavoriteRemoved(book_id) => (book_id, None),
            Self::CommentAdded { book_id, preview } | Self::CommentUpdated { book_id, preview } => {
                (book_id, Some(preview))
            }
            Self::CommentRemoved { book_id, text } => (book_id, Some(text)),
        };

        ActivityEntry {
            id: ActivityId::generate(),
            kind,
            book_id: Some(book_id),
            detail,
            timestamp,
        }
    }
}

/// Result of a mutation body run inside the ledger's commit step.
pub(crate) enum Outcome<T> {
    Changed(T, LedgerEvent),
    Unchanged(T),
}
