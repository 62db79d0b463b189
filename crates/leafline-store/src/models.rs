//! Domain model structs persisted in the table documents.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names so the persisted JSON keeps the layout the UI layer already reads.

use chrono::{DateTime, Utc};
use leafline_shared::constants::{DEFAULT_USER_ID, DEFAULT_USER_NAME};
use leafline_shared::{ActivityId, ActivityKind, BookId, CommentId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The single locally-fabricated identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: UserId::new(DEFAULT_USER_ID),
            name: DEFAULT_USER_NAME.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

/// Aggregate counters for one book. Unsigned, so they cannot go negative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementCounts {
    pub likes: u64,
    pub saves: u64,
}

impl EngagementCounts {
    pub fn new(likes: u64, saves: u64) -> Self {
        Self { likes, saves }
    }
}

/// The current user's relationship to one book.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAction {
    pub liked: bool,
    pub saved: bool,
    pub favorited: bool,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub author_name: String,
    /// Trimmed, length-checked text.
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Set by the last edit; `None` until the comment is edited.
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// One immutable record of a past interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub book_id: Option<BookId>,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}
