/// Versioned namespace prefixed to every persisted table key.
/// Bump the suffix whenever the table layout changes incompatibly.
pub const STORAGE_NAMESPACE: &str = "leafline-state-v1";

/// Maximum number of activity entries retained (oldest evicted first)
pub const MAX_ACTIVITY: usize = 30;

/// Minimum comment length in characters, after trimming
pub const MIN_COMMENT_LEN: usize = 2;

/// Maximum comment length in characters, after trimming
pub const MAX_COMMENT_LEN: usize = 500;

/// Length of the comment preview stored in `comment_added` activity entries
pub const ACTIVITY_PREVIEW_LEN: usize = 80;

/// Identity fabricated for the single local user
pub const DEFAULT_USER_ID: &str = "user-1";
pub const DEFAULT_USER_NAME: &str = "You";

/// Default page sizes used by the recent-items queries
pub const DEFAULT_RECENT_COMMENTS: usize = 5;
pub const DEFAULT_RECENT_ACTIVITY: usize = 5;
