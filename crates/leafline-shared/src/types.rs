use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Book identity = the catalog slug, e.g. "atlas-of-echoes"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentId(pub String);

impl CommentId {
    /// Fresh opaque id, `comment-<uuid v4>`.
    pub fn generate() -> Self {
        Self(format!("comment-{}", Uuid::new_v4()))
    }

    /// Deterministic id for a stored comment that lost its own, derived
    /// from the record's content so every read yields the same value.
    pub fn derived(seed: &str) -> Self {
        Self(format!("comment-{}", Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ActivityId(pub String);

impl ActivityId {
    /// Fresh opaque id, `act-<uuid v4>`.
    pub fn generate() -> Self {
        Self(format!("act-{}", Uuid::new_v4()))
    }

    /// Deterministic counterpart of [`ActivityId::generate`].
    pub fn derived(seed: &str) -> Self {
        Self(format!("act-{}", Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())))
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::generate()
    }
}

/// What a logged interaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    FavoriteAdded,
    FavoriteRemoved,
    LikeAdded,
    LikeRemoved,
    SaveAdded,
    SaveRemoved,
    CommentAdded,
    CommentUpdated,
    CommentRemoved,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 9] = [
        Self::FavoriteAdded,
        Self::FavoriteRemoved,
        Self::LikeAdded,
        Self::LikeRemoved,
        Self::SaveAdded,
        Self::SaveRemoved,
        Self::CommentAdded,
        Self::CommentUpdated,
        Self::CommentRemoved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FavoriteAdded => "favorite_added",
            Self::FavoriteRemoved => "favorite_removed",
            Self::LikeAdded => "like_added",
            Self::LikeRemoved => "like_removed",
            Self::SaveAdded => "save_added",
            Self::SaveRemoved => "save_removed",
            Self::CommentAdded => "comment_added",
            Self::CommentUpdated => "comment_updated",
            Self::CommentRemoved => "comment_removed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_kind_wire_names() {
        for kind in ActivityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(ActivityKind::from_str_opt(kind.as_str()), Some(kind));
        }
        assert_eq!(ActivityKind::from_str_opt("shared"), None);
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = CommentId::generate();
        let b = CommentId::generate();
        assert!(a.as_str().starts_with("comment-"));
        assert_ne!(a, b);
        assert!(ActivityId::generate().0.starts_with("act-"));
    }

    #[test]
    fn test_derived_ids_are_stable() {
        assert_eq!(CommentId::derived("seed"), CommentId::derived("seed"));
        assert_ne!(CommentId::derived("seed"), CommentId::derived("other"));
        assert!(CommentId::derived("seed").as_str().starts_with("comment-"));
        assert!(ActivityId::derived("seed").0.starts_with("act-"));
    }

    #[test]
    fn test_book_id_serializes_as_plain_string() {
        let id = BookId::from("atlas-of-echoes");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"atlas-of-echoes\"");
    }
}
