//! The book catalog as seen by the ledger.
//!
//! The ledger never owns book metadata. It only asks whether an id is known
//! (anything else is dropped as stale), what engagement counts a book starts
//! from, and optionally a title for human-readable activity lines.

use std::collections::HashMap;

use leafline_shared::BookId;
use leafline_store::EngagementCounts;
use serde::Deserialize;

use crate::error::{LedgerError, Result};

pub trait BookRegistry: Send + Sync {
    fn is_known(&self, id: &BookId) -> bool;

    /// Seed counts used the first time a book is interacted with.
    fn default_counts(&self, _id: &BookId) -> EngagementCounts {
        EngagementCounts::default()
    }

    fn title(&self, _id: &BookId) -> Option<String> {
        None
    }
}

/// One catalog row.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookSeed {
    pub id: BookId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "communityLikes")]
    pub likes: u64,
    #[serde(default)]
    pub saves: u64,
}

impl BookSeed {
    pub fn new(id: impl Into<String>, likes: u64, saves: u64) -> Self {
        Self {
            id: BookId::new(id),
            title: None,
            likes,
            saves,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Registry over a fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    books: HashMap<BookId, BookSeed>,
    order: Vec<BookId>,
}

impl StaticRegistry {
    pub fn from_seeds(seeds: impl IntoIterator<Item = BookSeed>) -> Self {
        let mut registry = Self::default();
        for seed in seeds {
            if !registry.books.contains_key(&seed.id) {
                registry.order.push(seed.id.clone());
            }
            registry.books.insert(seed.id.clone(), seed);
        }
        registry
    }

    /// Catalog of bare ids with zero seed counts.
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self::from_seeds(ids.into_iter().map(|id| BookSeed::new(id, 0, 0)))
    }

    /// Parse a JSON array of catalog rows (`id`, optional `title`, `likes`
    /// or `communityLikes`, `saves`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let seeds: Vec<BookSeed> = serde_json::from_str(json)
            .map_err(|e| LedgerError::Format(format!("invalid catalog: {e}")))?;
        Ok(Self::from_seeds(seeds))
    }

    /// Book ids in catalog order.
    pub fn ids(&self) -> &[BookId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl BookRegistry for StaticRegistry {
    fn is_known(&self, id: &BookId) -> bool {
        self.books.contains_key(id)
    }

    fn default_counts(&self, id: &BookId) -> EngagementCounts {
        self.books
            .get(id)
            .map(|seed| EngagementCounts::new(seed.likes, seed.saves))
            .unwrap_or_default()
    }

    fn title(&self, id: &BookId) -> Option<String> {
        self.books.get(id).and_then(|seed| seed.title.clone())
    }
}
