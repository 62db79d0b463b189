//! Per-book comment threads.

use leafline_shared::{BookId, CommentId, ValidationError};
use leafline_store::{Comment, KvBackend, TableKey};
use serde::Serialize;
use tracing::debug;

use crate::activity::truncate;
use crate::error::Result;
use crate::events::{LedgerEvent, Outcome};
use crate::ledger::InteractionLedger;

/// All live comments of one book, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookComments {
    pub book_id: BookId,
    pub comments: Vec<Comment>,
}

/// A comment together with the book it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComment {
    pub book_id: BookId,
    #[serde(flatten)]
    pub comment: Comment,
}

/// Trim `raw` and check its length in characters.
pub fn validate_comment(raw: &str, min: usize, max: usize) -> std::result::Result<&str, ValidationError> {
    let content = raw.trim();
    let actual = content.chars().count();

    if actual == 0 {
        Err(ValidationError::Empty)
    } else if actual < min {
        Err(ValidationError::TooShort { min, actual })
    } else if actual > max {
        Err(ValidationError::TooLong { max, actual })
    } else {
        Ok(content)
    }
}

impl<B: KvBackend> InteractionLedger<B> {
    fn validate<'t>(&self, raw: &'t str) -> std::result::Result<&'t str, ValidationError> {
        validate_comment(raw, self.config.min_comment_len, self.config.max_comment_len)
    }

    /// Post a comment as the current user. Nothing is written when the text
    /// fails validation.
    pub fn add_comment(&mut self, book_id: &BookId, raw: &str) -> Result<Comment> {
        self.ensure_known(book_id)?;
        let content = self.validate(raw)?.to_string();

        Ok(self.apply(|ledger, user, now| {
            let comment = Comment {
                id: CommentId::generate(),
                author_id: user.id.clone(),
                author_name: user.name.clone(),
                content,
                created_at: now,
                updated_at: None,
            };

            let mut comments = ledger.load_comments();
            comments
                .entry(book_id.clone())
                .or_default()
                .insert(0, comment.clone());
            ledger.store.write_table(TableKey::Comments, &comments);
            debug!(book = %book_id, comment = %comment.id, "comment added");

            let preview = truncate(&comment.content, ledger.config.preview_len);
            Outcome::Changed(
                comment,
                LedgerEvent::CommentAdded {
                    book_id: book_id.clone(),
                    preview,
                },
            )
        }))
    }

    /// Replace the text of one of the current user's comments.
    ///
    /// Returns `Ok(None)` when the comment does not exist or belongs to
    /// someone else.
    pub fn update_comment(&mut self, book_id: &BookId, comment_id: &CommentId, raw: &str) -> Result<Option<Comment>> {
        let content = self.validate(raw)?.to_string();

        Ok(self.apply(|ledger, user, now| {
            let mut comments = ledger.load_comments();
            let Some(comment) = comments
                .get_mut(book_id)
                .and_then(|list| list.iter_mut().find(|c| &c.id == comment_id))
                .filter(|c| c.author_id == user.id)
            else {
                return Outcome::Unchanged(None);
            };

            comment.content = content;
            comment.updated_at = Some(now);
            let updated = comment.clone();

            ledger.store.write_table(TableKey::Comments, &comments);
            debug!(book = %book_id, comment = %comment_id, "comment updated");

            let preview = truncate(&updated.content, ledger.config.preview_len);
            Outcome::Changed(
                Some(updated),
                LedgerEvent::CommentUpdated {
                    book_id: book_id.clone(),
                    preview,
                },
            )
        }))
    }

    /// Delete one of the current user's comments. A book left without
    /// comments disappears from the table.
    pub fn delete_comment(&mut self, book_id: &BookId, comment_id: &CommentId) -> bool {
        self.apply(|ledger, user, _| {
            let mut comments = ledger.load_comments();
            let Some(list) = comments.get_mut(book_id) else {
                return Outcome::Unchanged(false);
            };
            let Some(index) = list
                .iter()
                .position(|c| &c.id == comment_id && c.author_id == user.id)
            else {
                return Outcome::Unchanged(false);
            };

            let removed = list.remove(index);
            if list.is_empty() {
                comments.remove(book_id);
            }

            ledger.store.write_table(TableKey::Comments, &comments);
            debug!(book = %book_id, comment = %comment_id, "comment deleted");

            Outcome::Changed(
                true,
                LedgerEvent::CommentRemoved {
                    book_id: book_id.clone(),
                    text: removed.content,
                },
            )
        })
    }

    /// Comments on `book_id`, newest first.
    pub fn get_comments(&self, book_id: &BookId) -> Vec<Comment> {
        self.load_comments().remove(book_id).unwrap_or_default()
    }

    /// Every book with at least one comment.
    pub fn get_comments_grouped_by_book(&self) -> Vec<BookComments> {
        self.load_comments()
            .into_iter()
            .map(|(book_id, comments)| BookComments { book_id, comments })
            .collect()
    }

    /// The `limit` newest comments across all books.
    pub fn get_recent_comments(&self, limit: usize) -> Vec<RecentComment> {
        let mut recent: Vec<RecentComment> = self
            .load_comments()
            .into_iter()
            .flat_map(|(book_id, comments)| {
                comments.into_iter().map(move |comment| RecentComment {
                    book_id: book_id.clone(),
                    comment,
                })
            })
            .collect();

        recent.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
        recent.truncate(limit);
        recent
    }
}
