//! # leafline-shared
//!
//! Identifiers, constants and error types shared by the Leafline store,
//! ledger and command-line crates.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{ActivityId, ActivityKind, BookId, CommentId, UserId};
