//! # leafline-ledger
//!
//! The interaction ledger: what the local user has done to which book.
//!
//! An [`InteractionLedger`] owns a [`TableStore`](leafline_store::TableStore)
//! and is given a [`BookRegistry`] and a [`Clock`] at construction. Opening it
//! normalizes every persisted table against the registry, after which each
//! mutation is a read-modify-write of whole tables followed by exactly one
//! activity entry.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use leafline_ledger::{InteractionLedger, LedgerConfig, StaticRegistry};
//! use leafline_shared::BookId;
//! use leafline_store::MemoryBackend;
//!
//! let registry = StaticRegistry::from_ids(["atlas-of-echoes"]);
//! let mut ledger = InteractionLedger::open(MemoryBackend::new(), Arc::new(registry), LedgerConfig::default());
//! let outcome = ledger.toggle_like(&BookId::from("atlas-of-echoes")).unwrap();
//! assert!(outcome.liked);
//! ```

pub mod activity;
pub mod backup;
pub mod clock;
pub mod comments;
pub mod config;
pub mod engagement;
pub mod ledger;
pub mod registry;
pub mod schema;
pub mod stats;

mod error;
mod events;

pub use backup::{ImportStats, UserDataExport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use comments::{validate_comment, BookComments, RecentComment};
pub use config::LedgerConfig;
pub use engagement::{FavoriteOutcome, LikeOutcome, SaveOutcome};
pub use error::{LedgerError, Result};
pub use ledger::InteractionLedger;
pub use registry::{BookRegistry, BookSeed, StaticRegistry};
pub use stats::Statistics;
