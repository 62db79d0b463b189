//! # leafline-store
//!
//! Durable local storage for Leafline interaction state.
//!
//! The crate exposes a typed, whole-document [`TableStore`] over any
//! synchronous [`KvBackend`]: a SQLite [`Database`] for real deployments and
//! an in-process [`MemoryBackend`] for tests and embedding. Table reads and
//! writes never fail; backend errors are logged and absorbed at this layer.

pub mod backend;
pub mod database;
pub mod migrations;
pub mod models;
pub mod tables;

mod error;

pub use backend::{KvBackend, MemoryBackend};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use tables::{TableKey, TableStore};
