//! Command parsing and execution.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use leafline_ledger::{BookRegistry, InteractionLedger};
use leafline_shared::constants::{DEFAULT_RECENT_ACTIVITY, DEFAULT_RECENT_COMMENTS};
use leafline_shared::BookId;
use leafline_store::KvBackend;

#[derive(Parser, Debug)]
#[command(name = "leafline")]
#[command(about = "Inspect and edit the Leafline interaction ledger")]
#[command(
    after_help = "Environment:\n  LEAFLINE_DB_PATH    SQLite file (default: platform data dir)\n  LEAFLINE_CATALOG    JSON catalog file (default: built-in)\n  RUST_LOG            Log filter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summary of favorites, likes and comments
    Stats,
    /// Most recent interactions
    Activity {
        #[arg(default_value_t = DEFAULT_RECENT_ACTIVITY)]
        limit: usize,
    },
    /// Favorited books, most recent first
    Favorites,
    /// Books saved for later
    Saved,
    /// Most recent comments across all books
    Comments {
        #[arg(default_value_t = DEFAULT_RECENT_COMMENTS)]
        limit: usize,
    },
    /// Toggle a like
    Like { book: String },
    /// Toggle a save
    Save { book: String },
    /// Toggle a favorite
    Favorite { book: String },
    /// Post a comment
    Comment {
        book: String,
        #[arg(required = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Print the current user's data as JSON
    Export,
    /// Merge a file produced by `export`
    Import { file: PathBuf },
    /// Erase all interaction state
    Reset,
}

/// Run `command` against `ledger`, writing human output to `out`.
pub fn execute<B: KvBackend, W: Write>(
    ledger: &mut InteractionLedger<B>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Stats => {
            let stats = ledger.get_statistics();
            writeln!(out, "favorites: {}", stats.total_favorites)?;
            writeln!(out, "likes:     {}", stats.likes_cast)?;
            writeln!(out, "comments:  {}", stats.total_comments)?;
            match stats.last_activity {
                Some(at) => writeln!(out, "last:      {}", at.to_rfc3339())?,
                None => writeln!(out, "last:      never")?,
            }
        }
        Command::Activity { limit } => {
            for entry in ledger.get_recent_activity(limit) {
                writeln!(out, "{}  {}", entry.timestamp.to_rfc3339(), ledger.describe_activity(&entry))?;
            }
        }
        Command::Favorites => {
            for book_id in ledger.get_favorites() {
                writeln!(out, "{}", book_line(ledger, &book_id))?;
            }
        }
        Command::Saved => {
            for book_id in ledger.get_saved_books() {
                writeln!(out, "{}", book_line(ledger, &book_id))?;
            }
        }
        Command::Comments { limit } => {
            for recent in ledger.get_recent_comments(limit) {
                writeln!(
                    out,
                    "{}  {}  {}: {}",
                    recent.comment.created_at.to_rfc3339(),
                    recent.book_id,
                    recent.comment.author_name,
                    recent.comment.content
                )?;
            }
        }
        Command::Like { book } => {
            let book_id = BookId::new(book);
            let outcome = ledger.toggle_like(&book_id)?;
            let verb = if outcome.liked { "liked" } else { "unliked" };
            writeln!(out, "{verb} {book_id} ({} likes)", outcome.counts.likes)?;
        }
        Command::Save { book } => {
            let book_id = BookId::new(book);
            let outcome = ledger.toggle_save(&book_id)?;
            let verb = if outcome.saved { "saved" } else { "unsaved" };
            writeln!(out, "{verb} {book_id} ({} saves)", outcome.counts.saves)?;
        }
        Command::Favorite { book } => {
            let book_id = BookId::new(book);
            let outcome = ledger.toggle_favorite(&book_id)?;
            let verb = if outcome.favorited { "favorited" } else { "unfavorited" };
            writeln!(out, "{verb} {book_id} ({} favorites)", outcome.favorites.len())?;
        }
        Command::Comment { book, text } => {
            let book_id = BookId::new(book);
            let comment = ledger.add_comment(&book_id, &text.join(" "))?;
            writeln!(out, "posted {} on {book_id}", comment.id)?;
        }
        Command::Export => {
            let export = ledger.export_user_data();
            writeln!(out, "{}", serde_json::to_string_pretty(&export)?)?;
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let data: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let stats = ledger.import_user_data(&data)?;
            writeln!(
                out,
                "imported {} comments, dropped {} stale records",
                stats.comments_added, stats.dropped
            )?;
        }
        Command::Reset => {
            ledger.reset();
            writeln!(out, "all interaction state erased")?;
        }
    }
    Ok(())
}

fn book_line<B: KvBackend>(ledger: &InteractionLedger<B>, book_id: &BookId) -> String {
    match ledger.registry().title(book_id) {
        Some(title) => format!("{book_id}  {title}"),
        None => book_id.to_string(),
    }
}
