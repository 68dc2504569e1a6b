//! The snippet store contract and its backends.
//!
//! Every backend must give the same answers for the same sequence of calls:
//! `list_all` and `search` order by last use (newest first, ties in insertion
//! order), `list_by_category` orders by name (ties in insertion order), and
//! text matching folds case with [`crate::models::fold`].

pub mod file;
pub mod seed;
pub mod sqlite;

use crate::error::{QuipError, Result};
use crate::models::{Snippet, SnippetDraft, SnippetId, MAX_USAGE_COUNT};
use chrono::SubsecRound;

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// How an import treats the snippets already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep the existing collection and add the imported records after it.
    Append,
    /// Discard the existing collection first.
    Replace,
}

pub trait QueryStore {
    /// All snippets, most recently used first.
    fn list_all(&self) -> Result<Vec<Snippet>>;

    fn get(&self, id: SnippetId) -> Result<Option<Snippet>>;

    /// Snippets whose category equals `category` ignoring case, ordered by name.
    fn list_by_category(&self, category: &str) -> Result<Vec<Snippet>>;

    /// Substring search over name, body, description and category.
    ///
    /// A blank term returns the same as [`QueryStore::list_all`].
    fn search(&self, term: &str) -> Result<Vec<Snippet>>;

    fn add(&mut self, draft: SnippetDraft) -> Result<Snippet>;

    /// Replace the editable fields of an existing snippet.
    fn update(&mut self, id: SnippetId, fields: SnippetDraft) -> Result<()>;

    /// Remove a snippet. Removing an unknown id succeeds.
    fn delete(&mut self, id: SnippetId) -> Result<()>;

    fn increment_usage(&mut self, id: SnippetId) -> Result<()>;

    /// Insert previously exported records under fresh ids, keeping their usage data.
    ///
    /// All records are validated before anything is written. Returns the number imported.
    fn import(&mut self, records: Vec<Snippet>, mode: ImportMode) -> Result<usize>;

    fn backend_name(&self) -> &'static str;
}

/// Validate every record and give each one a new identifier.
///
/// Timestamps are cut to microseconds so every backend stores the same value.
pub(crate) fn prepare_import(records: Vec<Snippet>) -> Result<Vec<Snippet>> {
    for record in &records {
        record.validate()?;
        if record.usage_count > MAX_USAGE_COUNT {
            return Err(QuipError::Validation(format!(
                "usage count of '{}' is out of range",
                record.name
            )));
        }
    }
    Ok(records
        .into_iter()
        .map(|mut record| {
            record.id = SnippetId::new();
            record.created_at = record.created_at.trunc_subsecs(6);
            record.last_used = record.last_used.trunc_subsecs(6);
            record
        })
        .collect())
}
