use crate::config::write_atomic;
use crate::error::{QuipError, Result};
use crate::models::Snippet;
use crate::store::QueryStore;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the whole collection, most recently used first, to `path`.
pub fn export_to(store: &dyn QueryStore, path: &Path) -> Result<usize> {
    let snippets = store.list_all()?;
    let serialized = serde_json::to_string_pretty(&snippets)?;
    write_atomic(path, serialized.as_bytes())?;

    info!(path = %path.display(), count = snippets.len(), "Exported snippets");
    Ok(snippets.len())
}

/// Parse an export file. The records keep their original ids until imported.
pub fn read_export(path: &Path) -> Result<Vec<Snippet>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    serde_json::from_str(&content)
        .map_err(|e| QuipError::CorruptState(format!("{}: {}", path.display(), e)))
}
