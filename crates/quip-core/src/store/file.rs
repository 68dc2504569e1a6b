use crate::config::{ensure_config_dir, get_db_file_path, write_atomic};
use crate::error::{QuipError, Result};
use crate::models::{self, fold, Snippet, SnippetDraft, SnippetId};
use crate::store::{prepare_import, seed, ImportMode, QueryStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snippet store backed by one JSON file, held fully in memory.
///
/// The in-memory collection is authoritative between loads. Every mutation
/// rewrites the whole file through a temp-file-and-rename, so only one process
/// may write a given file.
pub struct FileStore {
    path: PathBuf,
    snippets: Vec<Snippet>,
}

impl FileStore {
    /// Open the store at `path`, seeding it with examples when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            info!(path = %path.display(), "Creating snippet file with examples");
            let store = Self {
                snippets: seed::sample_snippets(models::now()),
                path,
            };
            store.save(&store.snippets)?;
            return Ok(store);
        }

        let snippets = load_snippets(&path);
        debug!(path = %path.display(), count = snippets.len(), "Loaded snippets");
        Ok(Self { path, snippets })
    }

    /// Open the store in the quip configuration directory.
    pub fn open_default() -> Result<Self> {
        ensure_config_dir()?;
        Self::open(get_db_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, snippets: &[Snippet]) -> Result<()> {
        let serialized = serde_json::to_string_pretty(snippets)?;
        write_atomic(&self.path, serialized.as_bytes())
    }

    /// Persist `next` and only then make it the in-memory collection.
    fn commit(&mut self, next: Vec<Snippet>) -> Result<()> {
        self.save(&next)?;
        self.snippets = next;
        Ok(())
    }

    fn position(&self, id: SnippetId) -> Option<usize> {
        self.snippets.iter().position(|entry| entry.id == id)
    }
}

/// Read the collection, falling back to an empty one when the file is unusable.
fn load_snippets(path: &Path) -> Vec<Snippet> {
    match read_snippets(path) {
        Ok(snippets) => snippets,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Snippet file unreadable, starting empty");
            vec![]
        }
    }
}

fn read_snippets(path: &Path) -> Result<Vec<Snippet>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    // Handle empty database file
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    serde_json::from_str(&content).map_err(|e| QuipError::CorruptState(e.to_string()))
}

fn by_recent_use(mut snippets: Vec<Snippet>) -> Vec<Snippet> {
    // Stable sort keeps insertion order for equal timestamps.
    snippets.sort_by(|a, b| b.last_used.cmp(&a.last_used));
    snippets
}

impl QueryStore for FileStore {
    fn list_all(&self) -> Result<Vec<Snippet>> {
        Ok(by_recent_use(self.snippets.clone()))
    }

    fn get(&self, id: SnippetId) -> Result<Option<Snippet>> {
        Ok(self.snippets.iter().find(|entry| entry.id == id).cloned())
    }

    fn list_by_category(&self, category: &str) -> Result<Vec<Snippet>> {
        let wanted = fold(category);
        let mut matches: Vec<Snippet> = self
            .snippets
            .iter()
            .filter(|entry| fold(&entry.category) == wanted)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            fold(&a.name)
                .cmp(&fold(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(matches)
    }

    fn search(&self, term: &str) -> Result<Vec<Snippet>> {
        if term.trim().is_empty() {
            return self.list_all();
        }

        let term = fold(term);
        let matches = self
            .snippets
            .iter()
            .filter(|entry| entry.matches(&term))
            .cloned()
            .collect();
        Ok(by_recent_use(matches))
    }

    fn add(&mut self, draft: SnippetDraft) -> Result<Snippet> {
        draft.validate()?;

        let snippet = draft.into_snippet(models::now());
        let mut next = self.snippets.clone();
        next.push(snippet.clone());
        self.commit(next)?;

        debug!(id = %snippet.id, name = %snippet.name, "Added snippet");
        Ok(snippet)
    }

    fn update(&mut self, id: SnippetId, fields: SnippetDraft) -> Result<()> {
        fields.validate()?;

        let index = self.position(id).ok_or(QuipError::NotFound(id))?;
        let mut next = self.snippets.clone();
        next[index].apply(fields);
        self.commit(next)?;

        debug!(%id, "Updated snippet");
        Ok(())
    }

    fn delete(&mut self, id: SnippetId) -> Result<()> {
        if self.position(id).is_none() {
            return Ok(());
        }

        let next = self
            .snippets
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect();
        self.commit(next)?;

        debug!(%id, "Deleted snippet");
        Ok(())
    }

    fn increment_usage(&mut self, id: SnippetId) -> Result<()> {
        let index = self.position(id).ok_or(QuipError::NotFound(id))?;
        let mut next = self.snippets.clone();
        next[index].record_use(models::now());
        self.commit(next)?;

        debug!(%id, usage = self.snippets[index].usage_count, "Recorded snippet use");
        Ok(())
    }

    fn import(&mut self, records: Vec<Snippet>, mode: ImportMode) -> Result<usize> {
        let records = prepare_import(records)?;
        let count = records.len();

        let mut next = match mode {
            ImportMode::Append => self.snippets.clone(),
            ImportMode::Replace => Vec::with_capacity(count),
        };
        next.extend(records);
        self.commit(next)?;

        info!(count, ?mode, "Imported snippets");
        Ok(count)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(name: &str, category: &str) -> SnippetDraft {
        SnippetDraft::new(name, format!("select '{}'", name), category)
    }

    #[test]
    fn missing_file_is_seeded_and_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");

        let store = FileStore::open(&path).unwrap();
        let seeded = store.list_all().unwrap();
        assert!(!seeded.is_empty());
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.list_all().unwrap(), seeded);
    }

    #[test]
    fn malformed_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.list_all().unwrap().is_empty());
        // The broken file is left alone until the next mutation.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ this is not json");
    }

    #[test]
    fn empty_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "  \n").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "[]").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        let kept = store.add(draft("kept", "Dev")).unwrap();
        let dropped = store.add(draft("dropped", "Dev")).unwrap();
        store.increment_usage(kept.id).unwrap();
        store
            .update(kept.id, draft("renamed", "Ops").with_description("now with text"))
            .unwrap();
        store.delete(dropped.id).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let all = reopened.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "renamed");
        assert_eq!(all[0].category, "Ops");
        assert_eq!(all[0].usage_count, 1);
        assert_eq!(all[0].description.as_deref(), Some("now with text"));
    }

    #[test]
    fn rejected_add_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "[]").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        let err = store.add(SnippetDraft::new("name", " ", "Dev"));
        assert!(matches!(err, Err(QuipError::Validation(_))));
        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn failed_write_keeps_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "[]").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        store.add(draft("one", "Dev")).unwrap();

        // A directory where the file should be makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.add(draft("two", "Dev")).is_err());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
