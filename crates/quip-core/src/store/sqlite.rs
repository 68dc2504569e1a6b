use crate::config::{ensure_config_dir, get_sqlite_file_path};
use crate::error::{QuipError, Result};
use crate::models::{self, fold, Snippet, SnippetDraft, SnippetId};
use crate::store::{prepare_import, seed, ImportMode, QueryStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OpenFlags, Row, Transaction, TransactionBehavior,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How long a statement waits on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TABLE: &str = "snippets";

const COLUMNS: &str =
    "id, name, body, category, description, created_at, last_used, usage_count";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS snippets (
    id TEXT PRIMARY KEY NOT NULL,
    seq INTEGER NOT NULL,
    name TEXT NOT NULL,
    body TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL,
    last_used TEXT NOT NULL,
    usage_count INTEGER NOT NULL DEFAULT 0
)";

const INSERT: &str = "INSERT INTO snippets
    (id, seq, name, body, category, description, created_at, last_used, usage_count)
    VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM snippets), ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Snippet store backed by a single SQLite table.
///
/// Nothing is cached: every call is one statement against the database, so
/// other clients may read the same file while the store is open.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Connect to the database at `path`, creating and seeding the table on first use.
    ///
    /// Any failure here is reported as [`QuipError::StorageUnavailable`] so the
    /// caller can fall back to another backend.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let unavailable =
            |e: rusqlite::Error| QuipError::StorageUnavailable(format!("{}: {}", path.display(), e));

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let mut conn = Connection::open_with_flags(&path, flags).map_err(unavailable)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        register_fold(&conn).map_err(unavailable)?;

        if ensure_schema(&mut conn).map_err(unavailable)? {
            info!(path = %path.display(), "Created snippet table with examples");
        }

        Ok(Self { conn, path })
    }

    /// Open the database named by a connection descriptor, or the default one.
    ///
    /// Descriptors are SQLite paths or `file:` URIs; a leading `sqlite:` is stripped.
    pub fn connect(descriptor: Option<&str>) -> Result<Self> {
        match descriptor.map(str::trim).filter(|d| !d.is_empty()) {
            Some(descriptor) => Self::open(descriptor_path(descriptor)),
            None => {
                ensure_config_dir()?;
                Self::open(get_sqlite_file_path())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Snippet>> {
        let mut stmt = self.conn.prepare(sql).map_err(db_error)?;
        let rows = stmt.query_map(params, map_snippet).map_err(db_error)?;
        let snippets = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error)?;
        Ok(snippets)
    }
}

fn descriptor_path(descriptor: &str) -> PathBuf {
    let trimmed = descriptor
        .strip_prefix("sqlite://")
        .or_else(|| descriptor.strip_prefix("sqlite:"))
        .unwrap_or(descriptor);
    PathBuf::from(trimmed)
}

fn register_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "quip_fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| fold(&t)))
        },
    )
}

/// Create and seed the table if it is missing. Returns true when it had to be created.
///
/// The check runs under a write lock, so concurrent first opens seed once.
fn ensure_schema(conn: &mut Connection) -> rusqlite::Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [TABLE],
        |row| row.get(0),
    )?;
    if exists {
        tx.commit()?;
        return Ok(false);
    }

    tx.execute(CREATE_TABLE, [])?;
    for snippet in seed::sample_snippets(models::now()) {
        insert(&tx, &snippet)?;
    }
    tx.commit()?;
    Ok(true)
}

fn insert(tx: &Transaction<'_>, snippet: &Snippet) -> rusqlite::Result<usize> {
    let usage = i64::try_from(snippet.usage_count)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    tx.execute(
        INSERT,
        params![
            snippet.id.to_string(),
            snippet.name,
            snippet.body,
            snippet.category,
            snippet.description,
            timestamp(&snippet.created_at),
            timestamp(&snippet.last_used),
            usage,
        ],
    )
}

/// Fixed-width UTC text, so string order in SQL matches time order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_snippet(row: &Row<'_>) -> rusqlite::Result<Snippet> {
    let id: String = row.get(0)?;
    let usage: i64 = row.get(7)?;
    Ok(Snippet {
        id: id
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        name: row.get(1)?,
        body: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        last_used: parse_timestamp(row, 6)?,
        usage_count: u64::try_from(usage).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Integer, Box::new(e))
        })?,
    })
}

fn parse_timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// A database that stays locked past the busy timeout is reported as unavailable.
fn db_error(err: rusqlite::Error) -> QuipError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            QuipError::StorageUnavailable(format!("database busy: {}", err))
        }
        _ => QuipError::Sqlite(err),
    }
}

impl QueryStore for SqliteStore {
    fn list_all(&self) -> Result<Vec<Snippet>> {
        self.query(
            &format!("SELECT {} FROM snippets ORDER BY last_used DESC, seq ASC", COLUMNS),
            [],
        )
    }

    fn get(&self, id: SnippetId) -> Result<Option<Snippet>> {
        let mut found = self.query(
            &format!("SELECT {} FROM snippets WHERE id = ?1", COLUMNS),
            [id.to_string()],
        )?;
        Ok(found.pop())
    }

    fn list_by_category(&self, category: &str) -> Result<Vec<Snippet>> {
        self.query(
            &format!(
                "SELECT {} FROM snippets WHERE quip_fold(category) = ?1
                 ORDER BY quip_fold(name) ASC, name ASC, seq ASC",
                COLUMNS
            ),
            [fold(category)],
        )
    }

    fn search(&self, term: &str) -> Result<Vec<Snippet>> {
        if term.trim().is_empty() {
            return self.list_all();
        }

        self.query(
            &format!(
                "SELECT {} FROM snippets
                 WHERE instr(quip_fold(name), ?1) > 0
                    OR instr(quip_fold(body), ?1) > 0
                    OR instr(quip_fold(description), ?1) > 0
                    OR instr(quip_fold(category), ?1) > 0
                 ORDER BY last_used DESC, seq ASC",
                COLUMNS
            ),
            [fold(term)],
        )
    }

    fn add(&mut self, draft: SnippetDraft) -> Result<Snippet> {
        draft.validate()?;

        let snippet = draft.into_snippet(models::now());
        let tx = self.conn.transaction().map_err(db_error)?;
        insert(&tx, &snippet).map_err(db_error)?;
        tx.commit().map_err(db_error)?;

        debug!(id = %snippet.id, name = %snippet.name, "Added snippet");
        Ok(snippet)
    }

    fn update(&mut self, id: SnippetId, fields: SnippetDraft) -> Result<()> {
        fields.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE snippets SET name = ?2, body = ?3, category = ?4, description = ?5
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    fields.name,
                    fields.body,
                    fields.category,
                    fields.description
                ],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(QuipError::NotFound(id));
        }

        debug!(%id, "Updated snippet");
        Ok(())
    }

    fn delete(&mut self, id: SnippetId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM snippets WHERE id = ?1", [id.to_string()])
            .map_err(db_error)?;
        if removed > 0 {
            debug!(%id, "Deleted snippet");
        }
        Ok(())
    }

    fn increment_usage(&mut self, id: SnippetId) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE snippets
                 SET usage_count = MIN(usage_count, ?3) + 1, last_used = MAX(last_used, ?2)
                 WHERE id = ?1",
                params![id.to_string(), timestamp(&models::now()), i64::MAX - 1],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(QuipError::NotFound(id));
        }

        debug!(%id, "Recorded snippet use");
        Ok(())
    }

    fn import(&mut self, records: Vec<Snippet>, mode: ImportMode) -> Result<usize> {
        let records = prepare_import(records)?;

        let tx = self.conn.transaction().map_err(db_error)?;
        if mode == ImportMode::Replace {
            tx.execute("DELETE FROM snippets", []).map_err(db_error)?;
        }
        for record in &records {
            insert(&tx, record).map_err(db_error)?;
        }
        tx.commit().map_err(db_error)?;

        info!(count = records.len(), ?mode, "Imported snippets");
        Ok(records.len())
    }

    fn backend_name(&self) -> &'static str {
        "relational"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_open_creates_and_seeds_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quip.db");

        let mut store = SqliteStore::open(&path).unwrap();
        let seeded = store.list_all().unwrap();
        assert_eq!(seeded.len(), seed::sample_snippets(models::now()).len());

        for snippet in &seeded {
            store.delete(snippet.id).unwrap();
        }
        drop(store);

        // The table exists now, so reopening must not seed again.
        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.list_all().unwrap().is_empty());
    }

    #[test]
    fn unreachable_database_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("dir").join("quip.db");

        let result = SqliteStore::open(&path);
        assert!(matches!(result, Err(QuipError::StorageUnavailable(_))));
    }

    #[test]
    fn connect_strips_descriptor_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quip.db");

        let store = SqliteStore::connect(Some(&format!("sqlite:{}", path.display()))).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::open(dir.path().join("quip.db")).unwrap();
        store.import(vec![], ImportMode::Replace).unwrap();
        store.add(SnippetDraft::new("percent", "SELECT 100%", "Dev")).unwrap();
        store.add(SnippetDraft::new("plain", "SELECT 100", "Dev")).unwrap();

        let hits = store.search("0%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "percent");
        assert_eq!(store.search("_").unwrap().len(), 0);
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::open(dir.path().join("quip.db")).unwrap();
        store
            .add(SnippetDraft::new("Usuários Ativos", "SELECT 1", "DBA"))
            .unwrap();

        let hits = store.search("USUÁRIOS").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::open(dir.path().join("quip.db")).unwrap();
        let id = SnippetId::new();

        assert!(matches!(store.increment_usage(id), Err(QuipError::NotFound(x)) if x == id));
        assert!(matches!(
            store.update(id, SnippetDraft::new("a", "b", "c")),
            Err(QuipError::NotFound(_))
        ));
        assert!(store.delete(id).is_ok());
        assert!(store.get(id).unwrap().is_none());
    }

    #[test]
    fn concurrent_first_opens_seed_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quip.db");

        let openers: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || SqliteStore::open(path).map(|_| ()))
            })
            .collect();
        for opener in openers {
            opener.join().unwrap().unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.list_all().unwrap().len(),
            seed::sample_snippets(models::now()).len()
        );
    }
}
