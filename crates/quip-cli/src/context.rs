use quip_core::config::get_db_file_path;
use quip_core::{
    FileStore, QueryStore, Result, Settings, SettingsStore, SqliteStore, StorageMode,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything a command needs, built once at startup.
pub struct AppContext {
    pub settings: SettingsStore,
    pub store: Box<dyn QueryStore>,
    /// A non-fatal problem the user should hear about, e.g. a backend fallback.
    pub notice: Option<String>,
}

impl AppContext {
    /// Load settings and the configured backend from the quip directory.
    pub fn load() -> Result<Self> {
        Self::with_settings(SettingsStore::open_default(), get_db_file_path())
    }

    /// Build a context from already loaded settings. `file_path` is used by the
    /// file backend, including when the relational one cannot be opened.
    pub fn with_settings(settings: SettingsStore, file_path: PathBuf) -> Result<Self> {
        let (store, notice) = open_store(settings.settings(), file_path)?;
        info!(backend = store.backend_name(), "Snippet store ready");
        Ok(Self {
            settings,
            store,
            notice,
        })
    }
}

/// Open the backend chosen in `settings`, falling back to the file backend
/// when the database is unavailable.
pub fn open_store(
    settings: &Settings,
    file_path: PathBuf,
) -> Result<(Box<dyn QueryStore>, Option<String>)> {
    let mut notice = None;

    if settings.storage == StorageMode::Relational {
        match SqliteStore::connect(settings.connection.as_deref()) {
            Ok(store) => return Ok((Box::new(store), None)),
            Err(e) => {
                warn!(error = %e, "Database unavailable, falling back to file storage");
                notice = Some(format!(
                    "Could not open the snippet database ({}). Using file storage instead.",
                    e
                ));
            }
        }
    }

    let store = FileStore::open(file_path)?;
    Ok((Box::new(store), notice))
}
