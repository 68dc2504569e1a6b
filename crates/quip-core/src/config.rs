use crate::error::Result;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const HOME_ENV: &str = "QUIP_HOME";
pub const DB_FILENAME: &str = "snippets.json";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const SQLITE_FILENAME: &str = "quip.db";

/// Get the quip configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".quip"))
        .unwrap_or_else(|_| PathBuf::from(".quip"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }
    Ok(config_dir)
}

/// Get the path to the snippet collection file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Get the path to the settings file
pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILENAME)
}

/// Database used by the relational backend when no connection is configured
pub fn get_sqlite_file_path() -> PathBuf {
    get_config_dir().join(SQLITE_FILENAME)
}

/// Replace `path` with `data` so that readers see the old or the new content, never a mix.
///
/// The data goes to a temporary file in the same directory, is flushed to disk
/// and then renamed over the target.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
