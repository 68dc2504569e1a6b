//! Quip core: snippet storage, search and settings.
//!
//! Snippets live in one of two backends behind the [`QueryStore`] trait: a JSON
//! file held in memory ([`FileStore`]) or an SQLite table ([`SqliteStore`]).
//! Both answer every query the same way.

pub mod config;
pub mod error;
pub mod models;
pub mod settings;
pub mod store;
pub mod transfer;

// Re-export common items for convenience
pub use config::{ensure_config_dir, get_config_dir};
pub use error::{QuipError, Result};
pub use models::{Category, Snippet, SnippetDraft, SnippetId};
pub use settings::{HotkeySettings, Settings, SettingsStore, StorageMode};
pub use store::{FileStore, ImportMode, QueryStore, SqliteStore};
pub use transfer::{export_to, read_export};
