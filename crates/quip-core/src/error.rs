use crate::models::SnippetId;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuipError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid snippet: {0}")]
    Validation(String),

    #[error("Snippet not found: {0}")]
    NotFound(SnippetId),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Corrupt data: {0}")]
    CorruptState(String),

    #[error("Hotkey already in use: {0}")]
    HotkeyConflict(String),

    #[error("Invalid hotkey binding: {0}")]
    InvalidBinding(String),

    #[error("Keyboard error: {0}")]
    Keyboard(String),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuipError>;
