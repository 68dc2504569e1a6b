use crate::config::{ensure_config_dir, get_settings_file_path, write_atomic};
use crate::error::{QuipError, Result};
use crate::models::{fold, Category, DEFAULT_CATEGORY_COLOR};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_MODIFIERS: &str = "Control+Alt";
pub const DEFAULT_KEY: &str = "Q";

/// Which backend holds the snippet collection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    File,
    Relational,
}

/// The global shortcut as the user wrote it, e.g. `Control+Alt` and `Q`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HotkeySettings {
    pub modifiers: String,
    pub key: String,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            modifiers: DEFAULT_MODIFIERS.to_string(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub hotkey: HotkeySettings,
    pub storage: StorageMode,
    pub connection: Option<String>,
    pub categories: Vec<Category>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: HotkeySettings::default(),
            storage: StorageMode::File,
            connection: None,
            categories: starter_palette(),
        }
    }
}

fn starter_palette() -> Vec<Category> {
    vec![
        Category::new("DBA", "#2196F3"),
        Category::new("Dev", "#4CAF50"),
        Category::new("Reports", "#FF9800"),
        Category::new("Queries", "#9C27B0"),
    ]
}

impl Settings {
    pub fn find_category(&self, name: &str) -> Option<&Category> {
        let wanted = fold(name.trim());
        self.categories.iter().find(|c| fold(&c.name) == wanted)
    }

    /// Append a category to the palette. Names are unique ignoring case.
    pub fn add_category(&mut self, name: &str, color: &str) -> Result<&Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuipError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if self.find_category(name).is_some() {
            return Err(QuipError::Validation(format!(
                "category '{}' already exists",
                name
            )));
        }

        let color = match color.trim() {
            "" => DEFAULT_CATEGORY_COLOR,
            color => color,
        };
        self.categories.push(Category::new(name, color));
        Ok(&self.categories[self.categories.len() - 1])
    }

    /// Drop a category from the palette. Snippets filed under it are not touched.
    pub fn remove_category(&mut self, name: &str) -> bool {
        let wanted = fold(name.trim());
        let before = self.categories.len();
        self.categories.retain(|c| fold(&c.name) != wanted);
        self.categories.len() != before
    }
}

/// Loads the settings file once and writes it back on explicit saves.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load settings from `path`.
    ///
    /// A missing or unreadable file is replaced by the defaults, which are
    /// written back so the next start finds them.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let settings = match read_settings(&path) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!(path = %path.display(), "No settings found, writing defaults");
                write_defaults(&path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings unreadable, using defaults");
                write_defaults(&path)
            }
        };

        Self { path, settings }
    }

    pub fn open_default() -> Self {
        if let Err(e) = ensure_config_dir() {
            warn!(error = %e, "Could not create configuration directory");
        }
        Self::open(get_settings_file_path())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `settings`, replacing the file in one step.
    pub fn save(&mut self, settings: Settings) -> Result<()> {
        persist(&self.path, &settings)?;
        self.settings = settings;
        Ok(())
    }
}

fn read_settings(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(QuipError::CorruptState("settings file is empty".to_string()));
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| QuipError::CorruptState(e.to_string()))
}

fn write_defaults(path: &Path) -> Settings {
    let settings = Settings::default();
    if let Err(e) = persist(path, &settings) {
        warn!(path = %path.display(), error = %e, "Could not write default settings");
    }
    settings
}

fn persist(path: &Path, settings: &Settings) -> Result<()> {
    let serialized = serde_json::to_string_pretty(settings)?;
    write_atomic(path, serialized.as_bytes())
}
