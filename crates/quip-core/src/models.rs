use crate::error::{QuipError, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque snippet identifier, assigned by the store on insert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SnippetId(Uuid);

impl SnippetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SnippetId {
    type Err = QuipError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| QuipError::Other(format!("Invalid snippet id '{}': {}", s, e)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snippet {
    pub id: SnippetId,
    pub name: String,
    pub body: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: u64,
}

/// The user-editable part of a snippet, used for both add and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetDraft {
    pub name: String,
    pub body: String,
    pub category: String,
    pub description: Option<String>,
}

impl SnippetDraft {
    pub fn new(
        name: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            category: category.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject drafts with a blank name, body or category.
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.body, &self.category)
    }

    /// Build a fresh snippet with zero usage, both timestamps set to `now`.
    pub fn into_snippet(self, now: DateTime<Utc>) -> Snippet {
        Snippet {
            id: SnippetId::new(),
            name: self.name,
            body: self.body,
            category: self.category,
            description: self.description,
            created_at: now,
            last_used: now,
            usage_count: 0,
        }
    }
}

impl Snippet {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.body, &self.category)
    }

    /// Overwrite the editable fields; timestamps and usage are left alone.
    pub fn apply(&mut self, fields: SnippetDraft) {
        self.name = fields.name;
        self.body = fields.body;
        self.category = fields.category;
        self.description = fields.description;
    }

    /// Count one more use. The count stops at [`MAX_USAGE_COUNT`].
    pub fn record_use(&mut self, now: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1).min(MAX_USAGE_COUNT);
        if now > self.last_used {
            self.last_used = now;
        }
    }

    /// Substring match on name, body, description or category. `term` must already be folded.
    pub fn matches(&self, term: &str) -> bool {
        fold(&self.name).contains(term)
            || fold(&self.body).contains(term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| fold(d).contains(term))
            || fold(&self.category).contains(term)
    }

    pub fn formatted_time(&self) -> String {
        let duration = Utc::now().signed_duration_since(self.last_used);

        if duration.num_seconds() < 60 {
            format!("{}s ago", duration.num_seconds().max(0))
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            format!("{}d ago", duration.num_days())
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    #[serde(default = "default_category_color")]
    pub color: String,
}

pub const DEFAULT_CATEGORY_COLOR: &str = "#667EEA";

fn default_category_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Largest usage count every backend can store (SQLite integers are signed).
pub const MAX_USAGE_COUNT: u64 = i64::MAX as u64;

/// Current time at the precision every backend can store.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Case folding shared by every backend's search and category lookup.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn validate_fields(name: &str, body: &str, category: &str) -> Result<()> {
    for (field, value) in [("name", name), ("body", body), ("category", category)] {
        if value.trim().is_empty() {
            return Err(QuipError::Validation(format!("{} must not be empty", field)));
        }
    }
    Ok(())
}
