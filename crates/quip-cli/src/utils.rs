use arboard::Clipboard;
use quip_core::{Category, QuipError, Result, Snippet};

/// How many snippets the launcher view shows.
pub const RECENT_LIMIT: usize = 10;

const NAME_WIDTH: usize = 32;

/// One line per snippet: id, name, category and when it was last used.
pub fn format_snippet_line(snippet: &Snippet) -> String {
    format!(
        "{}  {:<width$}  {:<12}  {}",
        snippet.id,
        truncate(&snippet.name, NAME_WIDTH),
        snippet.category,
        snippet.formatted_time(),
        width = NAME_WIDTH
    )
}

pub fn format_snippet_detail(snippet: &Snippet) -> String {
    let mut out = String::new();
    out.push_str(&format!("Name:        {}\n", snippet.name));
    out.push_str(&format!("Id:          {}\n", snippet.id));
    out.push_str(&format!("Category:    {}\n", snippet.category));
    if let Some(description) = snippet.description.as_deref() {
        out.push_str(&format!("Description: {}\n", description));
    }
    out.push_str(&format!(
        "Used:        {} times, last {}\n",
        snippet.usage_count,
        snippet.formatted_time()
    ));
    out.push_str(&format!(
        "Created:     {}\n",
        snippet.created_at.format("%Y-%m-%d %H:%M")
    ));
    out.push('\n');
    out.push_str(&snippet.body);
    out
}

pub fn format_category_line(category: &Category) -> String {
    format!("{:<16} {}", category.name, category.color)
}

pub fn print_snippets(snippets: &[Snippet]) {
    if snippets.is_empty() {
        println!("No snippets found.");
        return;
    }
    for snippet in snippets {
        println!("{}", format_snippet_line(snippet));
    }
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()
        .map_err(|e| QuipError::Other(format!("Clipboard unavailable: {}", e)))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| QuipError::Other(format!("Failed to copy to clipboard: {}", e)))
}

fn truncate(text: &str, width: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= width {
        return first_line.to_string();
    }
    let mut cut: String = first_line.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}
