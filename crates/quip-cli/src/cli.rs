use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "bahdotsh",
    version = env!("CARGO_PKG_VERSION"),
    about = "quip - A personal stash of reusable queries and snippets",
    long_about = "quip keeps named snippets organised by category, finds them by full-text search and pops up on a global hotkey."
)]
pub struct Quip {
    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all snippets, most recently used first
    List,
    /// Show one snippet in full
    Show {
        #[clap(help = "Id of the snippet")]
        id: String,
    },
    /// Search names, bodies, descriptions and categories
    Search {
        #[clap(help = "Text to look for (case-insensitive)")]
        term: String,
    },
    /// List the snippets filed under a category
    Category {
        #[clap(help = "Category name (case-insensitive)")]
        name: String,
    },
    /// Add a new snippet
    Add {
        #[clap(long, short = 'n', help = "Name of the snippet")]
        name: String,

        #[clap(long, short = 'b', help = "The snippet text")]
        body: String,

        #[clap(long, short = 'c', help = "Category to file it under")]
        category: String,

        #[clap(long, short = 'd', help = "Optional description")]
        description: Option<String>,
    },
    /// Update an existing snippet; omitted fields keep their value
    Update {
        #[clap(help = "Id of the snippet to update")]
        id: String,

        #[clap(long, short = 'n', help = "New name")]
        name: Option<String>,

        #[clap(long, short = 'b', help = "New snippet text")]
        body: Option<String>,

        #[clap(long, short = 'c', help = "New category")]
        category: Option<String>,

        #[clap(long, short = 'd', help = "New description (empty to clear)")]
        description: Option<String>,
    },
    /// Delete a snippet
    Delete {
        #[clap(help = "Id of the snippet to delete")]
        id: String,
    },
    /// Copy a snippet to the clipboard and record the use
    Use {
        #[clap(help = "Id of the snippet to use")]
        id: String,
    },
    /// Export every snippet to a JSON file
    Export {
        #[clap(help = "File to write")]
        path: PathBuf,
    },
    /// Import snippets from a JSON export
    Import {
        #[clap(help = "File to read")]
        path: PathBuf,

        #[clap(long, help = "Replace the whole collection instead of appending")]
        replace: bool,
    },
    /// Show the category palette
    Categories,
    /// Add a category to the palette
    CategoryAdd {
        #[clap(help = "Category name")]
        name: String,

        #[clap(long, default_value = "", help = "Display color, e.g. #2196F3")]
        color: String,
    },
    /// Remove a category from the palette (snippets keep their category)
    CategoryRemove {
        #[clap(help = "Category name")]
        name: String,
    },
    /// Change the global hotkey
    Hotkey {
        #[clap(help = "Modifiers joined by '+', e.g. Control+Alt")]
        modifiers: String,

        #[clap(help = "Key name, e.g. Q or F9")]
        key: String,
    },
    /// Wait for the global hotkey and show recent snippets when it fires
    Listen,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Quip::command().debug_assert();
    }

    #[test]
    fn import_defaults_to_append() {
        let args = Quip::try_parse_from(["quip", "import", "backup.json"]).unwrap();
        match args.commands {
            Some(Commands::Import { path, replace }) => {
                assert_eq!(path, PathBuf::from("backup.json"));
                assert!(!replace);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn update_fields_are_optional() {
        let args = Quip::try_parse_from(["quip", "update", "abc", "--body", "SELECT 2;"]).unwrap();
        match args.commands {
            Some(Commands::Update { id, name, body, .. }) => {
                assert_eq!(id, "abc");
                assert_eq!(name, None);
                assert_eq!(body.as_deref(), Some("SELECT 2;"));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn palette_commands_use_kebab_case() {
        let args = Quip::try_parse_from(["quip", "category-add", "Ops", "--color", "#123456"]).unwrap();
        assert!(matches!(args.commands, Some(Commands::CategoryAdd { .. })));
        assert!(Quip::try_parse_from(["quip", "categoryadd", "Ops"]).is_err());
    }
}
