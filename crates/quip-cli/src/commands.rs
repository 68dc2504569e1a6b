use crate::cli::Commands;
use crate::context::AppContext;
use crate::utils::{
    copy_to_clipboard, format_category_line, format_snippet_detail, print_snippets,
    RECENT_LIMIT,
};
use quip_core::{
    export_to, read_export, ImportMode, QuipError, Result, SnippetDraft, SnippetId,
};
use quip_hotkey::{parse_key, parse_modifiers, ActivationController, RdevBackend};
use std::io::{self, BufRead};
use std::time::Duration;
use tracing::{info, warn};

const LISTEN_POLL: Duration = Duration::from_millis(500);

pub fn handle_command(ctx: &mut AppContext, command: Option<Commands>) -> Result<()> {
    if let Some(notice) = ctx.notice.take() {
        eprintln!("{}", notice);
    }

    match command {
        Some(command) => handle_subcommand(ctx, command),
        None => show_recent(ctx), // Default: the launcher view
    }
}

fn handle_subcommand(ctx: &mut AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::List => ctx.store.list_all().map(|s| print_snippets(&s)),
        Commands::Show { id } => handle_show(ctx, &id),
        Commands::Search { term } => ctx.store.search(&term).map(|s| print_snippets(&s)),
        Commands::Category { name } => ctx
            .store
            .list_by_category(&name)
            .map(|s| print_snippets(&s)),
        Commands::Add {
            name,
            body,
            category,
            description,
        } => {
            let draft = SnippetDraft {
                name,
                body,
                category,
                description: description.filter(|d| !d.trim().is_empty()),
            };
            ctx.store
                .add(draft)
                .map(|s| println!("Snippet added successfully ({})", s.id))
        }
        Commands::Update {
            id,
            name,
            body,
            category,
            description,
        } => handle_update(ctx, &id, name, body, category, description),
        Commands::Delete { id } => ctx
            .store
            .delete(id.parse()?)
            .map(|_| println!("Snippet deleted successfully")),
        Commands::Use { id } => handle_use(ctx, &id),
        Commands::Export { path } => export_to(ctx.store.as_ref(), &path)
            .map(|n| println!("Exported {} snippets to {}", n, path.display())),
        Commands::Import { path, replace } => {
            let records = read_export(&path)?;
            let mode = if replace {
                ImportMode::Replace
            } else {
                ImportMode::Append
            };
            ctx.store
                .import(records, mode)
                .map(|n| println!("Imported {} snippets", n))
        }
        Commands::Categories => {
            for category in &ctx.settings.settings().categories {
                println!("{}", format_category_line(category));
            }
            Ok(())
        }
        Commands::CategoryAdd { name, color } => handle_category_add(ctx, &name, &color),
        Commands::CategoryRemove { name } => handle_category_remove(ctx, &name),
        Commands::Hotkey { modifiers, key } => handle_hotkey(ctx, &modifiers, &key),
        Commands::Listen => listen(ctx),
    }
}

fn show_recent(ctx: &AppContext) -> Result<()> {
    let snippets = ctx.store.list_all()?;
    let shown = snippets.len().min(RECENT_LIMIT);
    print_snippets(&snippets[..shown]);
    Ok(())
}

fn find(ctx: &AppContext, id: &str) -> Result<quip_core::Snippet> {
    let id: SnippetId = id.parse()?;
    ctx.store.get(id)?.ok_or(QuipError::NotFound(id))
}

fn handle_show(ctx: &AppContext, id: &str) -> Result<()> {
    let snippet = find(ctx, id)?;
    println!("{}", format_snippet_detail(&snippet));
    Ok(())
}

fn handle_update(
    ctx: &mut AppContext,
    id: &str,
    name: Option<String>,
    body: Option<String>,
    category: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let current = find(ctx, id)?;
    let fields = SnippetDraft {
        name: name.unwrap_or(current.name),
        body: body.unwrap_or(current.body),
        category: category.unwrap_or(current.category),
        // An explicit empty description clears it.
        description: match description {
            Some(d) if d.trim().is_empty() => None,
            Some(d) => Some(d),
            None => current.description,
        },
    };

    ctx.store
        .update(current.id, fields)
        .map(|_| println!("Snippet updated successfully"))
}

fn handle_use(ctx: &mut AppContext, id: &str) -> Result<()> {
    let snippet = find(ctx, id)?;

    match copy_to_clipboard(&snippet.body) {
        Ok(()) => println!("Copied '{}' to the clipboard", snippet.name),
        Err(e) => {
            warn!(error = %e, "Clipboard copy failed");
            println!("{}", snippet.body);
        }
    }

    ctx.store.increment_usage(snippet.id)
}

fn handle_category_add(ctx: &mut AppContext, name: &str, color: &str) -> Result<()> {
    let mut settings = ctx.settings.settings().clone();
    let added = settings.add_category(name, color)?.clone();
    ctx.settings.save(settings)?;
    println!("Category added: {}", format_category_line(&added));
    Ok(())
}

fn handle_category_remove(ctx: &mut AppContext, name: &str) -> Result<()> {
    let mut settings = ctx.settings.settings().clone();
    if !settings.remove_category(name) {
        println!("No category named '{}'", name);
        return Ok(());
    }
    ctx.settings.save(settings)?;
    println!("Category removed: {}", name);
    Ok(())
}

fn handle_hotkey(ctx: &mut AppContext, modifiers: &str, key: &str) -> Result<()> {
    let parsed = parse_modifiers(modifiers);
    if parsed.is_empty() {
        return Err(QuipError::InvalidBinding(format!(
            "'{}' contains no known modifier",
            modifiers
        )));
    }
    let key = parse_key(key);

    let mut settings = ctx.settings.settings().clone();
    settings.hotkey.modifiers = parsed.to_string();
    settings.hotkey.key = key.to_string();
    ctx.settings.save(settings)?;

    println!("Hotkey set to {}+{}", parsed, key);
    Ok(())
}

/// Register the configured hotkey and print the most recent snippets each
/// time it brings quip up. Runs until interrupted.
fn listen(ctx: &mut AppContext) -> Result<()> {
    let hotkey = ctx.settings.settings().hotkey.clone();
    let mut controller = ActivationController::new(RdevBackend::new());
    controller.on_activate(|visible| {
        if !visible {
            println!("(hidden)");
        }
    });

    if let Err(e) = controller.register_tokens(&hotkey.modifiers, &hotkey.key) {
        warn!(error = %e, "Global hotkey unavailable, continuing without it");
        eprintln!(
            "Could not register {}+{}: {}. Pick another with `quip hotkey`.",
            hotkey.modifiers, hotkey.key, e
        );
        return listen_without_hotkey(ctx);
    }

    if let Some(binding) = controller.binding() {
        info!(%binding, "Listening for hotkey");
        println!("Press {} to show quip. Ctrl+C to quit.", binding);
    }

    loop {
        if controller.wait(LISTEN_POLL) > 0 && controller.is_visible() {
            show_recent(ctx)?;
        }
    }
}

/// Fallback when no shortcut could be bound: Enter shows the recent snippets.
fn listen_without_hotkey(ctx: &AppContext) -> Result<()> {
    println!("Press Enter to show quip. Ctrl+D to quit.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        line?;
        show_recent(ctx)?;
    }
    Ok(())
}
