use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mdpath::config::{load_from_path, load_or_default, EngineConfig, StoreKind, DEFAULT_CONFIG_FILE};
use mdpath::{suggest_paths, DocEdit, DocError, EditOp, Engine, FileStore, Revision, Selector};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Exit status for a lost optimistic-lock race.
const EXIT_CONFLICT: i32 = 2;

#[derive(Parser)]
#[command(name = "mdpath")]
#[command(about = "Read and edit Markdown sections by semantic path", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./mdpath.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document root, overriding the configured file store root
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text addressed by a selector, e.g. `guide/install`, `guide#bash`, `@0..10`
    Read {
        /// Document id (path relative to the root)
        id: String,

        /// Selector; `*` prints the whole index
        selector: Selector,

        /// Print the slice, span and revision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every indexed path with its byte span
    Index {
        /// Document id (path relative to the root)
        id: String,

        /// Print the index as JSON
        #[arg(long)]
        json: bool,
    },

    /// Insert, replace or delete the region addressed by a selector
    Apply {
        /// Document id (path relative to the root)
        id: String,

        /// Selector of the region to edit
        selector: Selector,

        /// Operation: insert, replace or delete
        #[arg(long)]
        op: EditOp,

        /// Replacement text
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Read replacement text from a file
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Revision returned by a previous read
        #[arg(long)]
        rev: String,

        /// Show the patch of the committed change
        #[arg(short, long)]
        diff: bool,
    },

    /// List Markdown documents under the root
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config, cli.root)?;

    match cli.command {
        Commands::Read { id, selector, json } => cmd_read(&config, &id, &selector, json).await,
        Commands::Index { id, json } => cmd_index(&config, &id, json).await,
        Commands::Apply {
            id,
            selector,
            op,
            text,
            text_file,
            rev,
            diff,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                (None, None) => None,
            };
            let edit = DocEdit { op, selector, text };
            cmd_apply(&config, &id, &edit, &Revision::new(rev), diff).await
        }
        Commands::List => cmd_list(&config),
    }
}

/// Config resolution: explicit `--config`, then ./mdpath.toml, then defaults.
/// `--root` always wins and selects a file store.
fn load_config(path: Option<PathBuf>, root: Option<PathBuf>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => load_from_path(&path)?,
        None => load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    if let Some(root) = root {
        config.store.kind = StoreKind::File;
        config.store.root = Some(root);
    }
    Ok(config)
}

async fn cmd_read(config: &EngineConfig, id: &str, selector: &Selector, json: bool) -> Result<()> {
    let engine = config.build_engine()?;

    let slice = match engine.read(id, selector).await {
        Ok(slice) => slice,
        Err(DocError::SelectorMiss(path)) => {
            eprintln!("{} no section at '{}'", "✗".red(), path);
            print_suggestions(&engine, id, selector).await;
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&slice)?);
    } else {
        print!("{}", slice.text);
        if !slice.text.ends_with('\n') {
            println!();
        }
        eprintln!(
            "{}",
            format!("span {} revision {}", slice.span, slice.revision).dimmed()
        );
    }
    Ok(())
}

async fn print_suggestions(engine: &Engine, id: &str, selector: &Selector) {
    let Ok(index) = engine.index(id).await else {
        return;
    };
    let suggestions = suggest_paths(&index, &selector.path, 3);
    if suggestions.is_empty() {
        eprintln!("  Run `mdpath index {id}` to see available paths");
        return;
    }
    eprintln!("  Did you mean:");
    for path in suggestions {
        eprintln!("    - {}", path.to_string().cyan());
    }
}

async fn cmd_index(config: &EngineConfig, id: &str, json: bool) -> Result<()> {
    let engine = config.build_engine()?;
    let index = engine.index(id).await?;

    if json {
        println!("{}", index.to_json()?);
        return Ok(());
    }

    if index.is_empty() {
        println!("{}", "No indexed sections".yellow());
        return Ok(());
    }

    let width = index.paths().map(|p| p.joined().len()).max().unwrap_or(0);
    for (path, span) in index.iter() {
        let indent = "  ".repeat(path.len().saturating_sub(1));
        let label = format!("{indent}{path}");
        println!(
            "{:<width$}  {}",
            label,
            span.to_string().dimmed(),
            width = width + indent.len()
        );
    }
    Ok(())
}

async fn cmd_apply(
    config: &EngineConfig,
    id: &str,
    edit: &DocEdit,
    expected: &Revision,
    show_diff: bool,
) -> Result<()> {
    let engine = config.build_engine()?;

    match engine.apply(id, edit, expected).await {
        Ok(envelope) => {
            println!(
                "{} {} {} in {}",
                "✓".green(),
                edit.op,
                edit.selector,
                envelope.doc_id
            );
            println!("Revision: {} -> {}", envelope.base_revision, envelope.new_revision);
            if show_diff {
                display_patch(&envelope.patch);
            }
            Ok(())
        }
        Err(DocError::RevisionConflict { current }) => {
            eprintln!("{} {}: revision conflict", "✗".red(), id);
            eprintln!("  Expected: {}", expected);
            eprintln!("  Current:  {}", current.to_string().yellow());
            eprintln!("  Action: re-read the document and resubmit against the current revision");
            std::process::exit(EXIT_CONFLICT);
        }
        Err(e) => {
            eprintln!("{} {}: {}", "✗".red(), id, e);
            if let DocError::SelectorMiss(_) = e {
                print_suggestions(&engine, id, &edit.selector).await;
            }
            std::process::exit(1);
        }
    }
}

/// Helper: colorize a patch produced by the engine
fn display_patch(patch: &str) {
    for line in patch.lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.dimmed()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with('+') {
            line.green()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}

fn cmd_list(config: &EngineConfig) -> Result<()> {
    if config.store.kind != StoreKind::File {
        anyhow::bail!("list requires a file store (set [store] kind = \"file\")");
    }
    let store = FileStore::new(config.store.root_or_cwd())?;

    let mut ids = Vec::new();
    for entry in WalkDir::new(store.root()).follow_links(false) {
        let entry = entry?;
        let is_markdown = matches!(
            entry.path().extension().and_then(|s| s.to_str()),
            Some("md" | "markdown")
        );
        if entry.file_type().is_file() && is_markdown {
            if let Some(id) = store.guard().id_for(entry.path()) {
                ids.push(id);
            }
        }
    }
    ids.sort();

    if ids.is_empty() {
        println!("{}", "No Markdown documents found".yellow());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
