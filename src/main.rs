//! fz-cmd - command suggestions for fzf
//!
//! Merges curated commands, shell aliases, shell functions, shell history and
//! tldr pages into one deduplicated list, ranked by source priority and by
//! what the user picked recently.
//!
//! # Pipeline
//! load collections -> merge (one entry per command, best source wins)
//! -> limit per source -> rank by recency -> format fzf lines
//!
//! # Output (via stdout)
//! One tab-separated line per command:
//! `display \t command \t description \t tags \t examples`
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

mod adapters;
mod config;
mod entry;
mod error;
mod format;
mod limit;
mod loader;
mod merge;
mod preview;
mod recent;

use clap::{Args, Parser, Subcommand};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::adapters::{Collection, DEFAULT_HISTORY_MAX};
use crate::config::Config;
use crate::entry::{Entry, Source};
use crate::error::FzCmdError;
use crate::format::Payload;
use crate::limit::Limits;
use crate::loader::SourceInput;
use crate::preview::PreviewStyle;
use crate::recent::RecentStore;

/// Exit code for configuration and argument errors
const EXIT_USAGE: i32 = 2;

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fz-cmd", version, about = "Command suggestions for fzf")]
struct Cli {
    /// Config file (default: <config_dir>/fz-cmd/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the merged, ranked list as fzf lines
    List(ListArgs),

    /// Render the preview for one fzf line (or its five fields)
    Preview(PreviewArgs),

    /// Record a selected fzf line and print its command
    Select(LineArgs),

    /// Inspect or edit the recently used commands
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },

    /// Convert an `fc -l` listing on stdin into a history collection
    History {
        /// Maximum entries to keep
        #[arg(long, default_value_t = DEFAULT_HISTORY_MAX)]
        max: usize,
    },

    /// Convert `alias` output on stdin into an alias collection
    Aliases,

    /// Convert a function-name listing on stdin into a function collection
    Functions,

    /// Convert the curated YAML catalog into a curated collection
    Curated {
        /// Catalog file (default: <config_dir>/fz-cmd/commands.yaml)
        path: Option<PathBuf>,
    },

    /// Convert the tldr YAML cache into a tldr collection
    Tldr {
        /// Cache file (default: <cache_dir>/tldr-commands.yaml)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Collection to load; repeatable (default: every source in the cache dir)
    #[arg(long = "input", value_name = "SOURCE=PATH")]
    inputs: Vec<String>,

    /// Per-source cap, e.g. history:50; repeatable
    #[arg(long = "limit", value_name = "SOURCE:COUNT")]
    limits: Vec<String>,

    /// Recency record to rank by
    #[arg(long)]
    recent_file: Option<PathBuf>,

    /// Skip recency ranking
    #[arg(long)]
    no_recent: bool,
}

#[derive(Args, Debug)]
struct LineArgs {
    /// fzf line (read from stdin when omitted)
    line: Option<String>,

    /// Recency record to update
    #[arg(long)]
    recent_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Whole fzf line, or its fields as separate arguments (`{1} {2} {3} {4} {5}`);
    /// read from stdin when omitted
    #[arg(num_args = 0..=5)]
    fields: Vec<String>,

    /// Disable colors
    #[arg(long)]
    plain: bool,
}

#[derive(Subcommand, Debug)]
enum RecentAction {
    /// Record a command as just used (read from stdin when omitted)
    Record { command: Vec<String> },

    /// Print recent commands, most recent first
    List,

    /// Forget all recent commands
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        if e.is_broken_pipe() {
            // fzf closed its input early
            return;
        }
        error!("Error: {}", e);
        eprintln!("fz-cmd: {}", e);
        std::process::exit(EXIT_USAGE);
    }
}

fn run(cli: Cli) -> Result<(), FzCmdError> {
    let config = Config::load(cli.config.as_deref())?;
    debug!("Using cache dir {:?}", config.cache_dir);

    match cli.command {
        Commands::List(args) => run_list(&config, args),
        Commands::Preview(args) => run_preview(args),
        Commands::Select(args) => run_select(&config, args),
        Commands::Recent { action } => run_recent(&config, action),
        Commands::History { max } => {
            let listing = read_stdin()?;
            print_collection(&adapters::history_entries(&listing, max))
        }
        Commands::Aliases => {
            let listing = read_stdin()?;
            print_collection(&adapters::alias_entries(&listing))
        }
        Commands::Functions => {
            let listing = read_stdin()?;
            print_collection(&adapters::function_entries(&listing))
        }
        Commands::Curated { path } => {
            let path = path.unwrap_or_else(|| config.curated_file.clone());
            print_collection(&adapters::load_catalog(&path, Source::Curated))
        }
        Commands::Tldr { path } => {
            let path = path.unwrap_or_else(|| config.tldr_file.clone());
            print_collection(&adapters::load_catalog(&path, Source::Tldr))
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_list(config: &Config, args: ListArgs) -> Result<(), FzCmdError> {
    let inputs: Vec<SourceInput> = if args.inputs.is_empty() {
        Source::ALL
            .iter()
            .map(|source| SourceInput::new(*source, config.source_path(*source)))
            .collect()
    } else {
        args.inputs
            .iter()
            .map(|spec| SourceInput::parse_spec(spec))
            .collect::<Result<_, _>>()?
    };

    let mut limits = config.limits.clone();
    limits.extend(&Limits::from_specs(&args.limits)?);

    let entries = build_list(config, &inputs, &limits, !args.no_recent, args.recent_file);

    let mut out = io::stdout().lock();
    for line in format::format_lines(&entries, &config.widths) {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Load, merge, limit and rank. Never fails: bad inputs only shrink the list.
fn build_list(
    config: &Config,
    inputs: &[SourceInput],
    limits: &Limits,
    use_recent: bool,
    recent_file: Option<PathBuf>,
) -> Vec<Entry> {
    let collections = loader::load_sources(inputs);
    let loaded: usize = collections.iter().map(Vec::len).sum();

    let merged = merge::merge_sources(collections, &config.priority);
    let limited = limit::limit_entries(merged, limits);

    let ranked = if use_recent {
        let store = recent_store(config, recent_file);
        recent::rank_by_recency(limited, &store.load())
    } else {
        limited
    };

    info!(
        "Loaded {} entries from {} sources, emitting {}",
        loaded,
        inputs.len(),
        ranked.len()
    );
    ranked
}

fn run_preview(args: PreviewArgs) -> Result<(), FzCmdError> {
    let line = line_arg(join_fields(args.fields))?;
    let style = if args.plain {
        PreviewStyle::Plain
    } else {
        PreviewStyle::Colored
    };

    match format::parse_line(&line) {
        Some(payload) => println!("{}", preview::build_preview(&payload, style)),
        None => println!("No preview available"),
    }
    Ok(())
}

fn run_select(config: &Config, args: LineArgs) -> Result<(), FzCmdError> {
    let line = line_arg(args.line)?;
    let Some(Payload { command, .. }) = format::parse_line(&line) else {
        debug!("Nothing selected");
        return Ok(());
    };

    // The command is still inserted if the record cannot be written
    if let Err(e) = recent_store(config, args.recent_file).record(&command) {
        warn!("{}", e);
    }
    println!("{}", command);
    Ok(())
}

fn run_recent(config: &Config, action: RecentAction) -> Result<(), FzCmdError> {
    let store = recent_store(config, None);
    match action {
        RecentAction::Record { command } => {
            let command = if command.is_empty() {
                read_stdin()?
            } else {
                command.join(" ")
            };
            store.record(&command)?;
        }
        RecentAction::List => {
            let mut out = io::stdout().lock();
            for command in store.load().commands() {
                writeln!(out, "{}", command)?;
            }
        }
        RecentAction::Clear => {
            store.clear()?;
            info!("Cleared recent commands in {:?}", store.path());
            println!("Recent commands cleared.");
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn recent_store(config: &Config, override_path: Option<PathBuf>) -> RecentStore {
    let path = override_path.unwrap_or_else(|| config.recent_file.clone());
    RecentStore::new(path, config.recent_max)
}

fn read_stdin() -> Result<String, FzCmdError> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// Rebuild a line from separately passed fields. A single argument is
/// already a whole line.
fn join_fields(fields: Vec<String>) -> Option<String> {
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(format::FIELD_SEPARATOR))
    }
}

/// The line argument, or stdin when it is piped
fn line_arg(arg: Option<String>) -> Result<String, FzCmdError> {
    match arg {
        Some(line) => Ok(line),
        None if !io::stdin().is_terminal() => read_stdin(),
        None => Ok(String::new()),
    }
}

fn print_collection(entries: &[Entry]) -> Result<(), FzCmdError> {
    let json = serde_json::to_string_pretty(&Collection { commands: entries })?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
