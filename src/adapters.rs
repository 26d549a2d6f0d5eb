//! Turn raw shell output and YAML catalogs into entry collections.
//!
//! The shell integration captures `fc -l`, `alias` and the function table
//! and pipes the text in; these adapters only parse it. The curated catalog
//! and the tldr cache are YAML files read from disk. The JSON output of
//! every adapter is what the loader reads back on the next `list`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::entry::{Entry, Example, Source};

/// History entries kept when no limit is given
pub const DEFAULT_HISTORY_MAX: usize = 500;

/// Alias expansions longer than this are cut in the description
const ALIAS_DESCRIPTION_MAX: usize = 60;

/// History commands shorter than this are fragments
const MIN_HISTORY_LEN: usize = 3;

/// Commands too common to be worth suggesting from history
const NOISE_COMMANDS: &[&str] = &["ls", "cd", "pwd", "clear", "exit", "history", "fc", "echo"];

/// Our own invocations never go back into history suggestions
const SELF_COMMAND: &str = "fz-cmd";

lazy_static! {
    // `fc -l` prefixes each line with its event number, `*` marks edited events
    static ref RE_HISTORY_NUMBER: Regex = Regex::new(r"^\d+\*?\s+").unwrap();
    static ref RE_ALIAS_LINE: Regex = Regex::new(r"^(?:alias\s+)?([^=\s][^=]*)=(.*)$").unwrap();
    static ref RE_FUNCTION_NAME: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// On-disk collection shape, `{"commands": [...]}`
#[derive(Debug, Serialize)]
pub struct Collection<'a> {
    pub commands: &'a [Entry],
}

// ============================================================================
// History
// ============================================================================

/// First word of a command without any directory prefix
fn base_command(command: &str) -> &str {
    let first = command.split_whitespace().next().unwrap_or("");
    first.rsplit('/').next().unwrap_or(first)
}

fn clean_history_line(line: &str) -> Option<&str> {
    let line = line.trim();
    let command = match RE_HISTORY_NUMBER.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line,
    };

    if command.chars().count() < MIN_HISTORY_LEN {
        return None;
    }
    let first = command.split_whitespace().next().unwrap_or("");
    if NOISE_COMMANDS.contains(&first) || command.starts_with(SELF_COMMAND) {
        return None;
    }
    Some(command)
}

/// Parse an oldest-first history listing into entries, most recent first.
///
/// Each command appears once, at the position of its most recent use.
pub fn history_entries(listing: &str, max_entries: usize) -> Vec<Entry> {
    let commands: Vec<&str> = listing.lines().filter_map(clean_history_line).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let entries: Vec<Entry> = commands
        .iter()
        .rev()
        .filter(|command| seen.insert(**command))
        .take(max_entries)
        .map(|command| {
            let base = base_command(command);
            Entry::new(*command, Source::History)
                .with_description(format!("History: {}", base))
                .with_tags(["history", base])
                .with_examples(vec![Example::Bare(command.to_string())])
        })
        .collect();

    debug!(
        "Parsed {} history lines into {} entries",
        commands.len(),
        entries.len()
    );
    entries
}

// ============================================================================
// Aliases
// ============================================================================

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn shorten(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut short: String = value.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

/// Parse `alias` builtin output (`name=value` or `alias name=value`).
pub fn alias_entries(listing: &str) -> Vec<Entry> {
    listing
        .lines()
        .filter_map(|line| {
            let caps = RE_ALIAS_LINE.captures(line.trim())?;
            let name = caps.get(1)?.as_str().trim();
            let value = unquote(caps.get(2)?.as_str().trim());
            if name.is_empty() || name.starts_with('_') || name.starts_with('.') {
                return None;
            }
            Some(
                Entry::new(name, Source::Alias)
                    .with_description(format!("→ {}", shorten(value, ALIAS_DESCRIPTION_MAX)))
                    .with_tags(["alias", name])
                    .with_examples(vec![Example::Bare(name.to_string())]),
            )
        })
        .collect()
}

// ============================================================================
// Functions
// ============================================================================

/// Parse a function-name listing, one name per line.
pub fn function_entries(listing: &str) -> Vec<Entry> {
    listing
        .lines()
        .map(str::trim)
        .filter(|name| !name.starts_with('_') && RE_FUNCTION_NAME.is_match(name))
        .map(|name| {
            Entry::new(name, Source::Function)
                .with_description(format!("Function: {}", name))
                .with_tags(["function", name])
                .with_examples(vec![Example::Bare(name.to_string())])
        })
        .collect()
}

// ============================================================================
// Catalogs
// ============================================================================

/// One record of `commands.yaml` or `tldr-commands.yaml`
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    examples: Option<Vec<Value>>,
}

/// A catalog example is either a plain string or a mapping with a
/// `command` key; only the command survives.
fn catalog_example(value: &Value) -> Option<String> {
    let command = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Mapping(_) => value.get("command")?.as_str()?.to_string(),
        _ => return None,
    };
    let command = command.trim();
    (!command.is_empty()).then(|| command.to_string())
}

/// Parse a YAML catalog (`commands: [...]`) into entries tagged `source`.
///
/// Records that are not mappings or have no command are skipped. A document
/// that is not a mapping yields nothing.
pub fn catalog_entries(content: &str, source: Source) -> Vec<Entry> {
    let document: Value = match serde_yaml::from_str(content) {
        Ok(document) => document,
        Err(e) => {
            warn!("Ignoring unparsable {} catalog: {}", source, e);
            return Vec::new();
        }
    };

    let Some(records) = document.get("commands").and_then(Value::as_sequence) else {
        debug!("No command list in {} catalog", source);
        return Vec::new();
    };

    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            if !record.is_mapping() {
                debug!("Skipping {} catalog record #{}: not a mapping", source, idx);
                return None;
            }
            let raw: CatalogRecord = match serde_yaml::from_value(record.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("Skipping {} catalog record #{}: {}", source, idx, e);
                    return None;
                }
            };
            let command = raw.command.as_deref().map(str::trim).unwrap_or_default();
            if command.is_empty() {
                return None;
            }

            let examples = raw
                .examples
                .unwrap_or_default()
                .iter()
                .filter_map(catalog_example)
                .map(Example::Bare)
                .collect();
            Some(
                Entry::new(command, source)
                    .with_description(raw.description.unwrap_or_default().trim())
                    .with_tags(raw.tags.unwrap_or_default())
                    .with_examples(examples),
            )
        })
        .collect()
}

/// Read a catalog file. A missing or unreadable file is an empty catalog.
pub fn load_catalog(path: &Path, source: Source) -> Vec<Entry> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let entries = catalog_entries(&content, source);
            debug!("Read {} {} entries from {:?}", entries.len(), source, path);
            entries
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No {} catalog at {:?}", source, path);
            Vec::new()
        }
        Err(e) => {
            warn!("Cannot read {} catalog {:?}: {}", source, path, e);
            Vec::new()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.command.as_str()).collect()
    }

    #[test]
    fn test_history_strips_numbers_and_orders_newest_first() {
        let listing = "\
  101  git status
  102  cargo build --release
  103* git status
  104  docker compose up -d
";
        let entries = history_entries(listing, DEFAULT_HISTORY_MAX);
        assert_eq!(
            commands(&entries),
            vec!["docker compose up -d", "git status", "cargo build --release"]
        );
        assert!(entries.iter().all(|e| e.source == Source::History));
    }

    #[test]
    fn test_history_filters_noise_and_fragments() {
        let listing = "\
1  ls -la
2  cd /tmp
3  ll
4  \\
5  echo hi
6  fz-cmd list
7  lsof -i :8080
8  ./scripts/deploy.sh staging
";
        let entries = history_entries(listing, DEFAULT_HISTORY_MAX);
        assert_eq!(
            commands(&entries),
            vec!["./scripts/deploy.sh staging", "lsof -i :8080"]
        );
        assert_eq!(entries[0].description, "History: deploy.sh");
        assert_eq!(entries[0].tags, vec!["history", "deploy.sh"]);
        assert_eq!(
            entries[0].examples,
            vec![Example::Bare("./scripts/deploy.sh staging".to_string())]
        );
    }

    #[test]
    fn test_history_without_numbers_and_max() {
        let listing = "make test\nmake lint\nmake build\n7z x archive.7z\n";
        let entries = history_entries(listing, 2);
        assert_eq!(commands(&entries), vec!["7z x archive.7z", "make build"]);
    }

    #[test]
    fn test_alias_parsing() {
        let listing = "\
gst='git status'
alias ll=\"ls -lah\"
_private=secret
.hidden=x
k=kubectl
long='echo aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa'
not an alias line
";
        let entries = alias_entries(listing);
        assert_eq!(commands(&entries), vec!["gst", "ll", "k", "long"]);
        assert_eq!(entries[0].description, "→ git status");
        assert_eq!(entries[1].description, "→ ls -lah");
        assert_eq!(entries[0].tags, vec!["alias", "gst"]);

        let long = &entries[3].description;
        assert!(long.ends_with("..."));
        assert_eq!(long.chars().count(), "→ ".chars().count() + ALIAS_DESCRIPTION_MAX);
    }

    #[test]
    fn test_function_parsing() {
        let listing = "mkcd\n_zsh_internal\nbad name\nextract-archive\n\ngit_root\n(anon)\n";
        let entries = function_entries(listing);
        assert_eq!(commands(&entries), vec!["mkcd", "extract-archive", "git_root"]);
        assert_eq!(entries[0].description, "Function: mkcd");
        assert_eq!(entries[0].source, Source::Function);
    }

    #[test]
    fn test_collection_json_loads_back() {
        let entries = alias_entries("gst='git status'\n");
        let json = serde_json::to_string(&Collection { commands: &entries }).unwrap();
        let loaded = crate::loader::load_from_str(Source::Alias, &json);
        assert_eq!(loaded, entries);
    }

    const CATALOG: &str = r#"
commands:
  - command: git status
    description: "  Show the working tree status "
    tags: [git, status]
    examples:
      - git status
      - description: Short format
        command: git status -s
      - description: No command here
  - just a string
  - [not, a, mapping]
  - description: missing command
  - command: "   "
  - command: tar -xf archive.tar
    tags: "not a list"
  - command: du -sh
"#;

    #[test]
    fn test_catalog_parsing() {
        let entries = catalog_entries(CATALOG, Source::Curated);
        assert_eq!(commands(&entries), vec!["git status", "du -sh"]);

        let status = &entries[0];
        assert_eq!(status.source, Source::Curated);
        assert_eq!(status.description, "Show the working tree status");
        assert_eq!(status.tags, vec!["git", "status"]);
        assert_eq!(
            status.examples,
            vec![
                Example::Bare("git status".to_string()),
                Example::Bare("git status -s".to_string()),
            ]
        );
        assert!(entries[1].examples.is_empty());
    }

    #[test]
    fn test_tldr_catalog_is_tagged_tldr() {
        let entries = catalog_entries(CATALOG, Source::Tldr);
        assert!(entries.iter().all(|e| e.source == Source::Tldr));
    }

    #[test]
    fn test_catalog_without_command_list() {
        assert!(catalog_entries("", Source::Curated).is_empty());
        assert!(catalog_entries("- git status\n- ls\n", Source::Curated).is_empty());
        assert!(catalog_entries("commands: 3\n", Source::Curated).is_empty());
        assert!(catalog_entries("commands: [unclosed\n", Source::Curated).is_empty());
    }

    #[test]
    fn test_missing_catalog_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        assert!(load_catalog(&dir.path().join("commands.yaml"), Source::Curated).is_empty());

        let path = dir.path().join("tldr-commands.yaml");
        fs::write(&path, "commands:\n  - command: tar -czf\n").expect("write catalog");
        let entries = load_catalog(&path, Source::Tldr);
        assert_eq!(commands(&entries), vec!["tar -czf"]);
    }

    #[test]
    fn test_catalog_json_loads_back() {
        let entries = catalog_entries(CATALOG, Source::Tldr);
        let json = serde_json::to_string(&Collection { commands: &entries }).unwrap();
        assert_eq!(crate::loader::load_from_str(Source::Tldr, &json), entries);
    }
}
