//! Recently selected commands.
//!
//! The record is a plain text file, one command per line, most recent first.
//! It is read whole before ranking and rewritten whole on every selection;
//! concurrent writers race and the last one wins, which at worst misorders
//! the record. Each line is the command exactly as it appears in field 2 of
//! the fzf line; tabs and line breaks are turned into spaces on record.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::FzCmdError;
use crate::format::strip_reserved;

// ============================================================================
// Record
// ============================================================================

/// Ordered, bounded list of selected commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentRecord {
    commands: Vec<String>,
    max: usize,
}

impl RecentRecord {
    pub fn new(max: usize) -> Self {
        Self {
            commands: Vec::new(),
            max,
        }
    }

    pub fn from_commands(mut commands: Vec<String>, max: usize) -> Self {
        commands.truncate(max);
        Self { commands, max }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Move `command` to the front. Blank commands are ignored and return false.
    pub fn record(&mut self, command: &str) -> bool {
        let cleaned = strip_reserved(command.trim());
        let command: &str = &cleaned;
        if command.is_empty() {
            return false;
        }
        self.commands.retain(|c| c != command);
        self.commands.insert(0, command.to_string());
        self.commands.truncate(self.max);
        true
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Put recently selected commands first, most recent first.
///
/// Commands absent from the record follow in their original order.
pub fn rank_by_recency(entries: Vec<Entry>, record: &RecentRecord) -> Vec<Entry> {
    if record.is_empty() {
        return entries;
    }

    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(record.len());
    for (pos, command) in record.commands().iter().enumerate() {
        positions.entry(command.as_str()).or_insert(pos);
    }

    let base = record.len();
    let mut keyed: Vec<(usize, Entry)> = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let key = positions
                .get(entry.command.as_str())
                .copied()
                .unwrap_or(base + idx);
            (key, entry)
        })
        .collect();

    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, entry)| entry).collect()
}

// ============================================================================
// Storage
// ============================================================================

/// The record file at a fixed path
#[derive(Debug, Clone)]
pub struct RecentStore {
    path: PathBuf,
    max: usize,
}

impl RecentStore {
    pub fn new(path: impl Into<PathBuf>, max: usize) -> Self {
        Self {
            path: path.into(),
            max,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. Any failure yields an empty record.
    pub fn load(&self) -> RecentRecord {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No recent record at {:?}", self.path);
                return RecentRecord::new(self.max);
            }
            Err(e) => {
                warn!("Cannot read recent record {:?}: {}", self.path, e);
                return RecentRecord::new(self.max);
            }
        };

        let commands = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        RecentRecord::from_commands(commands, self.max)
    }

    /// Replace the file with `record`, via a sibling temp file and rename.
    pub fn save(&self, record: &RecentRecord) -> Result<(), FzCmdError> {
        let write_err = |source: io::Error| FzCmdError::RecentWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut content = String::new();
        for command in record.commands() {
            content.push_str(command);
            content.push('\n');
        }

        let tmp = self.temp_path();
        fs::write(&tmp, content).map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Load, record `command`, save. Returns the updated record.
    pub fn record(&self, command: &str) -> Result<RecentRecord, FzCmdError> {
        let mut record = self.load();
        if record.record(command) {
            self.save(&record)?;
            debug!("Recorded {:?} ({} recent)", command.trim(), record.len());
        }
        Ok(record)
    }

    pub fn clear(&self) -> Result<(), FzCmdError> {
        self.save(&RecentRecord::new(self.max))
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recent".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

// ============================================================================
// Tests
// ============================================================================
