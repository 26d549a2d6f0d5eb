//! Loading pre-materialized entry collections.
//!
//! A collection is a JSON file written by one source adapter, either
//! `{"commands": [...]}` or a bare array. Nothing here is fatal: a missing
//! file is an absent source, a broken file is an empty one, and a malformed
//! record is skipped.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::entry::{Entry, Example, Source};
use crate::error::FzCmdError;
use crate::format::strip_reserved;

/// One collection to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub source: Source,
    pub path: PathBuf,
}

impl SourceInput {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    /// Parse a `SOURCE=PATH` argument
    pub fn parse_spec(spec: &str) -> Result<Self, FzCmdError> {
        let (tag, path) = spec
            .split_once('=')
            .ok_or_else(|| FzCmdError::InvalidInput(spec.to_string()))?;
        if path.trim().is_empty() {
            return Err(FzCmdError::InvalidInput(spec.to_string()));
        }
        Ok(Self::new(tag.parse()?, path.trim()))
    }
}

/// Record shape as found on disk; everything optional so one bad field
/// drops one record, not the file.
#[derive(Debug, Deserialize)]
struct RawEntry {
    command: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    examples: Option<Vec<Example>>,
    #[serde(default)]
    source: Option<String>,
}

/// Load every input, one collection per input, in input order.
pub fn load_sources(inputs: &[SourceInput]) -> Vec<Vec<Entry>> {
    inputs
        .iter()
        .map(|input| load_file(input.source, &input.path))
        .collect()
}

pub fn load_file(origin: Source, path: &Path) -> Vec<Entry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No {} collection at {:?}", origin, path);
            return Vec::new();
        }
        Err(e) => {
            warn!("Cannot read {} collection {:?}: {}", origin, path, e);
            return Vec::new();
        }
    };

    let entries = load_from_str(origin, &content);
    debug!("Loaded {} {} entries from {:?}", entries.len(), origin, path);
    entries
}

/// Parse a collection already in memory
pub fn load_from_str(origin: Source, content: &str) -> Vec<Entry> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unparsable {} collection: {}", origin, e);
            return Vec::new();
        }
    };

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("commands") {
            Some(Value::Array(records)) => records,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                warn!("Ignoring {} collection: 'commands' is not a list", origin);
                return Vec::new();
            }
        },
        _ => {
            warn!("Ignoring {} collection: expected a list of commands", origin);
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| parse_record(origin, idx, record))
        .collect()
}

fn parse_record(origin: Source, idx: usize, record: Value) -> Option<Entry> {
    let raw: RawEntry = match serde_json::from_value(record) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Dropping {} record #{}: {}", origin, idx, e);
            return None;
        }
    };

    let command = raw.command.as_deref().map(str::trim).unwrap_or_default();
    if command.is_empty() {
        debug!("Dropping {} record #{}: missing command", origin, idx);
        return None;
    }

    let source = match raw.source.as_deref() {
        Some(tag) => match tag.parse::<Source>() {
            Ok(source) => source,
            Err(e) => {
                debug!("Dropping {} record #{}: {}", origin, idx, e);
                return None;
            }
        },
        None => origin,
    };

    Some(Entry {
        command: strip_reserved(command).into_owned(),
        description: raw.description.unwrap_or_default().trim().to_string(),
        tags: raw.tags.unwrap_or_default(),
        examples: raw.examples.unwrap_or_default(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
