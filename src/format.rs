//! fzf line format.
//!
//! Each entry becomes one tab-separated line:
//!
//! ```text
//! <display>\t<command>\t<description>\t<tags>\t<examples>
//! ```
//!
//! `display` is the fixed-width row the user sees (`--with-nth=1`); the other
//! four fields are the untouched payload used for preview and selection.
//! `command` and `description` are emitted verbatim with tabs and line breaks
//! replaced by spaces; `tags` and `examples` are JSON arrays. No field can
//! ever contain the separator, and `cut -f2` yields the command as loaded.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::entry::{Entry, Example};

pub const FIELD_SEPARATOR: &str = "\t";

/// Marker appended to truncated columns
const ELLIPSIS: &str = "...";

/// Gap between display columns
const COLUMN_GAP: &str = "  ";

/// Only the first few tags fit in the tag column
const MAX_DISPLAY_TAGS: usize = 4;

/// Display column widths, in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub command: usize,
    pub description: usize,
    pub tags: usize,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            command: 35,
            description: 50,
            tags: 40,
        }
    }
}

/// The untruncated fields carried by a line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub command: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<Example>,
}

impl From<&Entry> for Payload {
    fn from(entry: &Entry) -> Self {
        Self {
            command: entry.command.clone(),
            description: entry.description.clone(),
            tags: entry.tags.clone(),
            examples: entry.examples.clone(),
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Truncate or pad `text` to exactly `width` cells.
pub fn truncate_pad(text: &str, width: usize) -> String {
    let text = sanitize_display(text);
    let text_width = text.width();

    let mut out = if text_width <= width {
        text.into_owned()
    } else {
        let (budget, marker) = if width >= ELLIPSIS.len() {
            (width - ELLIPSIS.len(), ELLIPSIS)
        } else {
            (width, "")
        };
        let mut cut = String::new();
        let mut used = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            used += w;
            cut.push(c);
        }
        cut.push_str(marker);
        cut
    };

    let out_width = out.width();
    if out_width < width {
        out.push_str(&" ".repeat(width - out_width));
    }
    out
}

/// Control characters would break the row, so they render as spaces.
fn sanitize_display(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_control) {
        Cow::Owned(
            text.chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

fn tag_display(tags: &[String]) -> String {
    tags.iter()
        .take(MAX_DISPLAY_TAGS)
        .map(|tag| format!("[{}]", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The visible part of a line
pub fn display_text(entry: &Entry, widths: &ColumnWidths) -> String {
    [
        truncate_pad(&entry.command, widths.command),
        truncate_pad(&entry.description, widths.description),
        truncate_pad(&tag_display(&entry.tags), widths.tags),
    ]
    .join(COLUMN_GAP)
}

// ============================================================================
// Payload fields
// ============================================================================

/// Characters that would split a line into extra fields or extra lines
const RESERVED: [char; 3] = ['\t', '\n', '\r'];

/// Replace the field separator and line breaks with spaces.
///
/// Anything else, backslashes and quotes included, passes through untouched,
/// so a command without reserved characters is emitted byte for byte.
pub fn strip_reserved(value: &str) -> Cow<'_, str> {
    if !value.contains(RESERVED) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .chars()
            .map(|c| if RESERVED.contains(&c) { ' ' } else { c })
            .collect(),
    )
}

fn encode_list<T: Serialize>(items: &[T]) -> String {
    if items.is_empty() {
        return String::new();
    }
    serde_json::to_string(items).unwrap_or_default()
}

fn decode_list<T: for<'de> Deserialize<'de>>(field: &str) -> Vec<T> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(field).unwrap_or_else(|e| {
        debug!("Ignoring undecodable list field {:?}: {}", field, e);
        Vec::new()
    })
}

// ============================================================================
// Lines
// ============================================================================

/// Format one entry as an fzf line.
pub fn format_line(entry: &Entry, widths: &ColumnWidths) -> String {
    [
        display_text(entry, widths),
        strip_reserved(&entry.command).into_owned(),
        strip_reserved(&entry.description).into_owned(),
        encode_list(&entry.tags),
        encode_list(&entry.examples),
    ]
    .join(FIELD_SEPARATOR)
}

pub fn format_lines(entries: &[Entry], widths: &ColumnWidths) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format_line(entry, widths))
        .collect()
}

/// Recover the payload from a line produced by [`format_line`].
///
/// Returns `None` when the line has no command field.
pub fn parse_line(line: &str) -> Option<Payload> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut fields = line.split(FIELD_SEPARATOR).skip(1);

    let command = fields.next()?.to_string();
    if command.trim().is_empty() {
        return None;
    }
    let description = fields.next().unwrap_or_default().to_string();
    let tags: Vec<String> = fields.next().map(decode_list).unwrap_or_default();
    let examples: Vec<Example> = fields.next().map(decode_list).unwrap_or_default();

    Some(Payload {
        command,
        description,
        tags,
        examples,
    })
}

// ============================================================================
// Tests
// ============================================================================
