//! Canonical command entry and the source priority table.
//!
//! Every suggestion, regardless of where it came from, is an [`Entry`]. The
//! [`PriorityTable`] decides which entry survives when two sources suggest
//! the same command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FzCmdError;

// ============================================================================
// Sources
// ============================================================================

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Hand-written catalog (commands.yaml)
    Curated,
    /// Shell alias
    Alias,
    /// Shell function
    Function,
    /// Shell history
    History,
    /// tldr pages
    Tldr,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Curated,
        Source::Alias,
        Source::Function,
        Source::History,
        Source::Tldr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Curated => "curated",
            Source::Alias => "alias",
            Source::Function => "function",
            Source::History => "history",
            Source::Tldr => "tldr",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = FzCmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == tag)
            .ok_or_else(|| FzCmdError::UnknownSource(s.trim().to_string()))
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Default ranks, lower wins. A new source needs one line here.
const DEFAULT_RANKS: [(Source, u8); 5] = [
    (Source::Curated, 0),
    (Source::Alias, 1),
    (Source::Function, 2),
    (Source::History, 3),
    (Source::Tldr, 4),
];

/// Total order over sources used to resolve duplicate commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTable {
    ranks: [u8; Source::ALL.len()],
}

impl Default for PriorityTable {
    fn default() -> Self {
        let mut ranks = [0; Source::ALL.len()];
        for (source, rank) in DEFAULT_RANKS {
            ranks[source.index()] = rank;
        }
        Self { ranks }
    }
}

impl PriorityTable {
    /// Build a table from source tags listed highest priority first.
    ///
    /// Every source must be named exactly once.
    pub fn from_order<S: AsRef<str>>(order: &[S]) -> Result<Self, FzCmdError> {
        let mut ranks = [u8::MAX; Source::ALL.len()];
        for (rank, tag) in order.iter().enumerate() {
            let source: Source = tag.as_ref().parse()?;
            if ranks[source.index()] != u8::MAX {
                return Err(FzCmdError::InvalidPriority(format!(
                    "'{}' listed more than once",
                    source
                )));
            }
            ranks[source.index()] = rank as u8;
        }

        let missing: Vec<&str> = Source::ALL
            .iter()
            .filter(|source| ranks[source.index()] == u8::MAX)
            .map(|source| source.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(FzCmdError::InvalidPriority(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        Ok(Self { ranks })
    }

    pub fn rank(&self, source: Source) -> u8 {
        self.ranks[source.index()]
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A usage example attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Example {
    Bare(String),
    Labeled {
        #[serde(default)]
        description: String,
        command: String,
    },
}

impl Example {
    pub fn command(&self) -> &str {
        match self {
            Example::Bare(command) => command.as_str(),
            Example::Labeled { command, .. } => command.as_str(),
        }
    }

    /// The example's description, if it has a non-empty one
    pub fn label(&self) -> Option<&str> {
        match self {
            Example::Labeled { description, .. } if !description.trim().is_empty() => {
                Some(description.as_str())
            }
            _ => None,
        }
    }
}

/// One suggested command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Exact text inserted on selection; dedup key
    pub command: String,

    /// One-line summary
    #[serde(default)]
    pub description: String,

    /// Search metadata, display order preserved
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub examples: Vec<Example>,

    pub source: Source,
}

impl Entry {
    pub fn new(command: impl Into<String>, source: Source) -> Self {
        Self {
            command: command.into(),
            description: String::new(),
            tags: Vec::new(),
            examples: Vec::new(),
            source,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_is_case_insensitive() {
        assert_eq!("History".parse::<Source>().unwrap(), Source::History);
        assert_eq!(" tldr ".parse::<Source>().unwrap(), Source::Tldr);
        assert!(matches!(
            "bookmarks".parse::<Source>(),
            Err(FzCmdError::UnknownSource(tag)) if tag == "bookmarks"
        ));
    }

    #[test]
    fn test_default_priority_order() {
        let table = PriorityTable::default();
        let ranks: Vec<u8> = Source::ALL.iter().map(|s| table.rank(*s)).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert!(table.rank(Source::Curated) < table.rank(Source::History));
    }

    #[test]
    fn test_priority_from_order() {
        let table =
            PriorityTable::from_order(&["history", "curated", "alias", "function", "tldr"])
                .unwrap();
        assert!(table.rank(Source::History) < table.rank(Source::Curated));
        assert_eq!(table.rank(Source::Tldr), 4);
    }

    #[test]
    fn test_priority_rejects_incomplete_or_duplicate_order() {
        assert!(matches!(
            PriorityTable::from_order(&["curated", "alias"]),
            Err(FzCmdError::InvalidPriority(msg)) if msg.contains("function")
        ));
        assert!(matches!(
            PriorityTable::from_order(&["curated", "curated", "alias", "function", "history"]),
            Err(FzCmdError::InvalidPriority(_))
        ));
        assert!(matches!(
            PriorityTable::from_order(&["curated", "zsh"]),
            Err(FzCmdError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_example_deserializes_bare_and_labeled() {
        let examples: Vec<Example> = serde_json::from_str(
            r#"["git status", {"description": "Short form", "command": "git status -s"}, {"command": "git st"}]"#,
        )
        .unwrap();
        assert_eq!(examples[0], Example::Bare("git status".to_string()));
        assert_eq!(examples[1].label(), Some("Short form"));
        assert_eq!(examples[1].command(), "git status -s");
        assert_eq!(examples[2].label(), None);
        assert_eq!(examples[2].command(), "git st");
    }

    #[test]
    fn test_entry_serializes_source_lowercase() {
        let entry = Entry::new("ll", Source::Alias).with_tags(["alias", "ll"]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source"], "alias");
        assert_eq!(json["tags"][1], "ll");
    }
}
