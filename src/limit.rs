//! Per-source caps applied after merging.

use std::collections::HashMap;
use tracing::debug;

use crate::entry::{Entry, Source};
use crate::error::FzCmdError;

/// Maximum entries kept per source. A source without a cap is unlimited;
/// a cap of 0 removes the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Limits {
    caps: HashMap<Source, usize>,
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, source: Source, cap: usize) {
        self.caps.insert(source, cap);
    }

    pub fn cap(&self, source: Source) -> Option<usize> {
        self.caps.get(&source).copied()
    }

    /// Parse `SOURCE:COUNT` arguments, e.g. `history:50`
    pub fn from_specs<I, S>(specs: I) -> Result<Self, FzCmdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut limits = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (tag, count) = spec
                .split_once(':')
                .ok_or_else(|| FzCmdError::InvalidLimit(spec.to_string()))?;
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| FzCmdError::InvalidLimit(spec.to_string()))?;
            limits.set(tag.parse()?, count);
        }
        Ok(limits)
    }

    /// Same as [`Limits::from_specs`] for a `{"history": 50}` style map
    pub fn from_map(map: &HashMap<String, usize>) -> Result<Self, FzCmdError> {
        let mut limits = Self::new();
        for (tag, count) in map {
            limits.set(tag.parse()?, *count);
        }
        Ok(limits)
    }

    /// Caps in `other` replace ours
    pub fn extend(&mut self, other: &Limits) {
        self.caps.extend(other.caps.iter().map(|(s, c)| (*s, *c)));
    }
}

/// Keep the first `cap` entries of every capped source.
///
/// Surviving entries stay in input order, so the priority grouping from the
/// merge step is untouched. Applying the same limits twice changes nothing.
pub fn limit_entries(entries: Vec<Entry>, limits: &Limits) -> Vec<Entry> {
    let before = entries.len();
    let mut taken: HashMap<Source, usize> = HashMap::new();

    let limited: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| {
            let count = taken.entry(entry.source).or_insert(0);
            match limits.cap(entry.source) {
                Some(cap) if *count >= cap => false,
                _ => {
                    *count += 1;
                    true
                }
            }
        })
        .collect();

    if limited.len() != before {
        debug!("Limited {} entries to {}", before, limited.len());
    }
    limited
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(command: &str, source: Source) -> Entry {
        Entry::new(command, source)
    }

    fn commands(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.command.as_str()).collect()
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("cmd1", Source::Curated),
            entry("cmd2", Source::Curated),
            entry("cmd3", Source::Curated),
            entry("cmd4", Source::History),
            entry("cmd5", Source::History),
        ]
    }

    #[test]
    fn test_limit_commands_per_source() {
        let limits = Limits::from_specs(["curated:2", "history:1"]).unwrap();
        let limited = limit_entries(sample(), &limits);
        assert_eq!(commands(&limited), vec!["cmd1", "cmd2", "cmd4"]);
    }

    #[test]
    fn test_keeps_first_entries_of_source() {
        let history = vec![
            entry("h1", Source::History),
            entry("h2", Source::History),
            entry("h3", Source::History),
        ];
        let limits = Limits::from_specs(["history:1"]).unwrap();
        assert_eq!(commands(&limit_entries(history, &limits)), vec!["h1"]);
    }

    #[test]
    fn test_zero_removes_and_absent_is_unlimited() {
        let mut limits = Limits::new();
        limits.set(Source::Curated, 0);
        let limited = limit_entries(sample(), &limits);
        assert_eq!(commands(&limited), vec!["cmd4", "cmd5"]);

        assert_eq!(limit_entries(sample(), &Limits::new()), sample());
    }

    #[test]
    fn test_cap_for_empty_source() {
        let limits = Limits::from_specs(["curated:10", "tldr:5"]).unwrap();
        assert_eq!(limit_entries(sample(), &limits).len(), 5);
    }

    #[test]
    fn test_idempotent() {
        let limits = Limits::from_specs(["curated:2", "history:1"]).unwrap();
        let once = limit_entries(sample(), &limits);
        let twice = limit_entries(once.clone(), &limits);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_preserved_within_source_when_interleaved() {
        let entries = vec![
            entry("a1", Source::Alias),
            entry("h1", Source::History),
            entry("a2", Source::Alias),
            entry("h2", Source::History),
            entry("a3", Source::Alias),
        ];
        let limits = Limits::from_specs(["alias:2"]).unwrap();
        assert_eq!(
            commands(&limit_entries(entries, &limits)),
            vec!["a1", "h1", "a2", "h2"]
        );
    }

    #[test]
    fn test_invalid_specs() {
        assert!(matches!(
            Limits::from_specs(["history"]),
            Err(FzCmdError::InvalidLimit(_))
        ));
        assert!(matches!(
            Limits::from_specs(["history:many"]),
            Err(FzCmdError::InvalidLimit(_))
        ));
        assert!(matches!(
            Limits::from_specs(["history:-1"]),
            Err(FzCmdError::InvalidLimit(_))
        ));
        assert!(matches!(
            Limits::from_specs(["bookmarks:3"]),
            Err(FzCmdError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_extend_overrides() {
        let mut limits = Limits::from_specs(["history:50", "tldr:10"]).unwrap();
        limits.extend(&Limits::from_specs(["history:5"]).unwrap());
        assert_eq!(limits.cap(Source::History), Some(5));
        assert_eq!(limits.cap(Source::Tldr), Some(10));
        assert_eq!(limits.cap(Source::Curated), None);
    }

    #[test]
    fn test_from_map() {
        let map = HashMap::from([("history".to_string(), 3), ("alias".to_string(), 0)]);
        let limits = Limits::from_map(&map).unwrap();
        assert_eq!(limits.cap(Source::History), Some(3));
        assert_eq!(limits.cap(Source::Alias), Some(0));

        let bad = HashMap::from([("zsh".to_string(), 3)]);
        assert!(Limits::from_map(&bad).is_err());
    }
}
