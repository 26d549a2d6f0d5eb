//! Detail pane text for the fzf preview window.

use colored::{ColoredString, Colorize};

use crate::format::Payload;

/// Which ANSI styling to apply, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStyle {
    Colored,
    Plain,
}

impl PreviewStyle {
    fn paint(self, text: &str, color: fn(&str) -> ColoredString) -> String {
        match self {
            PreviewStyle::Colored => color(text).to_string(),
            PreviewStyle::Plain => text.to_string(),
        }
    }

    fn label(self, text: &str) -> String {
        self.paint(text, |t| t.cyan().bold())
    }

    fn value(self, text: &str) -> String {
        self.paint(text, |t| t.white())
    }

    fn example_label(self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    fn example_command(self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }
}

/// Render the command, description, tags and examples of one entry.
///
/// Empty sections are left out. A labeled example renders as its label with
/// the command indented under it; a bare example is just `$ command`.
pub fn build_preview(payload: &Payload, style: PreviewStyle) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(style.label("Command:"));
    lines.push(format!("  {}", style.value(&payload.command)));
    lines.push(String::new());

    if !payload.description.trim().is_empty() {
        lines.push(style.label("Description:"));
        lines.push(format!("  {}", style.value(payload.description.trim())));
        lines.push(String::new());
    }

    let tags: Vec<&str> = payload
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        lines.push(style.label("Tags:"));
        lines.push(format!("  {}", style.value(&tags.join(", "))));
        lines.push(String::new());
    }

    let examples: Vec<_> = payload
        .examples
        .iter()
        .filter(|e| !e.command().trim().is_empty())
        .collect();
    if !examples.is_empty() {
        lines.push(style.label("Examples:"));
        for example in examples {
            let command = format!("$ {}", example.command().trim());
            match example.label() {
                Some(label) => {
                    lines.push(format!("  {}", style.example_label(label.trim())));
                    lines.push(format!("    {}", style.example_command(&command)));
                }
                None => lines.push(format!("  {}", style.example_command(&command))),
            }
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Example;

    fn payload() -> Payload {
        Payload {
            command: "git status".to_string(),
            description: "Show git status".to_string(),
            tags: vec!["git".to_string(), " ".to_string(), "status".to_string()],
            examples: vec![
                Example::Bare("git status".to_string()),
                Example::Labeled {
                    description: "Short format".to_string(),
                    command: "git status -s".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_full_preview() {
        let preview = build_preview(&payload(), PreviewStyle::Plain);
        let expected = "\
Command:
  git status

Description:
  Show git status

Tags:
  git, status

Examples:
  $ git status
  Short format
    $ git status -s";
        assert_eq!(preview, expected);
    }

    #[test]
    fn test_command_only() {
        let preview = build_preview(
            &Payload {
                command: "ls".to_string(),
                ..Payload::default()
            },
            PreviewStyle::Plain,
        );
        assert_eq!(preview, "Command:\n  ls");
    }

    #[test]
    fn test_examples_keep_source_order() {
        let mut p = payload();
        p.examples.reverse();
        let preview = build_preview(&p, PreviewStyle::Plain);
        assert!(preview.ends_with("Examples:\n  Short format\n    $ git status -s\n  $ git status"));
    }

    #[test]
    fn test_plain_has_no_escape_codes() {
        let preview = build_preview(&payload(), PreviewStyle::Plain);
        assert!(!preview.contains('\x1b'));
    }
}
