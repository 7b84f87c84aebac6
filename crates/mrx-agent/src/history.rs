//! Transcript rendering for LLM context.
//!
//! Each entry renders as `Role: message`. Messages may span several lines;
//! continuation lines are indented so they never read as a new entry.

use crate::session::{HistoryEntry, Role};

const USER_PREFIX: &str = "User: ";
const AGENT_PREFIX: &str = "Assistant: ";
const CONTINUATION: &str = "  ";

fn prefix(role: Role) -> &'static str {
    match role {
        Role::User => USER_PREFIX,
        Role::Agent => AGENT_PREFIX,
    }
}

/// Render history as `Role: message` lines
pub fn render(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            let body = entry.message.replace('\n', &format!("\n{}", CONTINUATION));
            format!("{}{}", prefix(entry.role), body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split rendered history back into entries.
///
/// Inverse of [`render`]. Unindented lines that carry no role prefix are
/// still attached to the preceding entry; text before the first prefix is
/// dropped.
pub fn parse(text: &str) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = Vec::new();

    for line in text.split('\n') {
        if let Some(rest) = line.strip_prefix(USER_PREFIX) {
            entries.push(HistoryEntry::user(rest));
        } else if let Some(rest) = line.strip_prefix(AGENT_PREFIX) {
            entries.push(HistoryEntry::agent(rest));
        } else if let Some(last) = entries.last_mut() {
            last.message.push('\n');
            last.message
                .push_str(line.strip_prefix(CONTINUATION).unwrap_or(line));
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lines() {
        let history = vec![
            HistoryEntry::user("hi"),
            HistoryEntry::agent("Do you have a brief?"),
        ];
        assert_eq!(render(&history), "User: hi\nAssistant: Do you have a brief?");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_roles_and_messages() {
        let history = vec![
            HistoryEntry::user("I need help creating a brief"),
            HistoryEntry::agent("Pick a study type."),
            HistoryEntry::user("Brand Health / Equity"),
            HistoryEntry::agent(
                "Review these.\nObjective text\nChallenges:\nPrice pressure\nOpportunities:\nNew markets",
            ),
            HistoryEntry::user(""),
        ];
        assert_eq!(parse(&render(&history)), history);
    }

    #[test]
    fn test_roundtrip_with_prefix_like_continuation_lines() {
        let history = vec![
            HistoryEntry::agent("Quoting you:\nUser: we sell widgets\nAssistant: noted"),
            HistoryEntry::user("  indented\n\n  Assistant: still mine"),
            HistoryEntry::agent("done"),
        ];
        let rendered = render(&history);
        assert_eq!(rendered.lines().filter(|l| l.starts_with(USER_PREFIX)).count(), 1);
        assert_eq!(parse(&rendered), history);
    }

    #[test]
    fn test_render_indents_continuation_lines() {
        let history = vec![HistoryEntry::agent("Challenges:\nPrice")];
        assert_eq!(render(&history), "Assistant: Challenges:\n  Price");
    }

    #[test]
    fn test_parse_keeps_colons_inside_messages() {
        let parsed = parse("User: ratio: 3:1\nAssistant: noted: yes");
        assert_eq!(parsed[0].message, "ratio: 3:1");
        assert_eq!(parsed[1].role, Role::Agent);
        assert_eq!(parsed[1].message, "noted: yes");
    }

    #[test]
    fn test_parse_drops_leading_orphan_text() {
        let parsed = parse("preamble\nUser: hello");
        assert_eq!(parsed, vec![HistoryEntry::user("hello")]);
    }
}
