//! # Document Parser
//!
//! Turns the raw text of the membership document into a [`Roster`] plus an
//! ordered list of warnings. The format is the INI dialect the deployed,
//! human-edited pages already use: `[GROUP]` header lines followed by one
//! bare member handle per line, with `#`/`;` comments and blank lines
//! allowed anywhere.
//!
//! A bad line is rejected on its own: it becomes one [`ParseWarning`] and
//! the rest of the document still loads. One typo on the page must never
//! take the whole bot down.

use regex::Regex;
use std::sync::OnceLock;

use crate::application::roster::{self, Roster};
use crate::domain::types::ParseWarning;

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^\[(.*)\]$").unwrap())
}

/// State of the section currently being filled.
enum Section {
    /// No header seen yet.
    None,
    /// Header accepted; member lines go into this canonical group name.
    Active(String),
    /// Header rejected; member lines are skipped without further noise,
    /// the header's own warning covers them.
    Rejected,
}

/// Parse a document. Deterministic: the same text always yields the same
/// roster and the same ordered warnings.
pub fn parse(text: &str) -> (Roster, Vec<ParseWarning>) {
    let mut roster = Roster::new();
    let mut warnings = Vec::new();
    let mut section = Section::None;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(caps) = header_regex().captures(line) {
            let name = roster::canonical_name(&caps[1]);
            if !roster::valid_name(&name) {
                warnings.push(ParseWarning {
                    line: lineno,
                    reason: format!(
                        "invalid group name \"{}\" (allowed: A-Z, 0-9, -); section skipped",
                        caps[1].trim()
                    ),
                });
                section = Section::Rejected;
            } else if roster.contains(&name) {
                warnings.push(ParseWarning {
                    line: lineno,
                    reason: format!("duplicate group \"{name}\"; section skipped"),
                });
                section = Section::Rejected;
            } else {
                roster.insert_empty_group(&name);
                section = Section::Active(name);
            }
            continue;
        }

        // Member line. The wiki dialect allows `name = value` noise from
        // hand edits; everything after the first `=` is discarded. `:` is
        // NOT a delimiter here: platform handles like `@user:server`
        // contain one, and serialize() writes them verbatim.
        let handle = line
            .split('=')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        match &section {
            Section::None => {
                warnings.push(ParseWarning {
                    line: lineno,
                    reason: format!("member \"{handle}\" appears before any group header"),
                });
            }
            Section::Rejected => {}
            Section::Active(group) => {
                if handle.is_empty() || handle.contains(char::is_whitespace) {
                    warnings.push(ParseWarning {
                        line: lineno,
                        reason: format!("malformed member line \"{line}\""),
                    });
                } else if roster.join(group, &handle).is_err() {
                    warnings.push(ParseWarning {
                        line: lineno,
                        reason: format!("duplicate member \"{handle}\" in group {group}"),
                    });
                }
            }
        }
    }

    (roster, warnings)
}
