//! # Group Policy
//!
//! Which groups are public (anyone may ping) and which are protected (only
//! moderators may add members). Moderators toggle these at runtime with
//! `makepublicgroup`/`makeprivategroup` and `protectgroup`/`unprotectgroup`,
//! so the lists live in their own document next to the membership one
//! rather than in the startup configuration. Same line-oriented dialect:
//! a `[PUBLIC]` and a `[PROTECTED]` section, one group name per line.

use std::collections::BTreeSet;

use crate::application::roster;
use crate::domain::types::ParseWarning;

#[derive(Debug, Clone, Copy)]
enum Section {
    /// No header seen yet.
    Start,
    /// Unknown header; entries skipped, the header's warning covers them.
    Skip,
    Public,
    Protected,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupPolicy {
    public: BTreeSet<String>,
    protected: BTreeSet<String>,
}

impl GroupPolicy {
    /// Parse the policy document. Tolerant like the membership parser:
    /// a bad line is one warning, the rest still loads.
    pub fn parse(text: &str) -> (Self, Vec<ParseWarning>) {
        let mut policy = Self::default();
        let mut warnings = Vec::new();
        let mut section = Section::Start;

        for (idx, raw) in text.lines().enumerate() {
            let lineno = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = roster::canonical_name(&line[1..line.len() - 1]);
                section = match name.as_str() {
                    "PUBLIC" => Section::Public,
                    "PROTECTED" => Section::Protected,
                    other => {
                        warnings.push(ParseWarning {
                            line: lineno,
                            reason: format!("unknown policy section \"{other}\"; section skipped"),
                        });
                        Section::Skip
                    }
                };
                continue;
            }

            let name = roster::canonical_name(line.split('=').next().unwrap_or_default());
            match section {
                Section::Start => warnings.push(ParseWarning {
                    line: lineno,
                    reason: format!("entry \"{name}\" appears before any policy section"),
                }),
                Section::Skip => {}
                Section::Public | Section::Protected => {
                    if !roster::valid_name(&name) {
                        warnings.push(ParseWarning {
                            line: lineno,
                            reason: format!("invalid group name \"{name}\" in policy document"),
                        });
                    } else if matches!(section, Section::Public) {
                        policy.public.insert(name);
                    } else {
                        policy.protected.insert(name);
                    }
                }
            }
        }

        (policy, warnings)
    }

    pub fn is_public(&self, group: &str) -> bool {
        self.public.contains(&roster::canonical_name(group))
    }

    pub fn is_protected(&self, group: &str) -> bool {
        self.protected.contains(&roster::canonical_name(group))
    }

    /// Returns true when the flag actually changed.
    pub fn set_public(&mut self, group: &str, on: bool) -> bool {
        let name = roster::canonical_name(group);
        if on {
            self.public.insert(name)
        } else {
            self.public.remove(&name)
        }
    }

    /// Returns true when the flag actually changed.
    pub fn set_protected(&mut self, group: &str, on: bool) -> bool {
        let name = roster::canonical_name(group);
        if on {
            self.protected.insert(name)
        } else {
            self.protected.remove(&name)
        }
    }

    /// Drop every flag for a group (used when the group is deleted).
    /// Returns true when anything was removed.
    pub fn forget(&mut self, group: &str) -> bool {
        let name = roster::canonical_name(group);
        let was_public = self.public.remove(&name);
        let was_protected = self.protected.remove(&name);
        was_public || was_protected
    }

    /// Serialize back to the document format `parse` consumes.
    /// Deterministic: sections and names in lexicographic order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (header, names) in [("PROTECTED", &self.protected), ("PUBLIC", &self.public)] {
            out.push('[');
            out.push_str(header);
            out.push_str("]\n");
            for name in names {
                out.push_str(name);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}
