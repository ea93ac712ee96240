//! # Membership Roster
//!
//! In-memory representation of all groups for the current cycle. Group names
//! are canonicalized to uppercase, so lookups are case-insensitive by
//! construction; member handles keep the casing they were written with but
//! compare case-insensitively. Serialization is ordered (groups and members
//! lexicographic) so diffs against the remote document stay stable.

use std::collections::BTreeMap;

use crate::domain::types::RosterError;

/// Characters a group name may contain once uppercased.
/// `+` is excluded: it is the multi-group separator in commands and pings.
pub const GROUP_ALLOWED_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-";

/// Uppercase a requested group name into its canonical form.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Check a canonical group name against the allowed character set.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| GROUP_ALLOWED_CHARS.contains(c))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Group {
    /// Lowercased handle -> handle as written. BTreeMap keeps members sorted.
    members: BTreeMap<String, String>,
}

/// All groups known to the bot for one handling cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roster {
    groups: BTreeMap<String, Group>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(&canonical_name(name))
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Names of every group the given user belongs to.
    pub fn groups_containing(&self, member: &str) -> Vec<String> {
        let key = member.to_lowercase();
        self.groups
            .iter()
            .filter(|(_, g)| g.members.contains_key(&key))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Create a group with `owner` as its sole member.
    pub fn create_group(&mut self, name: &str, owner: &str) -> Result<(), RosterError> {
        let canonical = canonical_name(name);
        if self.groups.contains_key(&canonical) {
            return Err(RosterError::AlreadyExists(canonical));
        }
        let mut group = Group::default();
        group.members.insert(owner.to_lowercase(), owner.to_string());
        self.groups.insert(canonical, group);
        Ok(())
    }

    pub fn delete_group(&mut self, name: &str) -> Result<(), RosterError> {
        let canonical = canonical_name(name);
        if self.groups.remove(&canonical).is_none() {
            return Err(RosterError::NotFound(canonical));
        }
        Ok(())
    }

    pub fn join(&mut self, name: &str, member: &str) -> Result<(), RosterError> {
        let canonical = canonical_name(name);
        let group = self
            .groups
            .get_mut(&canonical)
            .ok_or_else(|| RosterError::NotFound(canonical.clone()))?;
        let key = member.to_lowercase();
        if group.members.contains_key(&key) {
            return Err(RosterError::AlreadyMember {
                group: canonical,
                user: member.to_string(),
            });
        }
        group.members.insert(key, member.to_string());
        Ok(())
    }

    /// Remove a member. The group survives losing its last member;
    /// only `delete_group` removes groups.
    pub fn leave(&mut self, name: &str, member: &str) -> Result<(), RosterError> {
        let canonical = canonical_name(name);
        let group = self
            .groups
            .get_mut(&canonical)
            .ok_or_else(|| RosterError::NotFound(canonical.clone()))?;
        if group.members.remove(&member.to_lowercase()).is_none() {
            return Err(RosterError::NotMember {
                group: canonical,
                user: member.to_string(),
            });
        }
        Ok(())
    }

    /// Members of a group, in lexicographic order, as originally written.
    pub fn members_of(&self, name: &str) -> Result<Vec<String>, RosterError> {
        let canonical = canonical_name(name);
        self.groups
            .get(&canonical)
            .map(|g| g.members.values().cloned().collect())
            .ok_or(RosterError::NotFound(canonical))
    }

    /// Remove a member from every group they belong to (used when their
    /// platform account turns out not to exist anymore). Returns the names
    /// of the groups they were removed from.
    pub fn remove_from_all(&mut self, member: &str) -> Vec<String> {
        let key = member.to_lowercase();
        let mut removed = Vec::new();
        for (name, group) in &mut self.groups {
            if group.members.remove(&key).is_some() {
                removed.push(name.clone());
            }
        }
        removed
    }

    /// Used by the parser, which tolerates (and reports) duplicate headers
    /// instead of failing; regular creation goes through `create_group`.
    pub(crate) fn insert_empty_group(&mut self, canonical: &str) {
        self.groups.entry(canonical.to_string()).or_default();
    }

    /// Serialize back to the document format consumed by the parser.
    /// Deterministic: groups and members in lexicographic order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (name, group) in &self.groups {
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for member in group.members.values() {
                out.push_str(member);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}
