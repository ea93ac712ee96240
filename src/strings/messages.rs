//! # Messages
//!
//! Contains constant strings and format functions for user-facing replies.
//! Includes error messages, mutation confirmations, and ping notifications.

pub const CREATEGROUP_USAGE: &str = "Usage: `creategroup <GROUP>`";
pub const DELETEGROUP_USAGE: &str = "Usage: `deletegroup <GROUP>`";
pub const JOIN_USAGE: &str = "Usage: `join <GROUP>` or `join <GROUP1>+<GROUP2>`";
pub const LEAVE_USAGE: &str = "Usage: `leave <GROUP>` or `leave <GROUP1>+<GROUP2>`";
pub const PROTECTGROUP_USAGE: &str = "Usage: `protectgroup <GROUP>`";
pub const UNPROTECTGROUP_USAGE: &str = "Usage: `unprotectgroup <GROUP>`";
pub const MAKEPUBLICGROUP_USAGE: &str = "Usage: `makepublicgroup <GROUP>`";
pub const MAKEPRIVATEGROUP_USAGE: &str = "Usage: `makeprivategroup <GROUP>`";

pub const MOD_ONLY: &str = "🚫 That command is moderator-only.";
pub const NOT_IN_ANY_GROUP: &str = "You are not a member of any group.";
pub const NO_GROUPS_YET: &str = "No groups exist yet.";

/// `["A"]` -> `A`, `["A", "B"]` -> `A and B`, `["A", "B", "C"]` -> `A, B and C`.
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {last}", head.join(", ")),
    }
}

pub fn invalid_group_name(name: &str) -> String {
    format!("Group name {name} may only use A-Z, 0-9 and `-`.")
}

pub fn unknown_command(verb: &str) -> String {
    format!("Unknown command `{verb}`. Send `help` for the command list.")
}

pub fn group_created(name: &str) -> String {
    format!("✅ Created group {name}. You are its first member.")
}

pub fn group_deleted(name: &str) -> String {
    format!("🗑️ Deleted group {name}.")
}

pub fn joined_groups(names: &[String]) -> String {
    format!("✅ You were added to {}.", join_names(names))
}

pub fn left_groups(names: &[String]) -> String {
    format!("✅ You were removed from {}.", join_names(names))
}

pub fn available_groups(names: &[String]) -> String {
    format!("**Available groups:** {}", names.join(", "))
}

pub fn group_missing(name: &str) -> String {
    format!("* The group {name} does not exist.")
}

pub fn group_already_exists(name: &str) -> String {
    format!("* The group {name} already exists.")
}

pub fn already_member(name: &str) -> String {
    format!("* You are already a member of {name}.")
}

pub fn not_member(name: &str) -> String {
    format!("* You are not a member of {name}.")
}

pub fn group_protected(name: &str) -> String {
    format!("* Group {name} is protected; ask a moderator to add you.")
}

pub fn ping_not_allowed(name: &str) -> String {
    format!("* You need to be a member of {name} to ping it.")
}

pub fn group_now_protected(name: &str) -> String {
    format!("🔒 Group {name} is now protected; only moderators may join it.")
}

pub fn group_now_unprotected(name: &str) -> String {
    format!("🔓 Group {name} is no longer protected.")
}

pub fn group_now_public(name: &str) -> String {
    format!("📢 Group {name} is now public; anyone may ping it.")
}

pub fn group_now_private(name: &str) -> String {
    format!("🔕 Group {name} is no longer public.")
}

pub fn policy_unchanged(name: &str, state: &str) -> String {
    format!("Group {name} is already {state}.")
}

pub fn ping_rejected_token(token: &str) -> String {
    format!("* The group name {token} contains invalid characters.")
}

pub fn pinged_groups(names: &[String]) -> String {
    if names.len() == 1 {
        format!("Pinged members of {} group.", names[0])
    } else {
        format!("Pinged members of {} groups.", join_names(names))
    }
}

pub fn ping_problems(header: Option<String>, problems: &[String]) -> String {
    let intro = match header {
        Some(ok) => format!("{ok} However, your ping request caused one or more errors:\n\n"),
        None => "Your ping request caused one or more errors:\n\n".to_string(),
    };
    format!("{intro}{}", problems.join("\n"))
}

pub fn ping_notification(sender: &str, groups: &[String], body: &str) -> String {
    let quoted: String = body
        .lines()
        .map(|l| format!("> {l}\n"))
        .collect();
    format!(
        "🔔 You've been pinged by {sender} in group {}.\n\n{quoted}\n\
         Reply `leave {}` to stop receiving pings for this group, \
         or `unsubscribe` to leave all groups.",
        join_names(groups),
        groups.first().map(String::as_str).unwrap_or_default(),
    )
}
