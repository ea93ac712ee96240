//! # Dispatcher
//!
//! Executes an interpreted [`Action`] against the roster and policy under an
//! authorization context, producing the reply for the requester, the ping
//! fan-out, and the dirty flags the router turns into document write-backs.
//! Exhaustive match over the action variants; no stringly branching here.

use std::collections::BTreeMap;

use crate::application::policy::GroupPolicy;
use crate::application::roster::Roster;
use crate::domain::types::{Action, AuthContext, DispatchResult, Notification, RosterError};
use crate::strings::{help, messages};

pub fn dispatch(
    action: Action,
    roster: &mut Roster,
    ctx: &AuthContext,
    policy: &mut GroupPolicy,
) -> DispatchResult {
    match action {
        Action::CreateGroup { name } => create_group(&name, roster, ctx),
        Action::DeleteGroup { name } => delete_group(&name, roster, ctx, policy),
        Action::Join { names } => join(&names, roster, ctx, policy),
        Action::Leave { names } => leave(&names, roster, ctx),
        Action::Unsubscribe { names } => unsubscribe(&names, roster, ctx),
        Action::Protect { name, on } => set_protected(&name, on, roster, ctx, policy),
        Action::MakePublic { name, on } => set_public(&name, on, roster, ctx, policy),
        Action::ListGroups => list_groups(roster),
        Action::Help => DispatchResult {
            reply: Some(help::MAIN.to_string()),
            ..Default::default()
        },
        Action::Ping {
            groups,
            rejected,
            body,
        } => ping(&groups, &rejected, &body, roster, ctx, policy),
    }
}

fn create_group(name: &str, roster: &mut Roster, ctx: &AuthContext) -> DispatchResult {
    if !ctx.is_moderator {
        tracing::warn!("Non-moderator {} tried to create group {}", ctx.sender, name);
        return reply_only(messages::MOD_ONLY);
    }
    match roster.create_group(name, &ctx.sender) {
        Ok(()) => DispatchResult {
            reply: Some(messages::group_created(name)),
            dirty: true,
            publish_reason: Some(format!("Created group {name} for {}", ctx.sender)),
            ..Default::default()
        },
        Err(RosterError::AlreadyExists(name)) => reply_only(&messages::group_already_exists(&name)),
        Err(err) => reply_only(&err.to_string()),
    }
}

fn delete_group(
    name: &str,
    roster: &mut Roster,
    ctx: &AuthContext,
    policy: &mut GroupPolicy,
) -> DispatchResult {
    if !ctx.is_moderator {
        tracing::warn!("Non-moderator {} tried to delete group {}", ctx.sender, name);
        return reply_only(messages::MOD_ONLY);
    }
    match roster.delete_group(name) {
        Ok(()) => DispatchResult {
            reply: Some(messages::group_deleted(name)),
            dirty: true,
            // Stale public/protected flags must not outlive the group.
            policy_dirty: policy.forget(name),
            publish_reason: Some(format!("Deleted group {name}")),
            ..Default::default()
        },
        Err(RosterError::NotFound(name)) => reply_only(&messages::group_missing(&name)),
        Err(err) => reply_only(&err.to_string()),
    }
}

fn set_protected(
    name: &str,
    on: bool,
    roster: &Roster,
    ctx: &AuthContext,
    policy: &mut GroupPolicy,
) -> DispatchResult {
    if !ctx.is_moderator {
        tracing::warn!("Non-moderator {} tried to change policy of {}", ctx.sender, name);
        return reply_only(messages::MOD_ONLY);
    }
    if !roster.contains(name) {
        return reply_only(&messages::group_missing(name));
    }
    if !policy.set_protected(name, on) {
        let state = if on { "protected" } else { "unprotected" };
        return reply_only(&messages::policy_unchanged(name, state));
    }
    let (reply, reason) = if on {
        (
            messages::group_now_protected(name),
            format!("Marked group {name} protected"),
        )
    } else {
        (
            messages::group_now_unprotected(name),
            format!("Marked group {name} unprotected"),
        )
    };
    DispatchResult {
        reply: Some(reply),
        policy_dirty: true,
        publish_reason: Some(reason),
        ..Default::default()
    }
}

fn set_public(
    name: &str,
    on: bool,
    roster: &Roster,
    ctx: &AuthContext,
    policy: &mut GroupPolicy,
) -> DispatchResult {
    if !ctx.is_moderator {
        tracing::warn!("Non-moderator {} tried to change policy of {}", ctx.sender, name);
        return reply_only(messages::MOD_ONLY);
    }
    if !roster.contains(name) {
        return reply_only(&messages::group_missing(name));
    }
    if !policy.set_public(name, on) {
        let state = if on { "public" } else { "private" };
        return reply_only(&messages::policy_unchanged(name, state));
    }
    let (reply, reason) = if on {
        (
            messages::group_now_public(name),
            format!("Marked group {name} public"),
        )
    } else {
        (
            messages::group_now_private(name),
            format!("Marked group {name} private"),
        )
    };
    DispatchResult {
        reply: Some(reply),
        policy_dirty: true,
        publish_reason: Some(reason),
        ..Default::default()
    }
}

fn join(
    names: &[String],
    roster: &mut Roster,
    ctx: &AuthContext,
    policy: &GroupPolicy,
) -> DispatchResult {
    let mut joined: Vec<String> = Vec::new();
    let mut problems: Vec<String> = Vec::new();

    for name in names {
        if !roster.contains(name) {
            tracing::warn!("Join request for missing group {} by {}", name, ctx.sender);
            problems.push(messages::group_missing(name));
        } else if policy.is_protected(name) && !ctx.is_moderator {
            tracing::warn!("{} tried to join protected group {}", ctx.sender, name);
            problems.push(messages::group_protected(name));
        } else {
            match roster.join(name, &ctx.sender) {
                Ok(()) => joined.push(name.clone()),
                Err(RosterError::AlreadyMember { group, .. }) => {
                    problems.push(messages::already_member(&group));
                }
                Err(err) => problems.push(format!("* {err}")),
            }
        }
    }

    mutation_result(
        joined,
        problems,
        messages::joined_groups,
        |names| format!("Added {} to group(s) {}", ctx.sender, names.join("+")),
    )
}

fn leave(names: &[String], roster: &mut Roster, ctx: &AuthContext) -> DispatchResult {
    let mut left: Vec<String> = Vec::new();
    let mut problems: Vec<String> = Vec::new();

    for name in names {
        match roster.leave(name, &ctx.sender) {
            Ok(()) => left.push(name.clone()),
            Err(RosterError::NotFound(name)) => problems.push(messages::group_missing(&name)),
            Err(RosterError::NotMember { group, .. }) => {
                problems.push(messages::not_member(&group));
            }
            Err(err) => problems.push(format!("* {err}")),
        }
    }

    mutation_result(
        left,
        problems,
        messages::left_groups,
        |names| format!("Removed {} from group(s) {}", ctx.sender, names.join("+")),
    )
}

fn unsubscribe(names: &[String], roster: &mut Roster, ctx: &AuthContext) -> DispatchResult {
    let targets = if names.is_empty() {
        roster.groups_containing(&ctx.sender)
    } else {
        names.to_vec()
    };
    if targets.is_empty() {
        return reply_only(messages::NOT_IN_ANY_GROUP);
    }
    leave(&targets, roster, ctx)
}

fn list_groups(roster: &Roster) -> DispatchResult {
    let names = roster.group_names();
    if names.is_empty() {
        reply_only(messages::NO_GROUPS_YET)
    } else {
        reply_only(&messages::available_groups(&names))
    }
}

/// Expand pings into a recipient list. A sender may ping a group they belong
/// to, any public group, or anything if they moderate; they are never
/// notified of their own ping.
fn ping(
    groups: &[String],
    rejected: &[String],
    body: &str,
    roster: &Roster,
    ctx: &AuthContext,
    policy: &GroupPolicy,
) -> DispatchResult {
    let mut pinged: Vec<String> = Vec::new();
    let mut problems: Vec<String> = rejected
        .iter()
        .map(|t| messages::ping_rejected_token(t))
        .collect();
    // Lowercased handle -> handle as written, for cross-group dedup.
    let mut recipients: BTreeMap<String, String> = BTreeMap::new();

    for group in groups {
        match roster.members_of(group) {
            Err(_) => {
                tracing::warn!("Ping for missing group {} by {}", group, ctx.sender);
                problems.push(messages::group_missing(group));
            }
            Ok(members) => {
                let is_member = members.iter().any(|m| m.eq_ignore_ascii_case(&ctx.sender));
                if !(is_member || policy.is_public(group) || ctx.is_moderator) {
                    tracing::warn!("Non-member {} tried to ping group {}", ctx.sender, group);
                    problems.push(messages::ping_not_allowed(group));
                    continue;
                }
                pinged.push(group.clone());
                for member in members {
                    if member.eq_ignore_ascii_case(&ctx.sender) {
                        continue;
                    }
                    recipients.entry(member.to_lowercase()).or_insert(member);
                }
            }
        }
    }

    let notification = messages::ping_notification(&ctx.sender, &pinged, body);
    let notifications: Vec<Notification> = recipients
        .into_values()
        .map(|recipient| Notification {
            recipient,
            body: notification.clone(),
        })
        .collect();

    let reply = if problems.is_empty() {
        (!pinged.is_empty()).then(|| messages::pinged_groups(&pinged))
    } else {
        let header = (!pinged.is_empty()).then(|| messages::pinged_groups(&pinged));
        Some(messages::ping_problems(header, &problems))
    };

    DispatchResult {
        reply,
        notifications,
        ..Default::default()
    }
}

fn reply_only(text: &str) -> DispatchResult {
    DispatchResult {
        reply: Some(text.to_string()),
        ..Default::default()
    }
}

fn mutation_result(
    changed: Vec<String>,
    problems: Vec<String>,
    confirm: impl Fn(&[String]) -> String,
    reason: impl Fn(&[String]) -> String,
) -> DispatchResult {
    let mut parts: Vec<String> = Vec::new();
    if !changed.is_empty() {
        parts.push(confirm(&changed));
    }
    parts.extend(problems);

    DispatchResult {
        reply: (!parts.is_empty()).then(|| parts.join("\n")),
        dirty: !changed.is_empty(),
        publish_reason: (!changed.is_empty()).then(|| reason(&changed)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::parser;

    fn ctx(sender: &str, is_moderator: bool) -> AuthContext {
        AuthContext {
            sender: sender.to_string(),
            is_moderator,
        }
    }

    fn roster_with(text: &str) -> Roster {
        let (roster, warnings) = parser::parse(text);
        assert!(warnings.is_empty());
        roster
    }

    #[test]
    fn test_creategroup_requires_moderator() {
        let mut roster = Roster::new();
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::CreateGroup {
                name: "NEWGROUP".to_string(),
            },
            &mut roster,
            &ctx("alice", false),
            &mut policy,
        );
        assert_eq!(result.reply.as_deref(), Some(messages::MOD_ONLY));
        assert!(!result.dirty);
        assert!(!roster.contains("NEWGROUP"));
    }

    #[test]
    fn test_creategroup_by_moderator() {
        let mut roster = Roster::new();
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::CreateGroup {
                name: "NEWGROUP".to_string(),
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(result.dirty);
        assert_eq!(roster.members_of("NEWGROUP").unwrap(), vec!["mod"]);
    }

    #[test]
    fn test_join_missing_and_existing() {
        let mut roster = roster_with("[FOO]\nalice\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Join {
                names: vec!["FOO".to_string(), "NOPE".to_string()],
            },
            &mut roster,
            &ctx("bob", false),
            &mut policy,
        );
        assert!(result.dirty);
        let reply = result.reply.unwrap();
        assert!(reply.contains("added to FOO"));
        assert!(reply.contains("NOPE does not exist"));
        assert_eq!(roster.members_of("FOO").unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_join_protected_group() {
        let mut roster = roster_with("[MODS]\nalice\n");
        let mut policy = GroupPolicy::default();
        policy.set_protected("MODS", true);
        let result = dispatch(
            Action::Join {
                names: vec!["MODS".to_string()],
            },
            &mut roster,
            &ctx("bob", false),
            &mut policy,
        );
        assert!(!result.dirty);
        assert!(result.reply.unwrap().contains("protected"));
    }

    #[test]
    fn test_protectgroup_lifecycle() {
        let mut roster = roster_with("[MODS]\nalice\n");
        let mut policy = GroupPolicy::default();

        let result = dispatch(
            Action::Protect {
                name: "MODS".to_string(),
                on: true,
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(result.policy_dirty);
        assert!(!result.dirty);
        assert!(policy.is_protected("MODS"));
        assert_eq!(
            result.publish_reason.as_deref(),
            Some("Marked group MODS protected")
        );

        // Toggling again is a no-op reply, no write-back.
        let again = dispatch(
            Action::Protect {
                name: "MODS".to_string(),
                on: true,
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(!again.policy_dirty);
        assert!(again.reply.unwrap().contains("already protected"));

        let off = dispatch(
            Action::Protect {
                name: "MODS".to_string(),
                on: false,
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(off.policy_dirty);
        assert!(!policy.is_protected("MODS"));
    }

    #[test]
    fn test_policy_verbs_require_moderator() {
        let mut roster = roster_with("[NEWS]\nalice\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::MakePublic {
                name: "NEWS".to_string(),
                on: true,
            },
            &mut roster,
            &ctx("alice", false),
            &mut policy,
        );
        assert_eq!(result.reply.as_deref(), Some(messages::MOD_ONLY));
        assert!(!result.policy_dirty);
        assert!(!policy.is_public("NEWS"));
    }

    #[test]
    fn test_policy_verbs_require_existing_group() {
        let mut roster = Roster::new();
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::MakePublic {
                name: "GHOST".to_string(),
                on: true,
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(!result.policy_dirty);
        assert!(result.reply.unwrap().contains("does not exist"));
    }

    #[test]
    fn test_makepublic_then_outsider_can_ping() {
        let mut roster = roster_with("[NEWS]\nalice\n");
        let mut policy = GroupPolicy::default();
        dispatch(
            Action::MakePublic {
                name: "NEWS".to_string(),
                on: true,
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );

        let result = dispatch(
            Action::Ping {
                groups: vec!["NEWS".to_string()],
                rejected: vec![],
                body: "!ping NEWS".to_string(),
            },
            &mut roster,
            &ctx("mallory", false),
            &mut policy,
        );
        assert_eq!(result.notifications.len(), 1);
        assert_eq!(result.notifications[0].recipient, "alice");
    }

    #[test]
    fn test_deletegroup_clears_policy_flags() {
        let mut roster = roster_with("[NEWS]\nalice\n");
        let mut policy = GroupPolicy::default();
        policy.set_public("NEWS", true);

        let result = dispatch(
            Action::DeleteGroup {
                name: "NEWS".to_string(),
            },
            &mut roster,
            &ctx("mod", true),
            &mut policy,
        );
        assert!(result.dirty);
        assert!(result.policy_dirty);
        assert!(!policy.is_public("NEWS"));
    }

    #[test]
    fn test_ping_excludes_sender() {
        let mut roster = roster_with("[FOO]\nalice\nbob\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Ping {
                groups: vec!["FOO".to_string()],
                rejected: vec![],
                body: "hey !ping FOO check this out".to_string(),
            },
            &mut roster,
            &ctx("bob", false),
            &mut policy,
        );
        let recipients: Vec<&str> = result
            .notifications
            .iter()
            .map(|n| n.recipient.as_str())
            .collect();
        assert_eq!(recipients, vec!["alice"]);
        assert!(!result.dirty);
        assert_eq!(result.reply.as_deref(), Some("Pinged members of FOO group."));
    }

    #[test]
    fn test_ping_requires_membership() {
        let mut roster = roster_with("[FOO]\nalice\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Ping {
                groups: vec!["FOO".to_string()],
                rejected: vec![],
                body: "!ping FOO".to_string(),
            },
            &mut roster,
            &ctx("mallory", false),
            &mut policy,
        );
        assert!(result.notifications.is_empty());
        assert!(result.reply.unwrap().contains("need to be a member"));
    }

    #[test]
    fn test_ping_missing_group_reported() {
        let mut roster = roster_with("[FOO]\nalice\nbob\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Ping {
                groups: vec!["FOO".to_string(), "GONE".to_string()],
                rejected: vec![],
                body: "!ping FOO+GONE".to_string(),
            },
            &mut roster,
            &ctx("alice", false),
            &mut policy,
        );
        let reply = result.reply.unwrap();
        assert!(reply.contains("Pinged members of FOO group."));
        assert!(reply.contains("GONE does not exist"));
        assert_eq!(result.notifications.len(), 1);
    }

    #[test]
    fn test_ping_dedups_across_groups() {
        let mut roster = roster_with("[A]\nalice\nbob\n\n[B]\nalice\ncarol\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Ping {
                groups: vec!["A".to_string(), "B".to_string()],
                rejected: vec![],
                body: "!ping A+B".to_string(),
            },
            &mut roster,
            &ctx("bob", true),
            &mut policy,
        );
        let recipients: Vec<&str> = result
            .notifications
            .iter()
            .map(|n| n.recipient.as_str())
            .collect();
        assert_eq!(recipients, vec!["alice", "carol"]);
    }

    #[test]
    fn test_unsubscribe_all() {
        let mut roster = roster_with("[A]\nalice\nbob\n\n[B]\nbob\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Unsubscribe { names: vec![] },
            &mut roster,
            &ctx("BOB", false),
            &mut policy,
        );
        assert!(result.dirty);
        assert_eq!(roster.members_of("A").unwrap(), vec!["alice"]);
        assert!(roster.members_of("B").unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_when_not_member() {
        let mut roster = roster_with("[A]\nalice\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::Unsubscribe { names: vec![] },
            &mut roster,
            &ctx("bob", false),
            &mut policy,
        );
        assert!(!result.dirty);
        assert_eq!(result.reply.as_deref(), Some(messages::NOT_IN_ANY_GROUP));
    }

    #[test]
    fn test_list_groups() {
        let mut roster = roster_with("[B]\nx\n\n[A]\ny\n");
        let mut policy = GroupPolicy::default();
        let result = dispatch(
            Action::ListGroups,
            &mut roster,
            &ctx("anyone", false),
            &mut policy,
        );
        assert_eq!(
            result.reply.as_deref(),
            Some("**Available groups:** A, B")
        );
        assert!(!result.dirty);
    }
}
