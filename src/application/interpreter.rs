//! # Command Interpreter
//!
//! Turns an inbound message body into an [`Action`]. Two grammars share this
//! surface: direct messages carry membership commands (`join FOO`,
//! `creategroup BAR`, ...), while room messages are only scanned for
//! `!ping GROUP` requests. Authorization is not checked here; the
//! dispatcher owns that.

use crate::application::roster;
use crate::domain::types::{Action, CommandError, Interpretation, Source};
use crate::strings::messages;

/// The ping trigger token, matched case-insensitively.
const PING_TRIGGER: &str = "!PING";

pub fn interpret(body: &str, source: Source, max_pings: usize) -> Interpretation {
    match source {
        Source::Direct => match interpret_command(body) {
            Ok(action) => Interpretation::Act(action),
            Err(err) => Interpretation::Invalid(err),
        },
        Source::Room => match scan_pings(body, max_pings) {
            Some(action) => Interpretation::Act(action),
            None => Interpretation::NotAPing,
        },
    }
}

/// Split a command argument like `DAD+USA-CVILLE` or `DAD, USA-CVILLE`
/// into individual canonical group names.
fn split_group_list(data: &str) -> Vec<String> {
    data.replace(", ", "+")
        .replace(',', "+")
        .split('+')
        .map(roster::canonical_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// First word is the verb, the remainder its argument.
fn interpret_command(body: &str) -> Result<Action, CommandError> {
    let body = body.trim();
    let (verb, data) = match body.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (body, ""),
    };

    match verb.to_lowercase().as_str() {
        "creategroup" => Ok(Action::CreateGroup {
            name: validated_name(data, messages::CREATEGROUP_USAGE)?,
        }),
        "deletegroup" => Ok(Action::DeleteGroup {
            name: validated_name(data, messages::DELETEGROUP_USAGE)?,
        }),
        // `addtogroup`/`removefromgroup` are the verbs the original
        // deployment documented; kept as aliases so old links still work.
        "join" | "addtogroup" => Ok(Action::Join {
            names: required_group_list(data, messages::JOIN_USAGE)?,
        }),
        "leave" | "removefromgroup" => Ok(Action::Leave {
            names: required_group_list(data, messages::LEAVE_USAGE)?,
        }),
        "protectgroup" => Ok(Action::Protect {
            name: validated_name(data, messages::PROTECTGROUP_USAGE)?,
            on: true,
        }),
        "unprotectgroup" => Ok(Action::Protect {
            name: validated_name(data, messages::UNPROTECTGROUP_USAGE)?,
            on: false,
        }),
        "makepublicgroup" => Ok(Action::MakePublic {
            name: validated_name(data, messages::MAKEPUBLICGROUP_USAGE)?,
            on: true,
        }),
        "makeprivategroup" => Ok(Action::MakePublic {
            name: validated_name(data, messages::MAKEPRIVATEGROUP_USAGE)?,
            on: false,
        }),
        "unsubscribe" => Ok(Action::Unsubscribe {
            names: split_group_list(data),
        }),
        "list" => Ok(Action::ListGroups),
        "help" | "" => Ok(Action::Help),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn validated_name(data: &str, usage: &str) -> Result<String, CommandError> {
    let name = roster::canonical_name(data);
    if name.is_empty() {
        return Err(CommandError::Malformed(usage.to_string()));
    }
    if !roster::valid_name(&name) {
        return Err(CommandError::Malformed(messages::invalid_group_name(&name)));
    }
    Ok(name)
}

fn required_group_list(data: &str, usage: &str) -> Result<Vec<String>, CommandError> {
    let names = split_group_list(data);
    if names.is_empty() {
        return Err(CommandError::Malformed(usage.to_string()));
    }
    Ok(names)
}

/// Scan a room message for `!ping` requests.
///
/// The token following each `!ping` names the group(s) to ping, with `+` as
/// the union operator (`!ping DAD+USA-CVILLE`). Surrounding punctuation is
/// stripped so `!ping FOO.` still works; `-` stays, it is part of many group
/// names. At most `max_pings` groups dispatch per message; tokens with
/// disallowed characters are collected so the requester can be told.
fn scan_pings(body: &str, max_pings: usize) -> Option<Action> {
    let words: Vec<String> = body
        .split_whitespace()
        .map(|w| w.to_ascii_uppercase())
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for (idx, word) in words.iter().enumerate() {
        if word.as_str() == PING_TRIGGER
            && let Some(next) = words.get(idx + 1)
        {
            tokens.extend(next.split('+').map(str::to_string));
        }
    }
    if tokens.is_empty() {
        return None;
    }

    let mut groups: Vec<String> = Vec::new();
    let mut rejected: Vec<String> = Vec::new();
    for token in &tokens {
        let name = token
            .trim_matches(|c: char| c.is_ascii_punctuation() && c != '-')
            .to_string();
        if name.is_empty() {
            continue;
        }
        if !roster::valid_name(&name) {
            rejected.push(name);
        } else if !groups.contains(&name) {
            groups.push(name);
        }
    }
    if groups.is_empty() && rejected.is_empty() {
        return None;
    }

    groups.truncate(max_pings);
    Some(Action::Ping {
        groups,
        rejected,
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(body: &str, source: Source) -> Action {
        match interpret(body, source, 3) {
            Interpretation::Act(action) => action,
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_creategroup() {
        assert_eq!(
            act("creategroup usa-cville", Source::Direct),
            Action::CreateGroup {
                name: "USA-CVILLE".to_string()
            }
        );
    }

    #[test]
    fn test_creategroup_missing_name() {
        assert!(matches!(
            interpret("creategroup", Source::Direct, 3),
            Interpretation::Invalid(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_creategroup_bad_characters() {
        assert!(matches!(
            interpret("creategroup no_way", Source::Direct, 3),
            Interpretation::Invalid(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_join_multiple_separators() {
        let expected = Action::Join {
            names: vec!["DAD".to_string(), "USA-CVILLE".to_string()],
        };
        assert_eq!(act("join DAD+USA-CVILLE", Source::Direct), expected);
        assert_eq!(act("join DAD, USA-CVILLE", Source::Direct), expected);
        assert_eq!(act("addtogroup dad,usa-cville", Source::Direct), expected);
    }

    #[test]
    fn test_leave_and_unsubscribe() {
        assert_eq!(
            act("leave foo", Source::Direct),
            Action::Leave {
                names: vec!["FOO".to_string()]
            }
        );
        assert_eq!(
            act("unsubscribe", Source::Direct),
            Action::Unsubscribe { names: vec![] }
        );
    }

    #[test]
    fn test_policy_verbs() {
        assert_eq!(
            act("protectgroup mods", Source::Direct),
            Action::Protect {
                name: "MODS".to_string(),
                on: true
            }
        );
        assert_eq!(
            act("unprotectgroup MODS", Source::Direct),
            Action::Protect {
                name: "MODS".to_string(),
                on: false
            }
        );
        assert_eq!(
            act("makepublicgroup news", Source::Direct),
            Action::MakePublic {
                name: "NEWS".to_string(),
                on: true
            }
        );
        assert_eq!(
            act("makeprivategroup news", Source::Direct),
            Action::MakePublic {
                name: "NEWS".to_string(),
                on: false
            }
        );
        assert!(matches!(
            interpret("protectgroup", Source::Direct, 3),
            Interpretation::Invalid(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            interpret("frobnicate FOO", Source::Direct, 3),
            Interpretation::Invalid(CommandError::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_ping_simple() {
        let action = act("hey !ping FOO check this out", Source::Room);
        match action {
            Action::Ping { groups, rejected, .. } => {
                assert_eq!(groups, vec!["FOO"]);
                assert!(rejected.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ping_union_and_punctuation() {
        let action = act("!ping DAD+USA-CVILLE.", Source::Room);
        match action {
            Action::Ping { groups, .. } => {
                assert_eq!(groups, vec!["DAD", "USA-CVILLE"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ping_cap() {
        let action = act("!ping A !ping B !ping C !ping D", Source::Room);
        match action {
            Action::Ping { groups, .. } => assert_eq!(groups, vec!["A", "B", "C"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ping_rejects_bad_tokens() {
        let action = act("!ping GOOD+B_D", Source::Room);
        match action {
            Action::Ping { groups, rejected, .. } => {
                assert_eq!(groups, vec!["GOOD"]);
                assert_eq!(rejected, vec!["B_D"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_a_ping() {
        assert_eq!(
            interpret("just chatting about pings", Source::Room, 3),
            Interpretation::NotAPing
        );
        // Trailing trigger with nothing after it
        assert_eq!(
            interpret("!ping", Source::Room, 3),
            Interpretation::NotAPing
        );
    }

    #[test]
    fn test_ping_dedup() {
        let action = act("!ping FOO !ping foo", Source::Room);
        match action {
            Action::Ping { groups, .. } => assert_eq!(groups, vec!["FOO"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
