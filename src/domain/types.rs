//! # Domain Types
//!
//! Common data structures and enums used across the application logic:
//! interpreted actions, dispatch results, and the error taxonomy.

use std::fmt;
use thiserror::Error;

/// Where an inbound message arrived from. Direct messages carry membership
/// commands; room messages are only scanned for pings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Direct,
    Room,
}

/// A fully interpreted inbound message, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateGroup {
        name: String,
    },
    DeleteGroup {
        name: String,
    },
    Join {
        names: Vec<String>,
    },
    Leave {
        names: Vec<String>,
    },
    /// Leave the listed groups, or every group when the list is empty.
    Unsubscribe {
        names: Vec<String>,
    },
    /// Moderator-only policy toggles, persisted in the policy document.
    Protect {
        name: String,
        on: bool,
    },
    MakePublic {
        name: String,
        on: bool,
    },
    ListGroups,
    Help,
    Ping {
        groups: Vec<String>,
        /// Tokens that looked like group names but failed validation.
        rejected: Vec<String>,
        body: String,
    },
}

/// Result of interpreting one message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Act(Action),
    Invalid(CommandError),
    /// Room message that references no ping at all. Ignored, not an error.
    NotAPing,
}

/// Identity context the dispatcher authorizes against.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub sender: String,
    pub is_moderator: bool,
}

/// A single outbound private message produced by a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient: String,
    pub body: String,
}

/// Everything one dispatched action wants the outside world to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    /// Reply for the requester, delivered over the channel they used.
    pub reply: Option<String>,
    pub notifications: Vec<Notification>,
    /// Set when the roster was mutated and must be written back.
    pub dirty: bool,
    /// Set when the policy document was mutated and must be written back.
    pub policy_dirty: bool,
    /// Revision reason recorded alongside a dirty write-back.
    pub publish_reason: Option<String>,
}

/// Membership-level failures, surfaced to the requesting user as replies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("group {0} already exists")]
    AlreadyExists(String),
    #[error("group {0} does not exist")]
    NotFound(String),
    #[error("{user} is already a member of group {group}")]
    AlreadyMember { group: String, user: String },
    #[error("{user} is not a member of group {group}")]
    NotMember { group: String, user: String },
}

/// Failures to make sense of a direct-message command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Malformed(String),
    #[error("unknown command \"{0}\"")]
    Unknown(String),
}

/// Failure to deliver a private message. Permanently-invalid recipients are
/// distinguished from transient platform errors so the router can prune
/// accounts that can never be reached again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("invalid recipient {0}")]
    InvalidRecipient(String),
    #[error("{0}")]
    Other(String),
}

/// One tolerated defect in the membership document. Collected in document
/// order; never aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}
