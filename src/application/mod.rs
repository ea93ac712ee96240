//! # Application Layer
//!
//! Contains the core business logic of the bot: document parsing, the
//! membership roster, command interpretation, dispatch, per-message routing,
//! and the persistent seen-message cache.

pub mod dispatcher;
pub mod interpreter;
pub mod parser;
pub mod policy;
pub mod roster;
pub mod router;
pub mod state;
