//! # Strings Module
//!
//! Centralizes user-facing strings and reply templates.
//! Ensures consistency in messaging and easier updates.

pub mod help;
pub mod messages;
