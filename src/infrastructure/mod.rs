//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (Messenger, DocumentStore).

pub mod matrix;
pub mod store;
