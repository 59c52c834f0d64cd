//! Shared utilities for the idobata relay.
//!
//! Cross-cutting concerns used by the server binary and its tests:
//! clock abstraction and logging setup.

pub mod logger;
pub mod time;
