//! Shared utilities for Hiroba packages.
//!
//! Cross-cutting concerns that both the library and the binaries need:
//! logger initialization and epoch-timestamp helpers.

pub mod logger;
pub mod time;

pub use logger::setup_logger;
