//! UI-facing helpers for chat frontends.

pub mod log;

pub use log::{ChatLog, LogChange};
