//! Wiring for the `docqa` binary: layered configuration, command runners and
//! output rendering.

pub mod app;
pub mod config;
pub mod report;

pub use config::{ConfigError, DocqaConfig, EmbedMode};
