//! Configuration for the shell dispatch layer.
//!
//! The node's outer configuration loader deserializes a [`ShellConfig`]
//! section and hands it to [`crate::Shell::new`]. Defaults are chosen so an
//! empty section yields a working layer.

use serde::Deserialize;
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Configuration for the dispatch layer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Filter expression for the tracing subscriber.
    pub log_filter: String,
    /// Output format for the tracing subscriber.
    pub log_format: LogFormat,
    /// Maximum number of simultaneously issued query handles.
    ///
    /// Bounds the handle table: a node drowning in unreleased handles fails
    /// new queries with an explicit code instead of growing without limit.
    pub handle_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            log_format: LogFormat::default(),
            handle_capacity: 10_000,
        }
    }
}
