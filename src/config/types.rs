use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Settings for the action logger middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Master switch (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Level the action span and its events are emitted at (default: debug).
    #[serde(default)]
    pub level: LogLevel,
    /// Log the bound state before and after each call (default: true).
    #[serde(default = "default_include_state")]
    pub include_state: bool,
    /// Log call arguments (default: true).
    #[serde(default = "default_include_args")]
    pub include_args: bool,
    /// Action paths never logged, e.g. `"clock.tick"`.
    #[serde(default)]
    pub skip: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
}

fn default_enabled() -> bool {
    true
}

fn default_include_state() -> bool {
    true
}

fn default_include_args() -> bool {
    true
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            level: LogLevel::default(),
            include_state: default_include_state(),
            include_args: default_include_args(),
            skip: Vec::new(),
        }
    }
}
