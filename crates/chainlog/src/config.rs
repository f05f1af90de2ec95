//! Configuration for chained structured logging.
//!
//! This module provides the types used to build a logger: output format,
//! minimum level, sinks, caller and stacktrace toggles, and the behavior of
//! fatal records. Configuration can be assembled with the builder methods on
//! [`LogConfig`] or loaded from `LOG_*` environment variables.

use crate::level::{parse_threshold, Level};
use crate::sink::MemorySink;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of the environment variables read by [`LogConfig::from_env`]
pub const ENV_PREFIX: &str = "LOG";

/// Errors that can occur while configuring or building a logger
#[derive(Error, Debug)]
pub enum LogError {
    /// A level name or number could not be parsed
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Flushing or writing a sink failed
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// The configuration is inconsistent or the logger is in the wrong state
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An environment variable held an unparseable value
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsingError {
        /// Name of the offending variable
        variable_name: String,
        /// Raw value
        value: String,
        /// What was expected instead
        reason: String,
    },

    /// An output file could not be opened
    #[error("Failed to open log output {}: {source}", .path.display())]
    OpenSink {
        /// Path of the output
        path: PathBuf,
        /// Underlying IO failure
        source: io::Error,
    },
}

impl LogError {
    /// Build an [`LogError::EnvVarParsingError`]
    pub fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LogError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate
pub type LogResult<T> = Result<T, LogError>;

/// Output format for records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable formatting
    Pretty,

    /// Compact single-line format, also accepted as `console`
    Compact,

    /// JSON format for machine-readable logs
    #[default]
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" | "console" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::ConfigError(format!(
                "Unknown format: {}. Expected one of: pretty, compact, console, json",
                s
            ))),
        }
    }
}

/// Presentation options handed to the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Whether to use colored output (ignored by JSON)
    pub use_color: bool,

    /// Whether to include timestamps in output
    pub use_timestamps: bool,

    /// Whether to include thread IDs in output
    pub include_thread_ids: bool,

    /// Whether to include the record target
    pub include_targets: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            use_color: false,
            use_timestamps: true,
            include_thread_ids: false,
            include_targets: true,
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    /// Write to standard error
    Stderr,

    /// Write to standard output
    Stdout,

    /// Append to a file, creating it if needed
    File(PathBuf),

    /// Capture into memory
    Memory(MemorySink),
}

impl From<&str> for OutputTarget {
    /// `stdout` and `stderr` name the standard streams, anything else is a path
    fn from(value: &str) -> Self {
        match value {
            "stdout" => OutputTarget::Stdout,
            "stderr" => OutputTarget::Stderr,
            path => OutputTarget::File(PathBuf::from(path)),
        }
    }
}

impl From<PathBuf> for OutputTarget {
    fn from(value: PathBuf) -> Self {
        OutputTarget::File(value)
    }
}

impl From<MemorySink> for OutputTarget {
    fn from(value: MemorySink) -> Self {
        OutputTarget::Memory(value)
    }
}

/// What happens after a fatal record has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalAction {
    /// Flush sinks and exit the process with the given code
    Exit(i32),

    /// Unwind like a panic record
    Panic,
}

impl Default for FatalAction {
    fn default() -> Self {
        FatalAction::Exit(1)
    }
}

/// Configuration for a logger
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Logger name, empty for none
    pub name: String,

    /// Minimum enabled level, see [`Level`] for the numbering
    pub level: i8,

    /// Omit the `caller` location from records
    pub disable_caller: bool,

    /// Omit stack traces from error records
    pub disable_stacktrace: bool,

    /// Output format
    pub format: LogFormat,

    /// Formatter presentation options
    pub encoder: EncoderConfig,

    /// Where records are written
    pub outputs: Vec<OutputTarget>,

    /// Where write failures are reported
    pub error_outputs: Vec<OutputTarget>,

    /// Behavior after a fatal record
    pub on_fatal: FatalAction,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            name: String::new(),
            level: Level::Info.as_i8(),
            disable_caller: false,
            disable_stacktrace: false,
            format: LogFormat::Json,
            encoder: EncoderConfig::default(),
            outputs: vec![OutputTarget::Stderr],
            error_outputs: vec![OutputTarget::Stderr],
            on_fatal: FatalAction::default(),
        }
    }
}

impl LogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `LOG_*` environment variables
    pub fn from_env() -> LogResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Defaults overridden by `{prefix}_NAME`, `{prefix}_LEVEL`,
    /// `{prefix}_DISABLE_CALLER` and `{prefix}_DISABLE_STACKTRACE`
    pub fn from_env_with_prefix(prefix: &str) -> LogResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(prefix)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> LogResult<()> {
        if let Ok(value) = std::env::var(format!("{}_NAME", prefix)) {
            self.name = value;
        }
        let variable = format!("{}_LEVEL", prefix);
        if let Ok(value) = std::env::var(&variable) {
            self.level = parse_threshold(&value).map_err(|_| {
                LogError::env_var_parsing_error(
                    &variable,
                    &value,
                    "expected an integer in -128..=127 or a level name",
                )
            })?;
        }
        let variable = format!("{}_DISABLE_CALLER", prefix);
        if let Ok(value) = std::env::var(&variable) {
            self.disable_caller = parse_bool(&variable, &value)?;
        }
        let variable = format!("{}_DISABLE_STACKTRACE", prefix);
        if let Ok(value) = std::env::var(&variable) {
            self.disable_stacktrace = parse_bool(&variable, &value)?;
        }
        Ok(())
    }

    /// Set the logger name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level.as_i8();
        self
    }

    /// Set the minimum level from its raw numeric value
    pub fn with_level_value(mut self, level: i8) -> Self {
        self.level = level;
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the formatter presentation options
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Enable or disable color output
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.encoder.use_color = use_color;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, use_timestamps: bool) -> Self {
        self.encoder.use_timestamps = use_timestamps;
        self
    }

    /// Enable or disable thread IDs
    pub fn with_thread_ids(mut self, include_thread_ids: bool) -> Self {
        self.encoder.include_thread_ids = include_thread_ids;
        self
    }

    /// Enable or disable record targets
    pub fn with_targets(mut self, include_targets: bool) -> Self {
        self.encoder.include_targets = include_targets;
        self
    }

    /// Replace the outputs with a single destination
    pub fn with_output(mut self, output: impl Into<OutputTarget>) -> Self {
        self.outputs = vec![output.into()];
        self
    }

    /// Add another destination
    pub fn add_output(mut self, output: impl Into<OutputTarget>) -> Self {
        self.outputs.push(output.into());
        self
    }

    /// Replace the error outputs with a single destination
    pub fn with_error_output(mut self, output: impl Into<OutputTarget>) -> Self {
        self.error_outputs = vec![output.into()];
        self
    }

    /// Enable or disable caller locations
    pub fn with_disable_caller(mut self, disable_caller: bool) -> Self {
        self.disable_caller = disable_caller;
        self
    }

    /// Enable or disable error stack traces
    pub fn with_disable_stacktrace(mut self, disable_stacktrace: bool) -> Self {
        self.disable_stacktrace = disable_stacktrace;
        self
    }

    /// Set what happens after a fatal record
    pub fn with_fatal_action(mut self, on_fatal: FatalAction) -> Self {
        self.on_fatal = on_fatal;
        self
    }

    /// Minimum level as a named level, if the raw value names one
    pub fn named_level(&self) -> Option<Level> {
        Level::from_i8(self.level)
    }
}

fn parse_bool(variable: &str, value: &str) -> LogResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(LogError::env_var_parsing_error(
            variable,
            value,
            "expected a boolean (true/false, 1/0, yes/no, on/off)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("console".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("invalid".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_case_insensitive() {
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new()
            .with_format(LogFormat::Compact)
            .with_level(Level::Debug)
            .with_color(true)
            .with_timestamps(false)
            .with_name("billing");

        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, -1);
        assert_eq!(config.named_level(), Some(Level::Debug));
        assert!(config.encoder.use_color);
        assert!(!config.encoder.use_timestamps);
        assert_eq!(config.name, "billing");
    }

    #[test]
    fn test_defaults_match_production_profile() {
        let config = LogConfig::default();
        assert_eq!(config.level, 0);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.outputs, vec![OutputTarget::Stderr]);
        assert_eq!(config.error_outputs, vec![OutputTarget::Stderr]);
        assert_eq!(config.on_fatal, FatalAction::Exit(1));
    }

    #[test]
    fn test_output_target_from_str() {
        assert_eq!(OutputTarget::from("stdout"), OutputTarget::Stdout);
        assert_eq!(OutputTarget::from("stderr"), OutputTarget::Stderr);
        assert_eq!(
            OutputTarget::from("./app.log"),
            OutputTarget::File(PathBuf::from("./app.log"))
        );
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("X", "Yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_env_overrides_with_prefix() {
        std::env::set_var("CHAINLOG_UNIT_NAME", "worker");
        std::env::set_var("CHAINLOG_UNIT_LEVEL", "3");
        std::env::set_var("CHAINLOG_UNIT_DISABLE_CALLER", "true");

        let config = LogConfig::from_env_with_prefix("CHAINLOG_UNIT").unwrap();
        assert_eq!(config.name, "worker");
        assert_eq!(config.level, 3);
        assert!(config.disable_caller);
        assert!(!config.disable_stacktrace);
    }

    #[test]
    fn test_env_invalid_level_is_rejected() {
        std::env::set_var("CHAINLOG_BAD_LEVEL", "loudest");
        let err = LogConfig::from_env_with_prefix("CHAINLOG_BAD").unwrap_err();
        assert!(matches!(err, LogError::EnvVarParsingError { .. }));
    }
}
