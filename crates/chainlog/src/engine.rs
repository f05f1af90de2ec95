// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! The leveled writer behind every logger.
//!
//! A [`Core`] owns a private `tracing` dispatcher built from a [`LogConfig`]:
//! a `tracing_subscriber` registry with one formatting layer that writes to
//! the logger's own sinks. Console formats use the `fmt` layer; JSON uses a
//! dedicated layer that lifts context fields to top-level keys. Records are
//! emitted with `tracing::dispatcher::with_default`, so each core is isolated
//! from the process-wide subscriber and from every other core.
//!
//! Level filtering happens here, before the event is built, using the
//! numeric threshold from the configuration.

use crate::config::{FatalAction, LogConfig, LogFormat, LogResult};
use crate::field::{fields_to_console, fields_to_json, Field};
use crate::json::JsonLayer;
use crate::level::Level;
use crate::sink::SinkSet;
use serde_json::Value as JsonValue;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use tracing::Dispatch;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

/// Target attached to every emitted event
pub const TARGET: &str = "chainlog";

/// Cheaply clonable handle to a configured writer
#[derive(Clone)]
pub struct Core {
    inner: Arc<CoreInner>,
}

#[derive(Clone)]
struct CoreInner {
    name: Option<String>,
    min_level: i8,
    disable_caller: bool,
    disable_stacktrace: bool,
    format: LogFormat,
    on_fatal: FatalAction,
    defaults: Vec<Field>,
    dispatch: Dispatch,
    sinks: Option<SinkSet>,
}

impl Core {
    /// Open the configured sinks and build the dispatcher
    pub fn build(config: &LogConfig) -> LogResult<Self> {
        let sinks = SinkSet::open(&config.outputs, &config.error_outputs)?;
        let dispatch = build_dispatch(config, &sinks);

        Ok(Core {
            inner: Arc::new(CoreInner {
                name: (!config.name.is_empty()).then(|| config.name.clone()),
                min_level: config.level,
                disable_caller: config.disable_caller,
                disable_stacktrace: config.disable_stacktrace,
                format: config.format,
                on_fatal: config.on_fatal,
                defaults: Vec::new(),
                dispatch,
                sinks: Some(sinks),
            }),
        })
    }

    /// Wrap a dispatcher built elsewhere
    ///
    /// The dispatcher owns its outputs, so [`Core::sync`] is a no-op.
    pub fn from_dispatch(dispatch: Dispatch, level: Level) -> Self {
        let defaults = LogConfig::default();
        Core {
            inner: Arc::new(CoreInner {
                name: None,
                min_level: level.as_i8(),
                disable_caller: defaults.disable_caller,
                disable_stacktrace: defaults.disable_stacktrace,
                format: defaults.format,
                on_fatal: defaults.on_fatal,
                defaults: Vec::new(),
                dispatch,
                sinks: None,
            }),
        }
    }

    fn derive(&self, change: impl FnOnce(&mut CoreInner)) -> Self {
        let mut inner = CoreInner::clone(&self.inner);
        change(&mut inner);
        Core {
            inner: Arc::new(inner),
        }
    }

    /// Core with extra fields attached to every record
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.derive(|inner| inner.defaults.extend(fields))
    }

    /// Core whose name is this name joined with `name` by a dot
    pub fn named(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        self.derive(|inner| {
            inner.name = Some(match inner.name.take() {
                Some(parent) => format!("{}.{}", parent, name),
                None => name.to_string(),
            });
        })
    }

    /// Logger name, if any
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Raw minimum level
    pub fn min_level(&self) -> i8 {
        self.inner.min_level
    }

    /// Fields attached to every record
    pub fn defaults(&self) -> &[Field] {
        &self.inner.defaults
    }

    /// Whether records at `level` are written
    pub fn enabled(&self, level: Level) -> bool {
        level.enabled_at(self.inner.min_level)
    }

    /// Write one record if `level` is enabled
    pub fn write(&self, level: Level, message: &str, fields: &[Field], caller: &Location<'_>) {
        if !self.enabled(level) {
            return;
        }

        let inner = &*self.inner;
        let mut all = Vec::with_capacity(inner.defaults.len() + fields.len());
        all.extend_from_slice(&inner.defaults);
        all.extend_from_slice(fields);

        let rendered = self.render(&all);
        let caller = (!inner.disable_caller).then(|| format!("{}:{}", caller.file(), caller.line()));
        let stacktrace = (!inner.disable_stacktrace && level >= Level::Error)
            .then(|| Backtrace::force_capture().to_string());
        let logger = inner.name.as_deref();
        let severity = level.as_str();

        tracing::dispatcher::with_default(&inner.dispatch, || {
            macro_rules! record {
                ($lvl:expr) => {
                    tracing::event!(
                        target: TARGET,
                        $lvl,
                        logger,
                        severity,
                        caller = caller.as_deref(),
                        fields = rendered.as_deref().map(display),
                        stacktrace = stacktrace.as_deref().map(display),
                        "{}",
                        message
                    )
                };
            }

            match level {
                Level::Debug => record!(tracing::Level::DEBUG),
                Level::Info => record!(tracing::Level::INFO),
                Level::Warn => record!(tracing::Level::WARN),
                Level::Error | Level::Panic | Level::Fatal => record!(tracing::Level::ERROR),
            }
        });
    }

    /// Write one record, then panic or exit
    ///
    /// Termination happens whether or not `level` is enabled. `Fatal`
    /// flushes the sinks first and then follows the configured
    /// [`FatalAction`]; every other level unwinds with the message.
    pub fn terminate(
        &self,
        level: Level,
        message: &str,
        fields: &[Field],
        caller: &Location<'_>,
    ) -> ! {
        self.write(level, message, fields, caller);
        if level == Level::Fatal {
            let _ = self.sync();
            if let FatalAction::Exit(code) = self.inner.on_fatal {
                std::process::exit(code);
            }
        }
        panic!("{}", message)
    }

    /// Flush every sink
    pub fn sync(&self) -> LogResult<()> {
        match &self.inner.sinks {
            Some(sinks) => sinks.sync(),
            None => Ok(()),
        }
    }

    fn render(&self, fields: &[Field]) -> Option<String> {
        if fields.is_empty() {
            return None;
        }
        Some(match self.inner.format {
            LogFormat::Json => JsonValue::Object(fields_to_json(fields)).to_string(),
            LogFormat::Pretty | LogFormat::Compact => fields_to_console(fields),
        })
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("name", &self.inner.name)
            .field("min_level", &self.inner.min_level)
            .field("format", &self.inner.format)
            .field("defaults", &self.inner.defaults.len())
            .field("sinks", &self.inner.sinks)
            .finish()
    }
}

/// Build the dispatcher for the configured format
fn build_dispatch(config: &LogConfig, sinks: &SinkSet) -> Dispatch {
    let encoder = &config.encoder;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => {
            let layer = tracing_fmt::layer()
                .with_writer(sinks.clone())
                .with_target(encoder.include_targets)
                .with_thread_ids(encoder.include_thread_ids)
                .with_thread_names(true)
                .with_ansi(encoder.use_color)
                .pretty();

            if encoder.use_timestamps {
                layer.with_timer(tracing_fmt::time::SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Compact => {
            let layer = tracing_fmt::layer()
                .with_writer(sinks.clone())
                .with_target(encoder.include_targets)
                .with_thread_ids(encoder.include_thread_ids)
                .with_thread_names(false)
                .with_ansi(encoder.use_color)
                .compact();

            if encoder.use_timestamps {
                layer.with_timer(tracing_fmt::time::SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Json => JsonLayer::new(sinks.clone(), *encoder).boxed(),
    };

    Dispatch::new(Registry::default().with(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::panic::AssertUnwindSafe;

    fn memory_core(level: Level) -> (Core, MemorySink) {
        let memory = MemorySink::new();
        let config = LogConfig::new()
            .with_level(level)
            .with_timestamps(false)
            .with_output(memory.clone())
            .with_error_output(MemorySink::new());
        (Core::build(&config).unwrap(), memory)
    }

    fn records(memory: &MemorySink) -> Vec<JsonValue> {
        memory
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_level_threshold_filters_records() {
        let (core, memory) = memory_core(Level::Warn);
        let here = Location::caller();

        core.write(Level::Debug, "debug", &[], here);
        core.write(Level::Info, "info", &[], here);
        core.write(Level::Warn, "warn", &[], here);
        core.write(Level::Error, "error", &[], here);

        let messages: Vec<_> = records(&memory)
            .iter()
            .map(|record| record["message"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(messages, vec!["warn", "error"]);
    }

    #[test]
    fn test_json_record_shape() {
        let (core, memory) = memory_core(Level::Info);
        let core = core.named("api").named("auth");

        core.write(
            Level::Info,
            "signed in",
            &[Field::string("user", "ada")],
            Location::caller(),
        );

        let record = &records(&memory)[0];
        assert_eq!(record["message"], "signed in");
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["severity"], "info");
        assert_eq!(record["logger"], "api.auth");
        assert!(record["caller"].as_str().unwrap().contains("engine.rs"));
        assert_eq!(record["user"], "ada");
        assert!(record.get("fields").is_none());
        assert!(record.get("stacktrace").is_none());
    }

    #[test]
    fn test_defaults_precede_record_fields() {
        let (core, memory) = memory_core(Level::Info);
        let core = core.with_fields([Field::string("service", "billing")]);

        core.write(Level::Info, "tick", &[Field::i64("n", 1)], Location::caller());

        let record = &records(&memory)[0];
        assert_eq!(record["service"], "billing");
        assert_eq!(record["n"], 1);
    }

    #[test]
    fn test_errors_carry_stacktrace_unless_disabled() {
        let (core, memory) = memory_core(Level::Info);
        core.write(Level::Error, "boom", &[], Location::caller());
        assert!(records(&memory)[0]["stacktrace"].is_string());

        let quiet = MemorySink::new();
        let config = LogConfig::new()
            .with_output(quiet.clone())
            .with_disable_stacktrace(true)
            .with_disable_caller(true);
        let core = Core::build(&config).unwrap();
        core.write(Level::Error, "boom", &[], Location::caller());
        let record = &records(&quiet)[0];
        assert!(record.get("stacktrace").is_none());
        assert!(record.get("caller").is_none());
    }

    #[test]
    fn test_compact_format_renders_pairs() {
        let memory = MemorySink::new();
        let config = LogConfig::new()
            .with_format(LogFormat::Compact)
            .with_timestamps(false)
            .with_output(memory.clone());
        let core = Core::build(&config).unwrap();

        core.write(Level::Warn, "slow", &[Field::i64("ms", 250)], Location::caller());

        let line = memory.contents();
        assert!(line.contains("WARN"));
        assert!(line.contains("slow"));
        assert!(line.contains("ms=250"));
    }

    #[test]
    fn test_panic_terminates_after_one_record() {
        let (core, memory) = memory_core(Level::Info);
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            core.terminate(Level::Panic, "unrecoverable", &[], Location::caller());
        }));

        assert!(result.is_err());
        let all = records(&memory);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["severity"], "panic");
    }

    #[test]
    fn test_disabled_terminal_level_still_unwinds() {
        let memory = MemorySink::new();
        let config = LogConfig::new()
            .with_level_value(6)
            .with_output(memory.clone())
            .with_fatal_action(FatalAction::Panic);
        let core = Core::build(&config).unwrap();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            core.terminate(Level::Fatal, "gone", &[], Location::caller());
        }));

        assert!(result.is_err());
        assert!(memory.lines().is_empty());
    }
}
