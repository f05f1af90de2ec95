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
//! Shared logging configuration.
//!
//! A [`Registry`] holds a [`LogConfig`] together with the active
//! [`WrappedLogger`] behind one lock. Setters edit the configuration;
//! [`Registry::apply_config`] rebuilds the active logger from it. Two
//! entry points read the state differently:
//!
//! - leveled calls (`info`, `with_field`, ...) go through [`Registry::chain`],
//!   which uses a logger built from the current configuration, applied or not
//! - key/value calls (`infow`, `print`, ...) go through the active logger
//!
//! Chains already handed out keep the writer they were created with.

use crate::chain::Chain;
use crate::config::{EncoderConfig, LogConfig, LogFormat, LogResult, OutputTarget};
use crate::field::{Fields, Value};
use crate::logger::{Log, WrappedLogger};
use parking_lot::RwLock;
use std::error::Error as StdError;

struct State {
    config: LogConfig,
    active: WrappedLogger,
    current: Option<WrappedLogger>,
}

impl State {
    fn build(&self) -> LogResult<WrappedLogger> {
        WrappedLogger::from_config(&self.config)
    }

    fn invalidate(&mut self) {
        self.current = None;
    }
}

/// Configuration and active logger shared by many call sites
pub struct Registry {
    state: RwLock<State>,
}

impl Registry {
    /// Build the active logger from `config`
    pub fn new(config: LogConfig) -> LogResult<Self> {
        let active = WrappedLogger::from_config(&config)?;
        Ok(Registry {
            state: RwLock::new(State {
                config,
                current: Some(active.clone()),
                active,
            }),
        })
    }

    /// Registry configured from `LOG_*` environment variables
    pub fn from_env() -> LogResult<Self> {
        Self::new(LogConfig::from_env()?)
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> LogConfig {
        self.state.read().config.clone()
    }

    /// The active logger
    pub fn logger(&self) -> WrappedLogger {
        self.state.read().active.clone()
    }

    /// Chain bound to a logger built from the current configuration
    ///
    /// Loggers are rebuilt only after a setter changed the configuration.
    pub fn try_chain(&self) -> LogResult<Chain> {
        if let Some(current) = &self.state.read().current {
            return Ok(current.chain());
        }

        let mut state = self.state.write();
        if let Some(current) = &state.current {
            return Ok(current.chain());
        }
        let built = state.build()?;
        let chain = built.chain();
        state.current = Some(built);
        Ok(chain)
    }

    /// Like [`Registry::try_chain`], falling back to the active logger
    ///
    /// A build failure is logged through the active logger.
    pub fn chain(&self) -> Chain {
        match self.try_chain() {
            Ok(chain) => chain,
            Err(err) => {
                let fallback = self.logger().chain();
                fallback
                    .with_error(&err)
                    .error("Failed to build logger from current configuration", &[]);
                fallback
            }
        }
    }

    /// Set the minimum level
    pub fn set_level(&self, level: i8) {
        let mut state = self.state.write();
        state.config.level = level;
        state.invalidate();
    }

    /// Set the output format and its presentation options
    pub fn set_formatter(&self, format: LogFormat, encoder: EncoderConfig) {
        let mut state = self.state.write();
        state.config.format = format;
        state.config.encoder = encoder;
        state.invalidate();
    }

    /// Replace the outputs
    pub fn set_output(&self, output: impl Into<OutputTarget>) {
        let mut state = self.state.write();
        state.config.outputs = vec![output.into()];
        state.invalidate();
    }

    /// Replace the outputs where write failures are reported
    pub fn set_error_output(&self, output: impl Into<OutputTarget>) {
        let mut state = self.state.write();
        state.config.error_outputs = vec![output.into()];
        state.invalidate();
    }

    /// Attach `keyvals` to the active logger
    ///
    /// Only key/value calls see them; the next [`Registry::apply_config`]
    /// replaces the active logger and drops them.
    pub fn with(&self, keyvals: &[Value]) {
        let mut state = self.state.write();
        state.active = state.active.with(keyvals);
    }

    /// Rebuild the active logger from the current configuration
    ///
    /// On failure the previous logger stays active.
    pub fn apply_config(&self) -> LogResult<()> {
        let mut state = self.state.write();
        let rebuilt = state.build()?;
        let previous = std::mem::replace(&mut state.active, rebuilt);
        state.current = Some(state.active.clone());
        drop(state);

        let _ = previous.sync();
        Ok(())
    }

    /// Flush the active logger
    pub fn shutdown(&self) -> LogResult<()> {
        self.logger().sync()
    }

    /// Log at Debug through a fresh chain
    #[track_caller]
    pub fn debug(&self, message: &str, args: &[Value]) -> Chain {
        let chain = self.chain();
        chain.debug(message, args);
        chain
    }

    /// Log at Info through a fresh chain
    #[track_caller]
    pub fn info(&self, message: &str, args: &[Value]) -> Chain {
        let chain = self.chain();
        chain.info(message, args);
        chain
    }

    /// Log at Warn through a fresh chain
    #[track_caller]
    pub fn warn(&self, message: &str, args: &[Value]) -> Chain {
        let chain = self.chain();
        chain.warn(message, args);
        chain
    }

    /// Alias of [`Registry::warn`]
    #[track_caller]
    pub fn warning(&self, message: &str, args: &[Value]) -> Chain {
        self.warn(message, args)
    }

    /// Log at Error through a fresh chain
    #[track_caller]
    pub fn error(&self, message: &str, args: &[Value]) -> Chain {
        let chain = self.chain();
        chain.error(message, args);
        chain
    }

    /// Log at Panic, then unwind
    #[track_caller]
    pub fn panic(&self, message: &str, args: &[Value]) -> ! {
        self.chain().panic(message, args)
    }

    /// Log at Fatal, then terminate
    #[track_caller]
    pub fn fatal(&self, message: &str, args: &[Value]) -> ! {
        self.chain().fatal(message, args)
    }

    /// Info record from concatenated values
    #[track_caller]
    pub fn print(&self, args: &[Value]) {
        self.logger().print(args);
    }

    /// Info record from a printf-style template
    #[track_caller]
    pub fn printf(&self, template: &str, args: &[Value]) {
        self.logger().printf(template, args);
    }

    /// Same as [`Registry::print`]
    #[track_caller]
    pub fn println(&self, args: &[Value]) {
        self.logger().println(args);
    }

    /// Fresh chain with one field
    pub fn with_field(&self, key: &str, value: impl Into<Value>) -> Chain {
        self.chain().with_any(key, value)
    }

    /// Fresh chain with an error under the `error` key
    pub fn with_error(&self, err: &dyn StdError) -> Chain {
        self.chain().with_error(err)
    }

    /// Fresh chain with one field per map entry
    pub fn with_fields(&self, fields: &Fields) -> Chain {
        self.chain().with_fields(fields)
    }
}

impl Log for Registry {
    fn debugw(&self, message: &str, keyvals: &[Value]) {
        self.logger().debugw(message, keyvals);
    }

    fn infow(&self, message: &str, keyvals: &[Value]) {
        self.logger().infow(message, keyvals);
    }

    fn warnw(&self, message: &str, keyvals: &[Value]) {
        self.logger().warnw(message, keyvals);
    }

    fn errorw(&self, message: &str, keyvals: &[Value]) {
        self.logger().errorw(message, keyvals);
    }

    fn panicw(&self, message: &str, keyvals: &[Value]) -> ! {
        self.logger().panicw(message, keyvals)
    }

    fn fatalw(&self, message: &str, keyvals: &[Value]) -> ! {
        self.logger().fatalw(message, keyvals)
    }

    fn chain(&self) -> Chain {
        Registry::chain(self)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("config", &state.config)
            .field("active", &state.active)
            .finish()
    }
}
