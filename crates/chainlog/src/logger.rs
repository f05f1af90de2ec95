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
//! Configured loggers.
//!
//! A [`WrappedLogger`] owns one [`Core`] and hands out empty [`Chain`]s bound
//! to it. It also speaks the flat key/value convention through [`Log`].

use crate::chain::{Chain, CALLDEPTH_KEY};
use crate::config::{LogConfig, LogResult};
use crate::engine::Core;
use crate::field::{Field, Value};
use crate::format::{sprint, sprintf};
use crate::keyvals::pairs_to_fields;
use crate::level::Level;
use std::panic::Location;
use tracing::Dispatch;

/// Key/value logging interface shared by loggers and registries
///
/// `keyvals` is a flat `[key, value, ...]` sequence; see
/// [`pairs_to_fields`] for how malformed sequences are kept.
pub trait Log {
    /// Log at Debug with key/value context
    #[track_caller]
    fn debugw(&self, message: &str, keyvals: &[Value]);

    /// Log at Info with key/value context
    #[track_caller]
    fn infow(&self, message: &str, keyvals: &[Value]);

    /// Log at Warn with key/value context
    #[track_caller]
    fn warnw(&self, message: &str, keyvals: &[Value]);

    /// Log at Error with key/value context
    #[track_caller]
    fn errorw(&self, message: &str, keyvals: &[Value]);

    /// Log at Panic with key/value context, then unwind
    #[track_caller]
    fn panicw(&self, message: &str, keyvals: &[Value]) -> !;

    /// Log at Fatal with key/value context, then terminate
    #[track_caller]
    fn fatalw(&self, message: &str, keyvals: &[Value]) -> !;

    /// Fresh chain without context
    fn chain(&self) -> Chain;
}

/// A named, configured logger
#[derive(Clone, Debug)]
pub struct WrappedLogger {
    core: Core,
}

impl WrappedLogger {
    /// Build a logger named `name` with permanent `defaults` pairs
    ///
    /// Fails when an output cannot be opened.
    pub fn new(name: &str, config: &LogConfig, defaults: &[Value]) -> LogResult<Self> {
        let config = config.clone().with_name(name);
        Ok(Self::from_config(&config)?.with(defaults))
    }

    /// Build a logger named after `config.name`
    pub fn from_config(config: &LogConfig) -> LogResult<Self> {
        Ok(WrappedLogger {
            core: Core::build(config)?,
        })
    }

    /// Wrap an existing dispatcher, filtering below `level`
    pub fn wrap_dispatch(dispatch: Dispatch, level: Level) -> Self {
        WrappedLogger {
            core: Core::from_dispatch(dispatch, level),
        }
    }

    /// Logger with `keyvals` attached to every record; `self` is unchanged
    pub fn with(&self, keyvals: &[Value]) -> Self {
        WrappedLogger {
            core: self.core.with_fields(pairs_to_fields(keyvals)),
        }
    }

    /// Child logger whose name is joined to this one with a dot
    pub fn named(&self, name: &str) -> Self {
        WrappedLogger {
            core: self.core.named(name),
        }
    }

    /// Logger name, if any
    pub fn name(&self) -> Option<&str> {
        self.core.name()
    }

    /// Whether records at `level` are written
    pub fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    /// Fields attached to every record
    pub fn defaults(&self) -> &[Field] {
        self.core.defaults()
    }

    /// Flush the outputs
    pub fn sync(&self) -> LogResult<()> {
        self.core.sync()
    }

    /// Info record from concatenated values
    #[track_caller]
    pub fn print(&self, args: &[Value]) {
        self.core
            .write(Level::Info, &sprint(args), &[], Location::caller());
    }

    /// Info record from a printf-style template
    #[track_caller]
    pub fn printf(&self, template: &str, args: &[Value]) {
        self.core
            .write(Level::Info, &sprintf(template, args), &[], Location::caller());
    }

    /// Same as [`WrappedLogger::print`], kept for line-oriented call sites
    #[track_caller]
    pub fn println(&self, args: &[Value]) {
        self.core
            .write(Level::Info, &sprint(args), &[], Location::caller());
    }

    /// Info record carrying a `calldepth` field; always succeeds
    #[track_caller]
    pub fn output(&self, calldepth: i64, message: &str) -> LogResult<()> {
        self.core.write(
            Level::Info,
            message,
            &[Field::i64(CALLDEPTH_KEY, calldepth)],
            Location::caller(),
        );
        Ok(())
    }
}

impl Log for WrappedLogger {
    fn debugw(&self, message: &str, keyvals: &[Value]) {
        self.core
            .write(Level::Debug, message, &pairs_to_fields(keyvals), Location::caller());
    }

    fn infow(&self, message: &str, keyvals: &[Value]) {
        self.core
            .write(Level::Info, message, &pairs_to_fields(keyvals), Location::caller());
    }

    fn warnw(&self, message: &str, keyvals: &[Value]) {
        self.core
            .write(Level::Warn, message, &pairs_to_fields(keyvals), Location::caller());
    }

    fn errorw(&self, message: &str, keyvals: &[Value]) {
        self.core
            .write(Level::Error, message, &pairs_to_fields(keyvals), Location::caller());
    }

    fn panicw(&self, message: &str, keyvals: &[Value]) -> ! {
        self.core.terminate(
            Level::Panic,
            message,
            &pairs_to_fields(keyvals),
            Location::caller(),
        )
    }

    fn fatalw(&self, message: &str, keyvals: &[Value]) -> ! {
        self.core.terminate(
            Level::Fatal,
            message,
            &pairs_to_fields(keyvals),
            Location::caller(),
        )
    }

    fn chain(&self) -> Chain {
        Chain::new(self.core.clone())
    }
}
