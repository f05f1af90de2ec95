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
//! Process-wide default registry.
//!
//! The default [`Registry`] is created from `LOG_*` environment variables on
//! first use, unless [`init`] installed a configuration earlier. Every
//! function here forwards to it.
//!
//! # Example
//!
//! ```ignore
//! use chainlog::{global, Value};
//!
//! global::with(&[Value::from("service"), Value::from("billing")]);
//! global::info("started on port %d", &[Value::from(8080)]);
//! global::infow("ready", &[Value::from("workers"), Value::from(4)]);
//! ```

use crate::chain::Chain;
use crate::config::{EncoderConfig, LogConfig, LogError, LogFormat, LogResult, OutputTarget};
use crate::field::{Fields, Value};
use crate::logger::{Log, WrappedLogger};
use crate::registry::Registry;
use std::error::Error as StdError;
use std::sync::OnceLock;

pub use crate::keyvals::chain_with;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The default registry, created from the environment on first use
///
/// # Panics
///
/// Panics when the environment holds an invalid configuration or an output
/// cannot be opened.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| match Registry::from_env() {
        Ok(registry) => registry,
        Err(err) => panic!("Unable to initialize default logger: {}", err),
    })
}

/// Install `config` as the default configuration
///
/// Fails when the default registry already exists.
pub fn init(config: LogConfig) -> LogResult<&'static Registry> {
    if REGISTRY.get().is_some() {
        return Err(already_initialized());
    }
    let registry = Registry::new(config)?;
    REGISTRY.set(registry).map_err(|_| already_initialized())?;
    Ok(self::registry())
}

fn already_initialized() -> LogError {
    LogError::ConfigError("Default logger is already initialized".to_string())
}

/// See [`Registry::logger`]
pub fn logger() -> WrappedLogger {
    registry().logger()
}

/// See [`Registry::config`]
pub fn config() -> LogConfig {
    registry().config()
}

/// See [`Registry::chain`]
pub fn chain() -> Chain {
    registry().chain()
}

/// See [`Registry::try_chain`]
pub fn try_chain() -> LogResult<Chain> {
    registry().try_chain()
}

/// See [`Registry::set_level`]
pub fn set_level(level: i8) {
    registry().set_level(level);
}

/// See [`Registry::set_formatter`]
pub fn set_formatter(format: LogFormat, encoder: EncoderConfig) {
    registry().set_formatter(format, encoder);
}

/// See [`Registry::set_output`]
pub fn set_output(output: impl Into<OutputTarget>) {
    registry().set_output(output);
}

/// See [`Registry::set_error_output`]
pub fn set_error_output(output: impl Into<OutputTarget>) {
    registry().set_error_output(output);
}

/// See [`Registry::with`]
pub fn with(keyvals: &[Value]) {
    registry().with(keyvals);
}

/// See [`Registry::apply_config`]
pub fn apply_config() -> LogResult<()> {
    registry().apply_config()
}

/// See [`Registry::shutdown`]
pub fn shutdown() -> LogResult<()> {
    registry().shutdown()
}

/// See [`Registry::debug`]
#[track_caller]
pub fn debug(message: &str, args: &[Value]) -> Chain {
    registry().debug(message, args)
}

/// See [`Registry::info`]
#[track_caller]
pub fn info(message: &str, args: &[Value]) -> Chain {
    registry().info(message, args)
}

/// See [`Registry::warn`]
#[track_caller]
pub fn warn(message: &str, args: &[Value]) -> Chain {
    registry().warn(message, args)
}

/// See [`Registry::warning`]
#[track_caller]
pub fn warning(message: &str, args: &[Value]) -> Chain {
    registry().warning(message, args)
}

/// See [`Registry::error`]
#[track_caller]
pub fn error(message: &str, args: &[Value]) -> Chain {
    registry().error(message, args)
}

/// See [`Registry::panic`]
#[track_caller]
pub fn panic(message: &str, args: &[Value]) -> ! {
    registry().panic(message, args)
}

/// See [`Registry::fatal`]
#[track_caller]
pub fn fatal(message: &str, args: &[Value]) -> ! {
    registry().fatal(message, args)
}

/// See [`Log::debugw`]
#[track_caller]
pub fn debugw(message: &str, keyvals: &[Value]) {
    registry().debugw(message, keyvals);
}

/// See [`Log::infow`]
#[track_caller]
pub fn infow(message: &str, keyvals: &[Value]) {
    registry().infow(message, keyvals);
}

/// See [`Log::warnw`]
#[track_caller]
pub fn warnw(message: &str, keyvals: &[Value]) {
    registry().warnw(message, keyvals);
}

/// See [`Log::errorw`]
#[track_caller]
pub fn errorw(message: &str, keyvals: &[Value]) {
    registry().errorw(message, keyvals);
}

/// See [`Log::panicw`]
#[track_caller]
pub fn panicw(message: &str, keyvals: &[Value]) -> ! {
    registry().panicw(message, keyvals)
}

/// See [`Log::fatalw`]
#[track_caller]
pub fn fatalw(message: &str, keyvals: &[Value]) -> ! {
    registry().fatalw(message, keyvals)
}

/// See [`Registry::print`]
#[track_caller]
pub fn print(args: &[Value]) {
    registry().print(args);
}

/// See [`Registry::printf`]
#[track_caller]
pub fn printf(template: &str, args: &[Value]) {
    registry().printf(template, args);
}

/// See [`Registry::println`]
#[track_caller]
pub fn println(args: &[Value]) {
    registry().println(args);
}

/// See [`Registry::with_field`]
pub fn with_field(key: &str, value: impl Into<Value>) -> Chain {
    registry().with_field(key, value)
}

/// See [`Registry::with_error`]
pub fn with_error(err: &dyn StdError) -> Chain {
    registry().with_error(err)
}

/// See [`Registry::with_fields`]
pub fn with_fields(fields: &Fields) -> Chain {
    registry().with_fields(fields)
}
