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
//! Immutable context chains.
//!
//! A [`Chain`] pairs a writer with an ordered list of fields. The list is
//! frozen once the chain exists: every `with_*` call copies it, appends, and
//! returns a new chain, leaving the receiver untouched. Chains are `Send +
//! Sync` and can be shared between threads or branched into sibling paths
//! without coordination.
//!
//! # Example
//!
//! ```ignore
//! let request = logger.chain().with_string("request_id", "req-001");
//! let db = request.with_string("component", "db");
//!
//! db.info("query took %dms", &[Value::from(12)]);
//! request.warn("slow request", &[]); // has no "component" field
//! ```

use crate::config::LogResult;
use crate::engine::Core;
use crate::field::{Field, Fields, Value};
use crate::format::{prepare, sprint, sprintf};
use crate::keyvals::{classify, pairs_to_fields, LogCall};
use crate::level::Level;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

/// Key of the field added by [`Chain::output`]
pub const CALLDEPTH_KEY: &str = "calldepth";

/// Copy-on-write accumulator of contextual fields bound to one writer
#[derive(Clone)]
pub struct Chain {
    core: Core,
    fields: Arc<[Field]>,
}

impl Chain {
    pub(crate) fn new(core: Core) -> Self {
        Chain {
            core,
            fields: Arc::from(Vec::new()),
        }
    }

    /// Fields accumulated so far, in attach order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Chain with `extra` appended after the current fields
    pub fn with_all(&self, extra: impl IntoIterator<Item = Field>) -> Chain {
        let extra = extra.into_iter();
        let mut fields = Vec::with_capacity(self.fields.len() + extra.size_hint().0);
        fields.extend(self.fields.iter().cloned());
        fields.extend(extra);
        Chain {
            core: self.core.clone(),
            fields: fields.into(),
        }
    }

    /// Chain with one more field
    pub fn with(&self, field: Field) -> Chain {
        self.with_all(std::iter::once(field))
    }

    /// Independent duplicate with its own field storage
    pub fn copy(&self) -> Chain {
        Chain {
            core: self.core.clone(),
            fields: self.fields.to_vec().into(),
        }
    }

    /// Add an opaque binary blob
    pub fn with_binary(&self, key: &str, value: impl Into<Vec<u8>>) -> Chain {
        self.with(Field::binary(key, value))
    }

    /// Add a bool
    pub fn with_bool(&self, key: &str, value: bool) -> Chain {
        self.with(Field::bool(key, value))
    }

    /// Add UTF-8 text carried as bytes
    pub fn with_byte_string(&self, key: &str, value: impl Into<Vec<u8>>) -> Chain {
        self.with(Field::byte_string(key, value))
    }

    /// Add a complex number with 64-bit parts
    pub fn with_complex128(&self, key: &str, re: f64, im: f64) -> Chain {
        self.with(Field::complex128(key, re, im))
    }

    /// Add a complex number with 32-bit parts
    pub fn with_complex64(&self, key: &str, re: f32, im: f32) -> Chain {
        self.with(Field::complex64(key, re, im))
    }

    /// Add an f64
    pub fn with_f64(&self, key: &str, value: f64) -> Chain {
        self.with(Field::f64(key, value))
    }

    /// Add an f32
    pub fn with_f32(&self, key: &str, value: f32) -> Chain {
        self.with(Field::f32(key, value))
    }

    /// Add an isize
    pub fn with_isize(&self, key: &str, value: isize) -> Chain {
        self.with(Field::isize(key, value))
    }

    /// Add an i64
    pub fn with_i64(&self, key: &str, value: i64) -> Chain {
        self.with(Field::i64(key, value))
    }

    /// Add an i32
    pub fn with_i32(&self, key: &str, value: i32) -> Chain {
        self.with(Field::i32(key, value))
    }

    /// Add an i16
    pub fn with_i16(&self, key: &str, value: i16) -> Chain {
        self.with(Field::i16(key, value))
    }

    /// Add an i8
    pub fn with_i8(&self, key: &str, value: i8) -> Chain {
        self.with(Field::i8(key, value))
    }

    /// Add a usize
    pub fn with_usize(&self, key: &str, value: usize) -> Chain {
        self.with(Field::usize(key, value))
    }

    /// Add a u64
    pub fn with_u64(&self, key: &str, value: u64) -> Chain {
        self.with(Field::u64(key, value))
    }

    /// Add a u32
    pub fn with_u32(&self, key: &str, value: u32) -> Chain {
        self.with(Field::u32(key, value))
    }

    /// Add a u16
    pub fn with_u16(&self, key: &str, value: u16) -> Chain {
        self.with(Field::u16(key, value))
    }

    /// Add a u8
    pub fn with_u8(&self, key: &str, value: u8) -> Chain {
        self.with(Field::u8(key, value))
    }

    /// Add a string
    pub fn with_string(&self, key: &str, value: impl Into<String>) -> Chain {
        self.with(Field::string(key, value))
    }

    /// Add an error under the `error` key
    pub fn with_error(&self, err: &dyn StdError) -> Chain {
        self.with(Field::error(err))
    }

    /// Add an error under `key`
    pub fn with_named_error(&self, key: &str, err: &dyn StdError) -> Chain {
        self.with(Field::named_error(key, err))
    }

    /// Add a serialized structure
    pub fn with_reflect<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Chain {
        self.with(Field::reflect(key, value))
    }

    /// Nest every later field under `key`
    pub fn with_namespace(&self, key: &str) -> Chain {
        self.with(Field::namespace(key))
    }

    /// Add the `Display` output of a value
    pub fn with_stringer(&self, key: &str, value: &dyn fmt::Display) -> Chain {
        self.with(Field::stringer(key, value))
    }

    /// Add a timestamp
    pub fn with_time<Tz: TimeZone>(&self, key: &str, value: DateTime<Tz>) -> Chain {
        self.with(Field::time(key, value))
    }

    /// Add the current backtrace
    pub fn with_stack(&self, key: &str) -> Chain {
        self.with(Field::stack(key))
    }

    /// Add a duration
    pub fn with_duration(&self, key: &str, value: Duration) -> Chain {
        self.with(Field::duration(key, value))
    }

    /// Add any value convertible to [`Value`]
    pub fn with_any(&self, key: &str, value: impl Into<Value>) -> Chain {
        self.with(Field::any(key, value))
    }

    /// Same as [`Chain::with_any`]
    pub fn with_field(&self, key: &str, value: impl Into<Value>) -> Chain {
        self.with_any(key, value)
    }

    /// Add one field per map entry, in map iteration order
    pub fn with_fields(&self, fields: &Fields) -> Chain {
        self.with_all(
            fields
                .iter()
                .map(|(key, value)| Field::any(key, value.clone())),
        )
    }

    #[track_caller]
    fn emit(&self, level: Level, message: &str, args: &[Value]) -> &Self {
        let message = prepare(message, args);
        self.core
            .write(level, &message, &self.fields, Location::caller());
        self
    }

    /// Log at Debug; `message` is a printf-style template when `args` is non-empty
    #[track_caller]
    pub fn debug(&self, message: &str, args: &[Value]) -> &Self {
        self.emit(Level::Debug, message, args)
    }

    /// Log at Info
    #[track_caller]
    pub fn info(&self, message: &str, args: &[Value]) -> &Self {
        self.emit(Level::Info, message, args)
    }

    /// Log at Warn
    #[track_caller]
    pub fn warn(&self, message: &str, args: &[Value]) -> &Self {
        self.emit(Level::Warn, message, args)
    }

    /// Alias of [`Chain::warn`]
    #[track_caller]
    pub fn warning(&self, message: &str, args: &[Value]) -> &Self {
        self.emit(Level::Warn, message, args)
    }

    /// Log at Error
    #[track_caller]
    pub fn error(&self, message: &str, args: &[Value]) -> &Self {
        self.emit(Level::Error, message, args)
    }

    /// Log at Fatal, then terminate the process
    #[track_caller]
    pub fn fatal(&self, message: &str, args: &[Value]) -> ! {
        self.core.terminate(
            Level::Fatal,
            &prepare(message, args),
            &self.fields,
            Location::caller(),
        )
    }

    /// Log at Panic, then unwind
    #[track_caller]
    pub fn panic(&self, message: &str, args: &[Value]) -> ! {
        self.core.terminate(
            Level::Panic,
            &prepare(message, args),
            &self.fields,
            Location::caller(),
        )
    }

    /// Legacy key/value entry point
    ///
    /// `["warn" | "info" | "error", message, pairs...]` logs `message` at that
    /// level. Any other even-length sequence is logged as pairs at Info with an
    /// empty message. Empty, single and odd-length sequences are concatenated
    /// into the message. The chain's fields are always attached. Never fails;
    /// the `Result` keeps the legacy signature.
    #[track_caller]
    pub fn log(&self, keyvals: &[Value]) -> LogResult<()> {
        let caller = Location::caller();
        match classify(keyvals) {
            LogCall::Tagged {
                level,
                message,
                pairs,
            } => {
                let fields = self.with_pairs(pairs);
                self.core.write(level, message, &fields, caller);
            }
            LogCall::Pairs(pairs) => {
                let fields = self.with_pairs(pairs);
                self.core.write(Level::Info, "", &fields, caller);
            }
            LogCall::Positional(args) => {
                self.core
                    .write(Level::Info, &sprint(args), &self.fields, caller);
            }
        }
        Ok(())
    }

    fn with_pairs(&self, pairs: &[Value]) -> Vec<Field> {
        let mut fields = pairs_to_fields(pairs);
        fields.extend(self.fields.iter().cloned());
        fields
    }

    /// Write `message` at Info with a `calldepth` field; always succeeds
    #[track_caller]
    pub fn output(&self, calldepth: i64, message: &str) -> LogResult<()> {
        let mut fields = self.fields.to_vec();
        fields.push(Field::i64(CALLDEPTH_KEY, calldepth));
        self.core
            .write(Level::Info, message, &fields, Location::caller());
        Ok(())
    }

    /// Unstructured Info record from concatenated values
    #[track_caller]
    pub fn print(&self, args: &[Value]) {
        self.core
            .write(Level::Info, &sprint(args), &[], Location::caller());
    }

    /// Unstructured Info record from a printf-style template
    #[track_caller]
    pub fn printf(&self, template: &str, args: &[Value]) {
        self.core
            .write(Level::Info, &sprintf(template, args), &[], Location::caller());
    }

    /// Same as [`Chain::print`], kept for line-oriented call sites
    #[track_caller]
    pub fn println(&self, args: &[Value]) {
        self.core
            .write(Level::Info, &sprint(args), &[], Location::caller());
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("logger", &self.core.name())
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use crate::sink::MemorySink;
    use serde_json::Value as JsonValue;
    use std::thread;

    fn memory_chain() -> (Chain, MemorySink) {
        let memory = MemorySink::new();
        let config = LogConfig::new()
            .with_level(Level::Debug)
            .with_timestamps(false)
            .with_disable_stacktrace(true)
            .with_output(memory.clone());
        (Chain::new(Core::build(&config).unwrap()), memory)
    }

    fn records(memory: &MemorySink) -> Vec<JsonValue> {
        memory
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_with_leaves_parent_untouched() {
        let (root, _) = memory_chain();
        let parent = root.with_string("abc", "1");
        let child = parent.with_string("abc", "2");
        let sibling = root.with_string("abc", "3");

        assert!(root.fields().is_empty());
        assert_eq!(parent.fields(), &[Field::string("abc", "1")]);
        assert_eq!(
            child.fields(),
            &[Field::string("abc", "1"), Field::string("abc", "2")]
        );
        assert_eq!(sibling.fields(), &[Field::string("abc", "3")]);
    }

    #[test]
    fn test_copy_is_equal_but_independent() {
        let (root, _) = memory_chain();
        let original = root.with_i64("n", 1);
        let copy = original.copy();

        assert_eq!(copy.fields(), original.fields());
        let extended = copy.with_bool("extra", true);
        assert_eq!(original.fields().len(), 1);
        assert_eq!(extended.fields().len(), 2);
    }

    #[test]
    fn test_concurrent_with_on_shared_chain() {
        let (root, _) = memory_chain();
        let shared = root.with_string("request_id", "req-001");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || shared.with_i64("worker", i).fields().to_vec())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let fields = handle.join().unwrap();
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[1], Field::i64("worker", i as i64));
        }
        assert_eq!(shared.fields().len(), 1);
    }

    #[test]
    fn test_leveled_methods_render_and_chain() {
        let (root, memory) = memory_chain();
        root.with_string("user", "ada")
            .info("user %s logged in %d times", &[Value::from("ada"), Value::from(3)])
            .error("result", &[]);

        let all = records(&memory);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["message"], "user ada logged in 3 times");
        assert_eq!(all[0]["severity"], "info");
        assert_eq!(all[1]["severity"], "error");
        assert_eq!(all[1]["user"], "ada");
    }

    #[test]
    fn test_empty_message_concatenates_args() {
        let (root, memory) = memory_chain();
        root.warning("", &[Value::from("disk "), Value::from(93), Value::from("%")]);

        let all = records(&memory);
        assert_eq!(all[0]["message"], "disk 93%");
        assert_eq!(all[0]["level"], "WARN");
    }

    #[test]
    fn test_with_fields_adds_every_entry() {
        let (root, _) = memory_chain();
        let mut map = Fields::new();
        map.insert("user_id".to_string(), Value::from("u-1"));
        map.insert("company_id".to_string(), Value::from("c-1"));

        let chain = root.with_fields(&map);
        let mut keys: Vec<_> = chain.fields().iter().map(Field::key).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["company_id", "user_id"]);
    }

    #[test]
    fn test_log_tagged_dispatch() {
        let (root, memory) = memory_chain();
        let chain = root.with_string("scope", "test");

        for tag in ["info", "warn", "error"] {
            chain
                .log(&[Value::from(tag), Value::from("done"), Value::from("k"), Value::from(1)])
                .unwrap();
        }

        let all = records(&memory);
        let severities: Vec<_> = all.iter().map(|r| r["severity"].clone()).collect();
        assert_eq!(severities, vec!["info", "warn", "error"]);
        for record in &all {
            assert_eq!(record["message"], "done");
            assert_eq!(record["k"], 1);
            assert_eq!(record["scope"], "test");
        }
    }

    #[test]
    fn test_log_unknown_tag_is_info_pairs() {
        let (root, memory) = memory_chain();
        root.log(&[Value::from("unknown"), Value::from("msg")]).unwrap();

        let record = &records(&memory)[0];
        assert_eq!(record["severity"], "info");
        assert_eq!(record["message"], "");
        assert_eq!(record["unknown"], "msg");
    }

    #[test]
    fn test_log_single_arg_is_positional() {
        let (root, memory) = memory_chain();
        let chain = root.with_string("scope", "test");
        chain.log(&[Value::from("msg")]).unwrap();

        let record = &records(&memory)[0];
        assert_eq!(record["severity"], "info");
        assert_eq!(record["message"], "msg");
        assert_eq!(record["scope"], "test");
    }

    #[test]
    fn test_output_records_calldepth() {
        let (root, memory) = memory_chain();
        root.with_string("source", "nsq").output(3, "test").unwrap();

        let record = &records(&memory)[0];
        assert_eq!(record["message"], "test");
        assert_eq!(record["calldepth"], 3);
        assert_eq!(record["source"], "nsq");
    }

    #[test]
    fn test_print_family_ignores_chain_fields() {
        let (root, memory) = memory_chain();
        let chain = root.with_string("scope", "test");
        chain.print(&[Value::from(1), Value::from(2)]);
        chain.printf("%s=%d", &[Value::from("x"), Value::from(5)]);
        chain.println(&[Value::from("a"), Value::from("b")]);

        let all = records(&memory);
        let messages: Vec<_> = all.iter().map(|r| r["message"].clone()).collect();
        assert_eq!(messages, vec!["1 2", "x=5", "ab"]);
        assert!(all.iter().all(|r| r.get("scope").is_none()));
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let (root, memory) = memory_chain();
        root.info("here", &[]);

        let record = &records(&memory)[0];
        assert!(record["caller"].as_str().unwrap().contains("chain.rs"));
    }
}
