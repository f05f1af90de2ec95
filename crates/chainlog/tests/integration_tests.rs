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
#![allow(clippy::unwrap_used)]
//! Integration tests for the logging facade
//!
//! Every test captures output in its own `MemorySink` or temporary file, so
//! loggers never share state and tests can run in parallel.

use anyhow::Result;
use chainlog::{
    chain_with, Chain, FatalAction, Field, Level, Log, LogConfig, LogFormat, MemorySink,
    Registry, Value, WrappedLogger,
};
use serde_json::Value as JsonValue;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn capture(level: i8) -> (LogConfig, MemorySink) {
    let memory = MemorySink::new();
    let config = LogConfig::new()
        .with_level_value(level)
        .with_timestamps(false)
        .with_output(memory.clone())
        .with_error_output(MemorySink::new());
    (config, memory)
}

fn records(memory: &MemorySink) -> Vec<JsonValue> {
    memory
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_level_one_suppresses_below_warn() -> Result<()> {
    let (config, memory) = capture(1);
    let logger = WrappedLogger::new("capture", &config, &[])?;

    logger.debugw("debug", &[Value::from("k"), Value::from("v")]);
    logger.errorw("first", &[Value::from("k"), Value::from("v")]);
    logger.errorw("second", &[Value::from("k"), Value::from("v")]);

    let all = records(&memory);
    assert_eq!(all.len(), 2);
    for record in &all {
        assert_eq!(record["severity"], "error");
        assert_eq!(record["logger"], "capture");
        assert_eq!(record["k"], "v");
        assert!(record["stacktrace"].is_string());
    }
    Ok(())
}

#[test]
fn test_log_dispatch_levels() -> Result<()> {
    let (config, memory) = capture(Level::Debug.as_i8());
    let chain = WrappedLogger::from_config(&config)?.chain();

    chain.log(&[Value::from("warn"), Value::from("disk"), Value::from("pct"), Value::from(93)])?;
    chain.log(&[Value::from("unknown"), Value::from("msg")])?;
    chain.log(&[Value::from("msg")])?;
    chain.log(&[])?;
    chain.log(&[Value::from("a"), Value::from(1), Value::from("b")])?;

    let all = records(&memory);
    let shapes: Vec<_> = all
        .iter()
        .map(|r| (r["severity"].clone(), r["message"].clone()))
        .collect();
    assert_eq!(
        shapes,
        vec![
            ("warn".into(), "disk".into()),
            ("info".into(), "".into()),
            ("info".into(), "msg".into()),
            ("info".into(), "".into()),
            ("info".into(), "a1b".into()),
        ]
    );
    assert_eq!(all[0]["pct"], 93);
    assert_eq!(all[1]["unknown"], "msg");
    Ok(())
}

#[test]
fn test_chain_with_pairs() -> Result<()> {
    let (config, _) = capture(0);
    let base = WrappedLogger::from_config(&config)?
        .chain()
        .with_string("scope", "test");

    let odd = chain_with(&base, &[Value::from("a"), Value::from(1), Value::from("b")]);
    assert_eq!(odd.fields(), base.fields());

    let mixed = chain_with(
        &base,
        &[Value::from("a"), Value::from(1), Value::from(2), Value::from("two")],
    );
    assert_eq!(
        mixed.fields(),
        &[Field::string("scope", "test"), Field::any("a", 1)]
    );
    assert_eq!(base.fields().len(), 1);
    Ok(())
}

#[test]
fn test_sibling_chains_are_independent() -> Result<()> {
    let (config, memory) = capture(0);
    let request = WrappedLogger::from_config(&config)?
        .chain()
        .with_string("request_id", "req-001");

    let db = request.with_string("component", "db");
    let cache = request.with_string("component", "cache");

    let handles: Vec<_> = [db, cache]
        .into_iter()
        .map(|chain: Chain| thread::spawn(move || chain.info("done", &[]).fields().len()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    request.info("request done", &[]);

    let all = records(&memory);
    assert_eq!(all.len(), 3);
    let mut components: Vec<_> = all
        .iter()
        .map(|r| r["component"].as_str().unwrap_or("-").to_string())
        .collect();
    components.sort();
    assert_eq!(components, vec!["-", "cache", "db"]);
    Ok(())
}

#[test]
fn test_registry_set_level_then_apply() -> Result<()> {
    let (config, memory) = capture(0);
    let registry = Registry::new(config)?;
    let before = registry.chain();

    registry.set_level(Level::Error.as_i8());
    registry.apply_config()?;

    registry.infow("suppressed", &[]);
    registry.info("suppressed", &[]);
    before.info("old chain keeps its writer", &[]);
    registry.errorw("kept", &[]);

    let messages: Vec<_> = records(&memory)
        .iter()
        .map(|r| r["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, vec!["old chain keeps its writer", "kept"]);
    registry.shutdown()?;
    Ok(())
}

#[test]
fn test_registry_reconfigured_while_logging() -> Result<()> {
    const READERS: i64 = 4;
    const PER_READER: i64 = 150;

    let (config, first) = capture(0);
    let second = MemorySink::new();
    let registry = Arc::new(Registry::new(config)?);

    let mut handles = Vec::new();
    for writer in 0..2 {
        let registry = Arc::clone(&registry);
        let (first, second) = (first.clone(), second.clone());
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let sink = if (i + writer) % 2 == 0 { &second } else { &first };
                registry.set_output(sink.clone());
                // Debug and Info both let Info records through
                let level = if i % 3 == 0 { Level::Debug } else { Level::Info };
                registry.set_level(level.as_i8());
                if i % 4 == writer {
                    registry.apply_config().unwrap();
                }
            }
        }));
    }
    for reader in 0..READERS {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for n in 0..PER_READER {
                let id = reader * PER_READER + n;
                match n % 3 {
                    0 => {
                        registry.chain().with_i64("id", id).info("tick", &[]);
                    }
                    1 => registry.infow("tick", &[Value::from("id"), Value::from(id)]),
                    _ => {
                        registry.try_chain().unwrap().with_i64("id", id).info("tick", &[]);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ids: Vec<i64> = records(&first)
        .into_iter()
        .chain(records(&second))
        .map(|record| record["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..READERS * PER_READER).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_panic_writes_one_record() -> Result<()> {
    let (config, memory) = capture(0);
    let chain = WrappedLogger::from_config(&config)?
        .chain()
        .with_i64("attempt", 3);

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        chain.panic("giving up after %d attempts", &[Value::from(3)]);
    }));

    let payload = result.unwrap_err();
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some("giving up after 3 attempts")
    );
    let all = records(&memory);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["severity"], "panic");
    assert_eq!(all[0]["attempt"], 3);
    Ok(())
}

#[test]
fn test_fatal_with_panic_action() -> Result<()> {
    let (config, memory) = capture(0);
    let logger = WrappedLogger::from_config(&config.with_fatal_action(FatalAction::Panic))?;

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        logger.fatalw("config missing", &[Value::from("path"), Value::from("/etc/app")]);
    }));

    assert!(result.is_err());
    let all = records(&memory);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["severity"], "fatal");
    Ok(())
}

#[test]
fn test_file_output() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("app.log");
    let config = LogConfig::new()
        .with_timestamps(false)
        .with_output(path.clone());

    let logger = WrappedLogger::new("file", &config, &[])?;
    logger
        .chain()
        .with_duration("elapsed", std::time::Duration::from_millis(1500))
        .info("written", &[]);
    logger.sync()?;

    let contents = std::fs::read_to_string(&path)?;
    let record: JsonValue = serde_json::from_str(contents.trim())?;
    assert_eq!(record["message"], "written");
    assert_eq!(record["elapsed"], 1.5);
    Ok(())
}

#[test]
fn test_compact_format() -> Result<()> {
    let (config, memory) = capture(0);
    let logger = WrappedLogger::from_config(&config.with_format(LogFormat::Compact))?;

    logger.chain().with_bool("cached", true).warn("slow", &[]);

    let line = memory.contents();
    assert!(line.contains("slow"));
    assert!(line.contains("cached=true"));
    Ok(())
}
