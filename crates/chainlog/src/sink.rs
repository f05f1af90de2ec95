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
//! Output sinks.
//!
//! A [`SinkSet`] owns the opened outputs of one logger and plugs into the
//! formatter as its `MakeWriter`. Each formatted record reaches the writer as
//! a single `write` call, which is fanned out to every output under that
//! output's lock, so records never interleave within a sink. Write failures
//! are reported to the error outputs and never surface to the caller.

use crate::config::{LogError, LogResult, OutputTarget};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared in-memory output, useful for tests and embedding
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Non-empty lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Discard captured output
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    fn append(&self, bytes: &[u8]) {
        self.buffer.lock().extend_from_slice(bytes);
    }
}

impl PartialEq for MemorySink {
    /// Two handles are equal when they share the same buffer
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("len", &self.buffer.lock().len())
            .finish()
    }
}

enum Sink {
    Stdout,
    Stderr,
    File { path: PathBuf, file: Mutex<File> },
    Memory(MemorySink),
}

impl Sink {
    fn open(target: &OutputTarget) -> LogResult<Self> {
        Ok(match target {
            OutputTarget::Stdout => Sink::Stdout,
            OutputTarget::Stderr => Sink::Stderr,
            OutputTarget::Memory(memory) => Sink::Memory(memory.clone()),
            OutputTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LogError::OpenSink {
                        path: path.clone(),
                        source,
                    })?;
                Sink::File {
                    path: path.clone(),
                    file: Mutex::new(file),
                }
            }
        })
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().write_all(buf),
            Sink::Stderr => io::stderr().lock().write_all(buf),
            Sink::File { file, .. } => file.lock().write_all(buf),
            Sink::Memory(memory) => {
                memory.append(buf);
                Ok(())
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().flush(),
            Sink::Stderr => io::stderr().flush(),
            Sink::File { file, .. } => file.lock().sync_data(),
            Sink::Memory(_) => Ok(()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Sink::Stdout => "stdout".to_string(),
            Sink::Stderr => "stderr".to_string(),
            Sink::File { path, .. } => path.display().to_string(),
            Sink::Memory(_) => "memory".to_string(),
        }
    }
}

/// The opened outputs and error outputs of one logger
#[derive(Clone)]
pub(crate) struct SinkSet {
    outputs: Arc<[Sink]>,
    errors: Arc<[Sink]>,
}

impl SinkSet {
    /// Open every target; the first failure aborts the build
    pub(crate) fn open(outputs: &[OutputTarget], errors: &[OutputTarget]) -> LogResult<Self> {
        let outputs = outputs.iter().map(Sink::open).collect::<LogResult<Vec<_>>>()?;
        let errors = errors.iter().map(Sink::open).collect::<LogResult<Vec<_>>>()?;
        Ok(SinkSet {
            outputs: outputs.into(),
            errors: errors.into(),
        })
    }

    /// Flush every output, returning the first failure
    pub(crate) fn sync(&self) -> LogResult<()> {
        let mut first_error = None;
        for sink in self.outputs.iter() {
            if let Err(err) = sink.flush() {
                self.report(sink, "flush", &err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(LogError::IoError(err)),
            None => Ok(()),
        }
    }

    fn report(&self, sink: &Sink, action: &str, err: &io::Error) {
        let line = format!(
            "{} {} error on {}: {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            action,
            sink.describe(),
            err
        );
        for error_sink in self.errors.iter() {
            let _ = error_sink.write_all(line.as_bytes());
        }
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSet")
            .field(
                "outputs",
                &self.outputs.iter().map(Sink::describe).collect::<Vec<_>>(),
            )
            .field(
                "errors",
                &self.errors.iter().map(Sink::describe).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Writer handed to the formatter for a single record
pub(crate) struct SinkWriter<'a> {
    sinks: &'a SinkSet,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in self.sinks.outputs.iter() {
            if let Err(err) = sink.write_all(buf) {
                self.sinks.report(sink, "write", &err);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SinkSet {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { sinks: self }
    }
}
