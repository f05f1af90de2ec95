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
//! JSON formatting layer.
//!
//! `tracing` field names are fixed at the call site, so a record's context
//! reaches the subscriber as one pre-rendered JSON object in the `fields`
//! event field. This layer splices that object's entries into the record as
//! top-level keys, next to the implicit ones.

use crate::config::EncoderConfig;
use chrono::{SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::io::{self, Write};
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

// Implicit keys

const TIMESTAMP: &str = "timestamp";
const LEVEL: &str = "level";
const TARGET: &str = "target";
const THREAD_ID: &str = "threadId";
const MESSAGE: &str = "message";

/// Event field carrying the rendered context object
const CONTEXT: &str = "fields";

/// Entries of one event, in recording order
#[derive(Debug, Default)]
struct Storage {
    message: Option<String>,
    entries: Vec<(String, JsonValue)>,
}

impl Storage {
    fn insert(&mut self, name: &str, value: JsonValue) {
        self.entries.push((name.to_string(), value));
    }

    fn splice_context(&mut self, rendered: String) {
        match serde_json::from_str::<Map<String, JsonValue>>(&rendered) {
            Ok(context) => self.entries.extend(context),
            Err(_) => self.insert(CONTEXT, JsonValue::String(rendered)),
        }
    }
}

impl Visit for Storage {
    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.insert(field.name(), JsonValue::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.insert(field.name(), JsonValue::from(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.insert(field.name(), JsonValue::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.insert(field.name(), JsonValue::from(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        match field.name() {
            MESSAGE => self.message = Some(value.to_string()),
            CONTEXT => self.splice_context(value.to_string()),
            name => self.insert(name, JsonValue::from(value)),
        }
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        match field.name() {
            MESSAGE => self.message = Some(rendered),
            CONTEXT => self.splice_context(rendered),
            name => self.insert(name, JsonValue::String(rendered)),
        }
    }
}

/// Writes every event as one JSON object per line
pub(crate) struct JsonLayer<W> {
    writer: W,
    encoder: EncoderConfig,
}

impl<W> JsonLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub(crate) fn new(writer: W, encoder: EncoderConfig) -> Self {
        JsonLayer { writer, encoder }
    }

    /// Serialize an event into a buffer of bytes
    fn event_serialize(&self, event: &Event<'_>) -> io::Result<Vec<u8>> {
        let mut storage = Storage::default();
        event.record(&mut storage);

        let metadata = event.metadata();
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buffer);
        let mut map_serializer = serializer.serialize_map(None)?;

        if self.encoder.use_timestamps {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
            map_serializer.serialize_entry(TIMESTAMP, &now)?;
        }
        map_serializer.serialize_entry(LEVEL, &format_args!("{}", metadata.level()))?;
        if self.encoder.include_targets {
            map_serializer.serialize_entry(TARGET, metadata.target())?;
        }
        if self.encoder.include_thread_ids {
            map_serializer
                .serialize_entry(THREAD_ID, &format_args!("{:?}", std::thread::current().id()))?;
        }
        map_serializer.serialize_entry(MESSAGE, storage.message.as_deref().unwrap_or(""))?;
        for (key, value) in &storage.entries {
            map_serializer.serialize_entry(key, value)?;
        }

        map_serializer.end()?;
        Ok(buffer)
    }

    /// Write the record with a trailing newline in a single call
    fn flush(&self, mut buffer: Vec<u8>) -> io::Result<()> {
        buffer.write_all(b"\n")?;
        self.writer.make_writer().write_all(&buffer)
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Ok(formatted) = self.event_serialize(event) {
            let _ = self.flush(formatted);
        }
    }
}
