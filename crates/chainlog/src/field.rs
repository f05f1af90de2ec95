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
//! Typed key/value fields.
//!
//! A [`Field`] is an immutable key plus a typed [`Value`]. Fields are cheap to
//! clone and are shared freely between chains. [`Value`] is also the dynamic
//! argument type accepted by positional and key/value call sites, so it has
//! `From` conversions for the common primitive types.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// Map of arbitrary values, used by `with_fields`
///
/// Iteration order is unspecified, so the order of the resulting fields is too.
pub type Fields = HashMap<String, Value>;

/// Default key used by [`Field::error`]
pub const ERROR_KEY: &str = "error";

/// A dynamically typed log value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean
    Bool(bool),

    /// Signed integer of any width
    Int(i64),

    /// Unsigned integer of any width
    Uint(u64),

    /// Floating point number of any width
    Float(f64),

    /// Complex number
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },

    /// UTF-8 text
    String(String),

    /// Opaque binary blob, rendered as hex
    Binary(Vec<u8>),

    /// UTF-8 text carried as raw bytes
    ByteString(Vec<u8>),

    /// Elapsed time
    Duration(Duration),

    /// Point in time
    Time(DateTime<Utc>),

    /// Rendered error message including its source chain
    Error(String),

    /// Arbitrary serialized structure
    Json(JsonValue),
}

impl Value {
    /// Render an error and its sources as `outer: inner: root`
    pub fn error(err: &dyn StdError) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Value::Error(message)
    }

    /// Capture the `Display` output of a value
    pub fn display(value: &dyn fmt::Display) -> Self {
        Value::String(value.to_string())
    }

    /// Serialize any value into a JSON payload
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::Json)
    }

    /// Borrow the text of a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is text, the only kind accepted as a key
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// JSON representation used by structured encodings
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Uint(u) => JsonValue::from(*u),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => JsonValue::Number(n),
                None => JsonValue::String(float_token(*f)),
            },
            Value::Complex { .. } | Value::Error(_) => JsonValue::String(self.to_string()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Binary(bytes) => JsonValue::String(hex::encode(bytes)),
            Value::ByteString(bytes) => {
                JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Value::Duration(d) => match serde_json::Number::from_f64(d.as_secs_f64()) {
                Some(n) => JsonValue::Number(n),
                None => JsonValue::Null,
            },
            Value::Time(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Json(json) => json.clone(),
        }
    }
}

fn float_token(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_sign_positive() {
        "+Inf".to_string()
    } else {
        "-Inf".to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(v) if v.is_finite() => write!(f, "{}", v),
            Value::Float(v) => f.write_str(&float_token(*v)),
            Value::Complex { re, im } => write!(f, "{}{:+}i", re, im),
            Value::String(s) | Value::Error(s) => f.write_str(s),
            Value::Binary(bytes) => f.write_str(&hex::encode(bytes)),
            Value::ByteString(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Json(json) => write!(f, "{}", json),
        }
    }
}

macro_rules! impl_from_value {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_value!(Int as i64: i8, i16, i32, i64);
impl_from_value!(Uint as u64: u8, u16, u32, u64);
impl_from_value!(Float as f64: f32, f64);
impl_from_value!(String as String: String, &str, &String, char);
impl_from_value!(Bool as bool: bool);
impl_from_value!(Duration as Duration: Duration);
impl_from_value!(Binary as Vec<u8>: Vec<u8>, &[u8]);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Uint(value as u64)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::Time(value.with_timezone(&Utc))
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Value::Json(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Value(Value),
    Namespace,
}

/// An immutable typed key/value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    payload: Payload,
}

impl Field {
    fn new(key: impl Into<String>, value: Value) -> Self {
        Field {
            key: key.into(),
            payload: Payload::Value(value),
        }
    }

    /// Field holding anything convertible to a [`Value`]
    pub fn any(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Field::new(key, value.into())
    }

    /// Boolean field
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Field::new(key, Value::Bool(value))
    }

    /// Signed integer field
    pub fn isize(key: impl Into<String>, value: isize) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Signed 64-bit field
    pub fn i64(key: impl Into<String>, value: i64) -> Self {
        Field::new(key, Value::Int(value))
    }

    /// Signed 32-bit field
    pub fn i32(key: impl Into<String>, value: i32) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Signed 16-bit field
    pub fn i16(key: impl Into<String>, value: i16) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Signed 8-bit field
    pub fn i8(key: impl Into<String>, value: i8) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Unsigned integer field
    pub fn usize(key: impl Into<String>, value: usize) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Unsigned 64-bit field
    pub fn u64(key: impl Into<String>, value: u64) -> Self {
        Field::new(key, Value::Uint(value))
    }

    /// Unsigned 32-bit field
    pub fn u32(key: impl Into<String>, value: u32) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Unsigned 16-bit field
    pub fn u16(key: impl Into<String>, value: u16) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Unsigned 8-bit field
    pub fn u8(key: impl Into<String>, value: u8) -> Self {
        Field::new(key, Value::from(value))
    }

    /// 64-bit float field
    pub fn f64(key: impl Into<String>, value: f64) -> Self {
        Field::new(key, Value::Float(value))
    }

    /// 32-bit float field
    pub fn f32(key: impl Into<String>, value: f32) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Complex number with 64-bit parts
    pub fn complex128(key: impl Into<String>, re: f64, im: f64) -> Self {
        Field::new(key, Value::Complex { re, im })
    }

    /// Complex number with 32-bit parts
    pub fn complex64(key: impl Into<String>, re: f32, im: f32) -> Self {
        Field::new(
            key,
            Value::Complex {
                re: f64::from(re),
                im: f64::from(im),
            },
        )
    }

    /// Text field
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(key, Value::String(value.into()))
    }

    /// Opaque binary field
    pub fn binary(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Field::new(key, Value::Binary(value.into()))
    }

    /// UTF-8 text carried as bytes
    pub fn byte_string(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Field::new(key, Value::ByteString(value.into()))
    }

    /// Duration field, rendered in seconds by structured encodings
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Field::new(key, Value::Duration(value))
    }

    /// Timestamp field, normalized to UTC
    pub fn time<Tz: TimeZone>(key: impl Into<String>, value: DateTime<Tz>) -> Self {
        Field::new(key, Value::from(value))
    }

    /// Error field under the `error` key
    pub fn error(err: &dyn StdError) -> Self {
        Field::named_error(ERROR_KEY, err)
    }

    /// Error field under an explicit key
    pub fn named_error(key: impl Into<String>, err: &dyn StdError) -> Self {
        Field::new(key, Value::error(err))
    }

    /// Serialize a structure into the field
    ///
    /// Serialization failures produce a `<key>Error` field instead.
    pub fn reflect<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        let key = key.into();
        match Value::json(value) {
            Ok(json) => Field::new(key, json),
            Err(err) => Field::named_error(format!("{}Error", key), &err),
        }
    }

    /// Field holding the `Display` output of a value
    pub fn stringer(key: impl Into<String>, value: &dyn fmt::Display) -> Self {
        Field::new(key, Value::display(value))
    }

    /// Marker nesting every later field of the record under `key`
    pub fn namespace(key: impl Into<String>) -> Self {
        Field {
            key: key.into(),
            payload: Payload::Namespace,
        }
    }

    /// Backtrace of the calling thread
    pub fn stack(key: impl Into<String>) -> Self {
        Field::new(key, Value::String(Backtrace::force_capture().to_string()))
    }

    /// Field key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Field value, `None` for namespace markers
    pub fn value(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Value(value) => Some(value),
            Payload::Namespace => None,
        }
    }
}

/// Render fields as a JSON object, nesting after namespace markers
pub fn fields_to_json(fields: &[Field]) -> Map<String, JsonValue> {
    let mut map = Map::new();
    for (index, field) in fields.iter().enumerate() {
        match &field.payload {
            Payload::Value(value) => {
                map.insert(field.key.clone(), value.to_json());
            }
            Payload::Namespace => {
                let nested = fields_to_json(&fields[index + 1..]);
                map.insert(field.key.clone(), JsonValue::Object(nested));
                break;
            }
        }
    }
    map
}

/// Render fields as space separated `key=value` pairs
///
/// Keys inside a namespace are prefixed with `namespace.`.
pub fn fields_to_console(fields: &[Field]) -> String {
    let mut prefix = String::new();
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        match &field.payload {
            Payload::Value(value) => {
                parts.push(format!("{}{}={}", prefix, field.key, value.to_json()));
            }
            Payload::Namespace => {
                prefix.push_str(&field.key);
                prefix.push('.');
            }
        }
    }
    parts.join(" ")
}
