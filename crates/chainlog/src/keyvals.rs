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
//! Flat key/value sequences.
//!
//! Legacy call sites pass context as `[key, value, key, value, ...]`. This
//! module turns such sequences into [`Field`]s and classifies the argument
//! shapes accepted by [`Chain::log`](crate::Chain::log).

use crate::chain::Chain;
use crate::field::{Field, Value};
use crate::level::Level;

/// Key of the field holding a trailing key that had no value
pub const IGNORED_KEY: &str = "ignored";

/// Key of the field collecting pairs whose key was not a string
pub const INVALID_KEY: &str = "invalid";

/// Shape of a `log` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LogCall<'a> {
    /// `[tag, message, pairs...]` with a recognized tag
    Tagged {
        level: Level,
        message: &'a str,
        pairs: &'a [Value],
    },

    /// Even-length sequence without a recognized tag
    Pairs(&'a [Value]),

    /// Empty, single or odd-length sequence
    Positional(&'a [Value]),
}

/// Classify a `log` argument list
pub(crate) fn classify(keyvals: &[Value]) -> LogCall<'_> {
    if keyvals.len() < 2 || keyvals.len() % 2 != 0 {
        return LogCall::Positional(keyvals);
    }

    let tagged = match (keyvals[0].as_str(), keyvals[1].as_str()) {
        (Some(tag), Some(message)) => tag_level(tag).map(|level| (level, message)),
        _ => None,
    };

    match tagged {
        Some((level, message)) => LogCall::Tagged {
            level,
            message,
            pairs: &keyvals[2..],
        },
        None => LogCall::Pairs(keyvals),
    }
}

fn tag_level(tag: &str) -> Option<Level> {
    match tag {
        "warn" => Some(Level::Warn),
        "info" => Some(Level::Info),
        "error" => Some(Level::Error),
        _ => None,
    }
}

/// Convert a flat sequence into fields
///
/// String keys become fields. A trailing key without a value is kept under
/// [`IGNORED_KEY`], and pairs with non-string keys are collected into one
/// [`INVALID_KEY`] field instead of being dropped silently.
pub fn pairs_to_fields(keyvals: &[Value]) -> Vec<Field> {
    let mut fields = Vec::with_capacity(keyvals.len() / 2 + 1);
    let mut invalid = Vec::new();

    let mut pairs = keyvals.chunks_exact(2);
    for pair in pairs.by_ref() {
        match pair[0].as_str() {
            Some(key) => fields.push(Field::any(key, pair[1].clone())),
            None => invalid.push(serde_json::json!([pair[0].to_json(), pair[1].to_json()])),
        }
    }
    if let [dangling] = pairs.remainder() {
        fields.push(Field::any(IGNORED_KEY, dangling.clone()));
    }
    if !invalid.is_empty() {
        fields.push(Field::any(INVALID_KEY, serde_json::Value::Array(invalid)));
    }
    fields
}

/// Attach a flat key/value sequence to a copy of `chain`
///
/// An odd-length sequence leaves the chain unchanged. Pairs whose key is not
/// a string are skipped.
pub fn chain_with(chain: &Chain, keyvals: &[Value]) -> Chain {
    if keyvals.len() % 2 != 0 {
        return chain.clone();
    }

    let fields = keyvals
        .chunks_exact(2)
        .filter_map(|pair| pair[0].as_str().map(|key| Field::any(key, pair[1].clone())));
    chain.with_all(fields)
}
