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
//! Record severities.
//!
//! Levels use signed numbering where smaller means more verbose. A minimum
//! level is stored as a raw `i8`, so values between or beyond the named
//! levels (for example `3`) are valid thresholds.

use crate::config::LogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    /// Verbose diagnostics, disabled in production
    Debug = -1,

    /// Default level
    #[default]
    Info = 0,

    /// Unusual but handled situations
    Warn = 1,

    /// Failures that need attention
    Error = 2,

    /// Logs, then unwinds the calling thread
    Panic = 4,

    /// Logs, then terminates the process
    Fatal = 5,
}

impl Level {
    /// Numeric value of the level
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    /// Level with the exact numeric value, if one exists
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Level::Debug),
            0 => Some(Level::Info),
            1 => Some(Level::Warn),
            2 => Some(Level::Error),
            4 => Some(Level::Panic),
            5 => Some(Level::Fatal),
            _ => None,
        }
    }

    /// Lowercase name used in rendered records
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Whether a record at this level passes the `min_level` threshold
    pub fn enabled_at(self, min_level: i8) -> bool {
        self.as_i8() >= min_level
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    /// Accepts level names (case-insensitive) or their numeric values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i8>() {
            return Level::from_i8(value).ok_or_else(|| {
                LogError::InvalidLogLevel(format!("No level with value {}", value))
            });
        }

        match trimmed.to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            _ => Err(LogError::InvalidLogLevel(format!(
                "Unknown level: {}. Expected one of: debug, info, warn, error, panic, fatal",
                s
            ))),
        }
    }
}

/// Parse a minimum level threshold from a name or any `i8`
pub(crate) fn parse_threshold(s: &str) -> Result<i8, LogError> {
    match s.trim().parse::<i8>() {
        Ok(value) => Ok(value),
        Err(_) => s.parse::<Level>().map(Level::as_i8),
    }
}
