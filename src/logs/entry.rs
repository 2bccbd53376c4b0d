use crate::error::LogError;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used inside log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Severity of a log entry
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogError::InvalidLevel(s.to_string()))
    }
}

/// Message payload of a log entry
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    /// Written verbatim
    Text(String),
    /// Written as pretty-printed JSON
    Structured(serde_json::Value),
}

impl LogMessage {
    /// Build a structured message from any serializable value.
    ///
    /// Values that fail to serialize become a `[Object: <type>]` placeholder.
    pub fn structured<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => LogMessage::Structured(value),
            Err(_) => LogMessage::Text(format!("[Object: {}]", std::any::type_name::<T>())),
        }
    }

    /// Interpret user input: JSON objects and arrays become structured,
    /// everything else stays text
    pub fn parse_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
                return LogMessage::Structured(value);
            }
        }
        LogMessage::Text(input.to_string())
    }

    /// Render the message as it appears in the log file
    pub fn render(&self) -> String {
        match self {
            LogMessage::Text(text) => text.clone(),
            LogMessage::Structured(serde_json::Value::String(s)) => s.clone(),
            LogMessage::Structured(
                value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_)),
            ) => serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| "[Object: json]".to_string()),
            LogMessage::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for LogMessage {
    fn from(s: &str) -> Self {
        LogMessage::Text(s.to_string())
    }
}

impl From<String> for LogMessage {
    fn from(s: String) -> Self {
        LogMessage::Text(s)
    }
}

impl From<serde_json::Value> for LogMessage {
    fn from(value: serde_json::Value) -> Self {
        LogMessage::Structured(value)
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Format a log line: `[YYYY-MM-DD HH:MM:SS.mmm][TARGET][LEVEL] message\n`
pub fn format_line<Tz>(
    timestamp: &DateTime<Tz>,
    target: &str,
    level: LogLevel,
    message: &LogMessage,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "[{}][{}][{}] {}\n",
        timestamp.format(TIMESTAMP_FORMAT),
        target,
        level,
        message.render()
    )
}

/// A log line parsed back from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub target: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    /// Parse `[timestamp][target][level] message`.
    ///
    /// Returns `None` for lines that do not start a new entry, such as the
    /// continuation lines of a pretty-printed structured message.
    pub fn parse(line: &str) -> Option<Self> {
        let (timestamp, rest) = bracketed(line)?;
        let (target, rest) = bracketed(rest)?;
        let (level, rest) = bracketed(rest)?;
        let level = level.parse().ok()?;
        let message = rest.strip_prefix(' ').unwrap_or(rest);

        Some(Self {
            timestamp: timestamp.to_string(),
            target: target.to_string(),
            level,
            message: message.to_string(),
        })
    }
}

/// Split `[inner]rest` into `(inner, rest)`
fn bracketed(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix('[')?;
    let end = rest.find(']')?;
    Some((&rest[..end], &rest[end + 1..]))
}
