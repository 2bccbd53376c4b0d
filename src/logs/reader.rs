use crate::error::{LogError, Result};
use crate::logs::{LogLevel, LogLine};
use std::path::Path;

/// Options for reading entries back from a log file
#[derive(Debug, Clone)]
pub struct LogReadOptions {
    /// Number of entries to keep from the end of the file
    pub lines: usize,
    /// Minimum level to include
    pub min_level: Option<LogLevel>,
    /// Optional filter pattern (simple substring match on the message)
    pub filter: Option<String>,
}

impl Default for LogReadOptions {
    fn default() -> Self {
        Self {
            lines: 100,
            min_level: None,
            filter: None,
        }
    }
}

/// Read the full text of a log file
pub async fn read_log_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!("Failed to read log file {}: {}", path.display(), e);
        LogError::LogFileError(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Read the last entries of a log file.
///
/// Lines that do not start a new entry are joined onto the previous entry,
/// so pretty-printed structured messages come back whole. Text before the
/// first entry is dropped.
pub async fn read_entries(path: &Path, options: &LogReadOptions) -> Result<Vec<LogLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = read_log_file(path).await?;
    Ok(parse_entries(&content, options))
}

/// Parse file content into entries and apply the read options
pub fn parse_entries(content: &str, options: &LogReadOptions) -> Vec<LogLine> {
    let mut entries: Vec<LogLine> = Vec::new();

    for line in content.lines() {
        match LogLine::parse(line) {
            Some(entry) => entries.push(entry),
            None => {
                if let Some(last) = entries.last_mut() {
                    last.message.push('\n');
                    last.message.push_str(line);
                }
            }
        }
    }

    let mut entries: Vec<LogLine> = entries
        .into_iter()
        .filter(|entry| options.min_level.map_or(true, |min| entry.level >= min))
        .filter(|entry| {
            options
                .filter
                .as_deref()
                .map_or(true, |pattern| entry.message.contains(pattern))
        })
        .collect();

    // Take the last N entries
    if entries.len() > options.lines {
        entries.drain(..entries.len() - options.lines);
    }

    entries
}
