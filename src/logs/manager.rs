use crate::error::Result;
use crate::logs::writer::{append_line, available_log_file_path, log_file_name, sequence_path};
use crate::logs::{format_line, LogDirectoryResolver, LogLevel, LogMessage};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Category of the predefined application logger
pub const APP_CATEGORY: &str = "app";

/// Category of the predefined HTTP logger
pub const HTTP_CATEGORY: &str = "http";

/// Highest numbered file checked when listing a day's files
const MAX_LISTED_SEQUENCE: usize = 100;

/// LogManager writes, rotates and lists the log files of one category
pub struct LogManager {
    /// Category name, used in file names and as the default target
    category: String,
    /// Shared directory resolver
    resolver: Arc<LogDirectoryResolver>,
    /// Serializes rotation checks and appends within this manager
    write_lock: Mutex<()>,
}

impl LogManager {
    /// Create a new LogManager for a category
    ///
    /// # Arguments
    /// * `category` - Log stream name, e.g. "app" or "http"
    /// * `resolver` - Directory resolver shared by all managers
    pub fn new(category: impl Into<String>, resolver: Arc<LogDirectoryResolver>) -> Self {
        Self {
            category: category.into(),
            resolver,
            write_lock: Mutex::new(()),
        }
    }

    /// Logger for the "app" category
    pub fn app(resolver: Arc<LogDirectoryResolver>) -> Self {
        Self::new(APP_CATEGORY, resolver)
    }

    /// Logger for the "http" category
    pub fn http(resolver: Arc<LogDirectoryResolver>) -> Self {
        Self::new(HTTP_CATEGORY, resolver)
    }

    /// Get the category name
    pub fn category(&self) -> &str {
        &self.category
    }

    pub async fn trace(&self, message: impl Into<LogMessage>, target: Option<&str>) -> Result<()> {
        self.write_log(LogLevel::Trace, message, target).await
    }

    pub async fn debug(&self, message: impl Into<LogMessage>, target: Option<&str>) -> Result<()> {
        self.write_log(LogLevel::Debug, message, target).await
    }

    pub async fn info(&self, message: impl Into<LogMessage>, target: Option<&str>) -> Result<()> {
        self.write_log(LogLevel::Info, message, target).await
    }

    pub async fn warn(&self, message: impl Into<LogMessage>, target: Option<&str>) -> Result<()> {
        self.write_log(LogLevel::Warn, message, target).await
    }

    pub async fn error(&self, message: impl Into<LogMessage>, target: Option<&str>) -> Result<()> {
        self.write_log(LogLevel::Error, message, target).await
    }

    /// Write an entry at any level
    pub async fn log(
        &self,
        message: impl Into<LogMessage>,
        level: LogLevel,
        target: Option<&str>,
    ) -> Result<()> {
        self.write_log(level, message, target).await
    }

    /// Write one entry to the current file of this category
    ///
    /// # Arguments
    /// * `level` - Severity of the entry
    /// * `message` - Text or structured payload
    /// * `target` - Label for the entry, defaults to the upper-cased category
    ///
    /// # Returns
    /// * `Ok(())` - Exactly one line was appended to one file
    /// * `Err(LogError)` - Rotation was exhausted or the file could not be written
    pub async fn write_log(
        &self,
        level: LogLevel,
        message: impl Into<LogMessage>,
        target: Option<&str>,
    ) -> Result<()> {
        let message = message.into();
        let target = target
            .filter(|target| !target.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.category.to_uppercase());

        let now = Local::now();
        let line = format_line(&now, &target, level, &message);

        let config = self.resolver.get_config().await;

        let _guard = self.write_lock.lock().await;
        let path = available_log_file_path(
            &config.log_dir,
            now.date_naive(),
            &self.category,
            config.max_file_size,
        )
        .await?;

        append_line(&path, &line).await.map_err(|e| {
            tracing::error!("Failed to write log [{}]: {}", self.category, e);
            e
        })?;

        tracing::debug!("{} entry written [{}]: {}", level, self.category, path.display());
        Ok(())
    }

    /// Currently cached log directory (None before the first resolution)
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.resolver.log_directory()
    }

    /// List today's log files of this category
    pub async fn today_log_files(&self) -> Result<Vec<PathBuf>> {
        self.log_files_for(Local::now().date_naive()).await
    }

    /// List the log files of this category for a date.
    ///
    /// Returns the base file (if present) followed by numbered files from 1,
    /// stopping at the first missing number.
    pub async fn log_files_for(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let config = self.resolver.get_config().await;
        let base = config.log_dir.join(log_file_name(date, &self.category));

        let mut files = Vec::new();
        if tokio::fs::try_exists(&base).await? {
            files.push(base.clone());
        }

        for sequence in 1..=MAX_LISTED_SEQUENCE {
            let numbered = sequence_path(&base, sequence);
            if !tokio::fs::try_exists(&numbered).await? {
                break;
            }
            files.push(numbered);
        }

        Ok(files)
    }

    /// Read the full text of a log file
    pub async fn read_log_file<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        crate::logs::read_log_file(path.as_ref()).await
    }
}
