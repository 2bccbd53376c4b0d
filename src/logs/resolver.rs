use crate::config::{LogConfig, Settings, DEFAULT_MAX_FILE_SIZE};
use crate::error::{LogError, Result};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// Directory used when the application data directory cannot be resolved
pub const FALLBACK_LOG_DIR: &str = "./logs";

/// Where the log directory comes from
#[derive(Debug, Clone)]
pub enum LogDirSource {
    /// Platform application data directory joined with the app identifier,
    /// plus a `logs` segment
    AppData { app_identifier: String },
    /// A directory used as-is
    Fixed(PathBuf),
}

/// Resolves the on-disk logs directory once and caches it.
///
/// Shared through `Arc` by every `LogManager` of the process. Concurrent first
/// callers all wait on the same initialization and observe the same result.
pub struct LogDirectoryResolver {
    source: LogDirSource,
    max_file_size: u64,
    config: OnceCell<LogConfig>,
}

impl LogDirectoryResolver {
    /// Create a resolver backed by the platform application data directory
    pub fn new(app_identifier: impl Into<String>) -> Self {
        Self::with_source(
            LogDirSource::AppData {
                app_identifier: app_identifier.into(),
            },
            DEFAULT_MAX_FILE_SIZE,
        )
    }

    /// Create a resolver that uses `log_dir` directly
    pub fn with_log_dir<P: AsRef<Path>>(log_dir: P) -> Self {
        Self::with_source(
            LogDirSource::Fixed(log_dir.as_ref().to_path_buf()),
            DEFAULT_MAX_FILE_SIZE,
        )
    }

    /// Create a resolver from a source and rotation limit
    pub fn with_source(source: LogDirSource, max_file_size: u64) -> Self {
        Self {
            source,
            max_file_size,
            config: OnceCell::new(),
        }
    }

    /// Create a resolver from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        let source = match settings.log_dir {
            Some(ref dir) => LogDirSource::Fixed(dir.clone()),
            None => LogDirSource::AppData {
                app_identifier: settings.app_identifier.clone(),
            },
        };
        Self::with_source(source, settings.max_file_size)
    }

    /// Override the rotation limit (builder style)
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Get the resolved configuration, resolving the directory on first call
    pub async fn get_config(&self) -> LogConfig {
        self.config
            .get_or_init(|| async {
                let log_dir = match self.resolve().await {
                    Ok(dir) => dir,
                    Err(e) => {
                        tracing::error!("Failed to initialize log directory: {}", e);
                        PathBuf::from(FALLBACK_LOG_DIR)
                    }
                };

                LogConfig {
                    max_file_size: self.max_file_size,
                    log_dir,
                }
            })
            .await
            .clone()
    }

    /// Currently cached log directory, `None` until `get_config` has completed
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.config.get().map(|config| config.log_dir.clone())
    }

    async fn resolve(&self) -> Result<PathBuf> {
        let log_dir = match self.source {
            LogDirSource::AppData { ref app_identifier } => dirs::data_dir()
                .ok_or_else(|| {
                    LogError::LogError("Application data directory is unavailable".to_string())
                })?
                .join(app_identifier)
                .join("logs"),
            LogDirSource::Fixed(ref dir) => dir.clone(),
        };

        if !tokio::fs::try_exists(&log_dir).await? {
            tokio::fs::create_dir_all(&log_dir).await.map_err(|e| {
                LogError::LogError(format!(
                    "Failed to create log directory {}: {}",
                    log_dir.display(),
                    e
                ))
            })?;
            tracing::info!("Created log directory: {}", log_dir.display());
        }

        Ok(log_dir)
    }
}
