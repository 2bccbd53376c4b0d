use crate::error::{LogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default maximum log file size before rotation (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of days kept by retention cleanup
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Default upload timeout in milliseconds
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 60_000;

/// Resolved runtime configuration shared by every log category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Maximum size in bytes before a log file is rotated away from
    pub max_file_size: u64,
    /// Directory holding all log files
    pub log_dir: PathBuf,
}

/// Settings loaded from a configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Application identifier, used as the app-data subdirectory name
    #[serde(default = "default_app_identifier")]
    pub app_identifier: String,

    /// Explicit log directory (skips app-data resolution)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Maximum log file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Days of logs kept by cleanup
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Upload endpoint settings
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Upload endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Endpoint receiving the JSON payload
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_ms: u64,

    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

// Default value functions for serde
fn default_app_identifier() -> String {
    "com.demo.app".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_upload_timeout() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_MS
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_upload_timeout(),
            headers: HashMap::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_identifier: default_app_identifier(),
            log_dir: None,
            max_file_size: default_max_file_size(),
            retention_days: default_retention_days(),
            upload: UploadSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LogError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut settings = match extension {
            "toml" => toml::from_str::<Settings>(&contents)
                .map_err(|e| LogError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str::<Settings>(&contents)
                .map_err(|e| LogError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(LogError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        settings.expand_env_vars();
        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.app_identifier.trim().is_empty() {
            return Err(LogError::ConfigValidationError(
                "app_identifier must not be empty".to_string(),
            ));
        }

        if self.max_file_size == 0 {
            return Err(LogError::ConfigValidationError(
                "max_file_size must be at least 1 byte".to_string(),
            ));
        }

        if self.upload.timeout_ms == 0 {
            return Err(LogError::ConfigValidationError(
                "upload.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(ref url) = self.upload.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LogError::ConfigValidationError(format!(
                    "upload.url must be an http(s) URL: {}",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variables in path-like fields
    fn expand_env_vars(&mut self) {
        if let Some(ref dir) = self.log_dir {
            let expanded = expand_env_in_string(&dir.to_string_lossy());
            self.log_dir = Some(PathBuf::from(expanded));
        }

        if let Some(ref url) = self.upload.url {
            self.upload.url = Some(expand_env_in_string(url));
        }

        self.upload.headers = self
            .upload
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), expand_env_in_string(v)))
            .collect();
    }

    /// Upload timeout as Duration
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload.timeout_ms)
    }
}

/// Expand `$VAR` and `${VAR}` references in a string.
///
/// A bare `$VAR` takes the longest run of `[A-Za-z0-9_]` as the name.
/// Unset variables and malformed references are left as written.
fn expand_env_in_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => {
                result.push_str(&value);
                rest = &after[consumed..];
            }
            _ => {
                result.push('$');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}
