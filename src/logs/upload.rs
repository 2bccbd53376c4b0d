use crate::config::DEFAULT_UPLOAD_TIMEOUT_MS;
use crate::error::{LogError, Result};
use crate::logs::retention::{is_date_shaped, parse_log_file_date};
use crate::logs::LogDirectoryResolver;
use chrono::{NaiveDate, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of the per-upload temporary directory inside the log directory
pub const TEMP_UPLOAD_PREFIX: &str = "temp_upload_";

/// Progress callback: `(percent, current, total)`
pub type ProgressCallback = Arc<dyn Fn(u8, usize, usize) + Send + Sync>;

/// Options for a date-scoped upload
#[derive(Clone)]
pub struct UploadOptions {
    /// Timeout applied to the HTTP request only
    pub timeout: Duration,
    /// Headers sent in addition to `Content-Type: application/json`
    pub headers: HashMap<String, String>,
    /// Coarse progress notifications, not tied to bytes transferred
    pub on_progress: Option<ProgressCallback>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_UPLOAD_TIMEOUT_MS),
            headers: HashMap::new(),
            on_progress: None,
        }
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl UploadOptions {
    fn progress(&self, percent: u8, current: usize, total: usize) {
        if let Some(ref callback) = self.on_progress {
            callback(percent, current, total);
        }
    }
}

/// A file that could not be included in the upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Outcome of `upload_all_logs_by_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub success: bool,
    pub uploaded_files: Vec<String>,
    pub failed_files: Vec<FailedFile>,
    pub total_size: u64,
}

impl UploadReport {
    /// Successful upload with nothing to send
    pub fn empty() -> Self {
        Self {
            success: true,
            uploaded_files: Vec::new(),
            failed_files: Vec::new(),
            total_size: 0,
        }
    }

    /// Whole-batch failure
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            uploaded_files: Vec::new(),
            failed_files: vec![FailedFile {
                file: "all".to_string(),
                error: error.into(),
            }],
            total_size: 0,
        }
    }
}

/// JSON body posted to the upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub date: String,
    pub timestamp: String,
    pub total_files: usize,
    pub total_size: u64,
    pub is_partial_upload: bool,
    pub logs: Vec<LogFilePayload>,
}

/// One log file inside the upload payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilePayload {
    pub file_name: String,
    pub content: String,
    pub size: u64,
    pub log_type: String,
}

/// Check that `date` is exactly `YYYY-MM-DD` and a real calendar date
pub fn validate_date(date: &str) -> Result<NaiveDate> {
    if !is_date_shaped(date) {
        return Err(LogError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| LogError::InvalidDate(date.to_string()))
}

/// Category part of `YYYY-MM-DD.<category>.log[.N]`, or "unknown"
pub fn log_type_of(file_name: &str) -> String {
    let category = file_name
        .get(11..)
        .filter(|_| file_name.get(..10).map_or(false, is_date_shaped))
        .and_then(|rest| rest.rfind(".log").map(|end| &rest[..end]))
        .filter(|category| !category.is_empty());

    match category {
        Some(category) => category.to_string(),
        None => "unknown".to_string(),
    }
}

/// Human readable byte count, e.g. `1.5 KB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Upload every log file of one date, across all categories, as one JSON
/// payload.
///
/// Only a malformed `date` is returned as `Err`, before any I/O. Every later
/// failure is reported through `UploadReport::success`.
pub async fn upload_all_logs_by_date(
    resolver: &LogDirectoryResolver,
    date: &str,
    upload_url: &str,
    options: &UploadOptions,
) -> Result<UploadReport> {
    validate_date(date)?;

    match upload_date(resolver, date, upload_url, options).await {
        Ok(report) => Ok(report),
        Err(e) => {
            tracing::error!("Failed to upload logs for {}: {}", date, e);
            Ok(UploadReport::failure(e.to_string()))
        }
    }
}

async fn upload_date(
    resolver: &LogDirectoryResolver,
    date: &str,
    upload_url: &str,
    options: &UploadOptions,
) -> Result<UploadReport> {
    let log_dir = resolver.get_config().await.log_dir;

    if !tokio::fs::try_exists(&log_dir).await? {
        tracing::info!("Log directory does not exist, nothing to upload");
        return Ok(UploadReport::empty());
    }

    let files = files_for_date(&log_dir, date).await?;
    if files.is_empty() {
        tracing::info!("No log files found for {}", date);
        return Ok(UploadReport::empty());
    }

    tracing::info!("Uploading {} log file(s) for {}", files.len(), date);

    let temp_dir = tempfile::Builder::new()
        .prefix(TEMP_UPLOAD_PREFIX)
        .tempdir_in(&log_dir)
        .map_err(|e| LogError::LogError(format!("Failed to create temporary directory: {}", e)))?;

    let result = upload_copies(&log_dir, temp_dir.path(), &files, date, upload_url, options).await;

    if let Err(e) = temp_dir.close() {
        tracing::warn!("Failed to clean up temporary upload files: {}", e);
    }

    result
}

/// Names of the log files for `date`, sorted
async fn files_for_date(log_dir: &Path, date: &str) -> Result<Vec<String>> {
    let prefix = format!("{}.", date);
    let mut files = Vec::new();

    let mut entries = tokio::fs::read_dir(log_dir)
        .await
        .map_err(|e| LogError::LogError(format!("Failed to read log directory: {}", e)))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LogError::LogError(format!("Failed to read log directory: {}", e)))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) && parse_log_file_date(name).is_some() {
                files.push(name.to_string());
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn upload_copies(
    log_dir: &Path,
    temp_dir: &Path,
    files: &[String],
    date: &str,
    upload_url: &str,
    options: &UploadOptions,
) -> Result<UploadReport> {
    // Snapshot the files so writers can keep appending during the upload
    let mut copied = Vec::with_capacity(files.len());
    for name in files {
        let source = log_dir.join(name);
        let destination = temp_dir.join(name);
        let copy = async {
            let content = tokio::fs::read_to_string(&source).await?;
            tokio::fs::write(&destination, content).await
        };
        match copy.await {
            Ok(()) => copied.push(name.clone()),
            Err(e) => tracing::warn!("Failed to copy {}: {}", name, e),
        }
    }

    let mut failed_files = Vec::new();
    let mut logs = Vec::with_capacity(copied.len());
    let mut total_size = 0u64;

    for name in &copied {
        match tokio::fs::read_to_string(temp_dir.join(name)).await {
            Ok(content) => {
                let size = content.len() as u64;
                total_size += size;
                logs.push(LogFilePayload {
                    file_name: name.clone(),
                    content,
                    size,
                    log_type: log_type_of(name),
                });
            }
            Err(e) => {
                tracing::warn!("Failed to read copy of {}: {}", name, e);
                failed_files.push(FailedFile {
                    file: name.clone(),
                    error: format!("Read failed: {}", e),
                });
            }
        }
    }

    if logs.is_empty() {
        return Err(LogError::NothingToUpload);
    }

    let payload = UploadPayload {
        date: date.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        total_files: logs.len(),
        total_size,
        is_partial_upload: !failed_files.is_empty(),
        logs,
    };

    options.progress(0, 0, 1);
    post_payload(upload_url, &payload, options).await?;
    options.progress(100, 1, 1);

    let uploaded_files: Vec<String> = payload.logs.into_iter().map(|log| log.file_name).collect();

    tracing::info!(
        "Uploaded {} log file(s) for {} ({})",
        uploaded_files.len(),
        date,
        format_bytes(total_size)
    );

    Ok(UploadReport {
        success: true,
        uploaded_files,
        failed_files,
        total_size,
    })
}

async fn post_payload(
    upload_url: &str,
    payload: &UploadPayload,
    options: &UploadOptions,
) -> Result<serde_json::Value> {
    let timeout_ms = options.timeout.as_millis();
    let map_send_error = |e: reqwest::Error| {
        if e.is_timeout() {
            LogError::UploadTimeout(timeout_ms)
        } else {
            LogError::UploadFailed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| LogError::UploadFailed(format!("Failed to build HTTP client: {}", e)))?;

    let mut request = client
        .post(upload_url)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.json(payload).send().await.map_err(map_send_error)?;
    options.progress(50, 0, 1);

    let status = response.status();
    if !status.is_success() {
        return Err(LogError::UploadFailed(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )));
    }

    let body: serde_json::Value = response.json().await.map_err(map_send_error)?;
    tracing::debug!("Upload response: {}", body);
    Ok(body)
}
