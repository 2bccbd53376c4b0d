// CLI module - User-facing command-line interface

mod output;

use crate::config::Settings;
use crate::error::{LogError, Result};
use crate::logs::{
    cleanup_all_old_logs, read_entries, upload_all_logs_by_date, LogDirSource,
    LogDirectoryResolver, LogLevel, LogManager, LogMessage, LogReadOptions, UploadOptions,
    APP_CATEGORY,
};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// applog - Category log files with rotation, cleanup and upload
#[derive(Parser)]
#[command(name = "applog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log directory (overrides the application data directory)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a log entry (JSON objects and arrays are stored structured)
    Write {
        /// Message to log
        message: String,

        /// Log category
        #[arg(long, default_value = APP_CATEGORY)]
        category: String,

        /// Log level
        #[arg(short, long, default_value = "info")]
        level: LogLevel,

        /// Target label (defaults to the upper-cased category)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Write a structured HTTP request entry to the http category
    Http {
        /// Request method
        method: String,

        /// Request URL
        url: String,

        /// Response status code
        status: u16,

        /// Request duration in milliseconds
        duration_ms: u64,
    },

    /// List today's log files of a category
    List {
        /// Log category
        #[arg(long, default_value = APP_CATEGORY)]
        category: String,
    },

    /// Print the entries of a log file
    Read {
        /// Path to the log file
        path: PathBuf,

        /// Number of entries to display
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,

        /// Minimum level to display
        #[arg(short, long)]
        level: Option<LogLevel>,

        /// Only show entries containing this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print the log directory
    Dir,

    /// Delete log files older than the retention period
    Cleanup {
        /// Days to keep (defaults to the configured retention)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Upload all log files of a date
    Upload {
        /// Date in YYYY-MM-DD format
        date: String,

        /// Upload endpoint (defaults to the configured URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Extra headers (KEY=VALUE format)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let resolver = Arc::new(self.build_resolver(&settings));

        match &self.command {
            Commands::Write {
                message,
                category,
                level,
                target,
            } => {
                let manager = LogManager::new(category.clone(), resolver);
                manager
                    .log(LogMessage::parse_input(message), *level, target.as_deref())
                    .await?;
                output::print_success_msg(&format!(
                    "{} entry written to [{}]",
                    level,
                    manager.category()
                ));
            }

            Commands::Http {
                method,
                url,
                status,
                duration_ms,
            } => {
                let manager = LogManager::http(resolver);
                let level = write_http_entry(&manager, method, url, *status, *duration_ms).await?;
                output::print_success_msg(&format!("{} HTTP entry written", level));
            }

            Commands::List { category } => {
                let manager = LogManager::new(category.clone(), resolver);
                let mut files = Vec::new();
                for path in manager.today_log_files().await? {
                    let size = tokio::fs::metadata(&path).await?.len();
                    files.push((path, size));
                }
                output::print_file_table(&files);
            }

            Commands::Read {
                path,
                lines,
                level,
                filter,
            } => {
                let options = LogReadOptions {
                    lines: *lines,
                    min_level: *level,
                    filter: filter.clone(),
                };
                let entries = read_entries(path, &options).await?;
                output::print_entries(&entries);
            }

            Commands::Dir => {
                let config = resolver.get_config().await;
                println!("{}", config.log_dir.display());
            }

            Commands::Cleanup { days } => {
                let days = days.unwrap_or(settings.retention_days);
                let report = cleanup_all_old_logs(&resolver, days).await?;
                output::print_cleanup_report(&report);
            }

            Commands::Upload {
                date,
                url,
                timeout_ms,
                headers,
            } => {
                let url = url
                    .clone()
                    .or_else(|| settings.upload.url.clone())
                    .ok_or_else(|| {
                        LogError::ConfigError(
                            "No upload URL given; pass --url or set upload.url".to_string(),
                        )
                    })?;

                let mut all_headers = settings.upload.headers.clone();
                all_headers.extend(parse_headers(headers)?);

                let pb = output::create_progress_bar(&format!("Uploading logs for {}", date));
                let progress_bar = pb.clone();
                let options = UploadOptions {
                    timeout: timeout_ms
                        .map(Duration::from_millis)
                        .unwrap_or_else(|| settings.upload_timeout()),
                    headers: all_headers,
                    on_progress: Some(Arc::new(move |percent: u8, _: usize, _: usize| {
                        progress_bar.set_position(u64::from(percent));
                    })),
                };

                let report = match upload_all_logs_by_date(&resolver, date, &url, &options).await
                {
                    Ok(report) => report,
                    Err(e) => {
                        output::finish_progress_error(pb, "Upload rejected");
                        return Err(e);
                    }
                };

                if report.success {
                    output::finish_progress_success(pb, "Upload finished");
                } else {
                    output::finish_progress_error(pb, "Upload failed");
                }
                output::print_upload_report(&report);

                if !report.success {
                    return Err(LogError::UploadFailed(format!("logs for {}", date)));
                }
            }
        }

        Ok(())
    }

    /// Build the directory resolver from settings and flags
    fn build_resolver(&self, settings: &Settings) -> LogDirectoryResolver {
        match self.log_dir {
            Some(ref dir) => LogDirectoryResolver::with_source(
                LogDirSource::Fixed(dir.clone()),
                settings.max_file_size,
            ),
            None => LogDirectoryResolver::from_settings(settings),
        }
    }
}

/// Level for an HTTP entry based on its status code
/// Target recorded for HTTP client request entries
const HTTP_CLIENT_TARGET: &str = "HTTP_CLIENT";

/// Record one HTTP request and return the level it was logged at
async fn write_http_entry(
    manager: &LogManager,
    method: &str,
    url: &str,
    status: u16,
    duration_ms: u64,
) -> Result<LogLevel> {
    let entry = serde_json::json!({
        "method": method.to_uppercase(),
        "url": url,
        "status": status,
        "duration": format!("{}ms", duration_ms),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    let level = http_level(status);
    manager.log(entry, level, Some(HTTP_CLIENT_TARGET)).await?;
    Ok(level)
}

fn http_level(status: u16) -> LogLevel {
    match status {
        500..=u16::MAX => LogLevel::Error,
        400..=499 => LogLevel::Warn,
        _ => LogLevel::Info,
    }
}

/// Parse headers from KEY=VALUE format
fn parse_headers(headers: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();

    for header in headers {
        if let Some((key, value)) = header.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        } else {
            return Err(LogError::ConfigError(format!(
                "Invalid header format: '{}'. Expected KEY=VALUE",
                header
            )));
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = vec![
            "Authorization=Bearer abc".to_string(),
            "X-Device = 42".to_string(),
        ];
        let result = parse_headers(&headers).unwrap();
        assert_eq!(result.get("Authorization"), Some(&"Bearer abc".to_string()));
        assert_eq!(result.get("X-Device"), Some(&"42".to_string()));
    }

    #[test]
    fn test_parse_headers_invalid() {
        let headers = vec!["INVALID".to_string()];
        assert!(parse_headers(&headers).is_err());
    }

    #[tokio::test]
    async fn test_http_entry_uses_client_target() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let resolver = Arc::new(LogDirectoryResolver::with_log_dir(temp_dir.path()));
        let manager = LogManager::http(resolver);

        let level = write_http_entry(&manager, "get", "/api/users", 404, 12)
            .await
            .unwrap();
        assert_eq!(level, LogLevel::Warn);

        let files = manager.today_log_files().await.unwrap();
        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("][HTTP_CLIENT][WARN] {"), "{}", content);
        assert!(content.contains("\"method\": \"GET\""));
        assert!(content.contains("\"duration\": \"12ms\""));
    }

    #[test]
    fn test_http_level() {
        assert_eq!(http_level(200), LogLevel::Info);
        assert_eq!(http_level(302), LogLevel::Info);
        assert_eq!(http_level(404), LogLevel::Warn);
        assert_eq!(http_level(503), LogLevel::Error);
    }

    #[test]
    fn test_cli_parses_write() {
        let cli = Cli::try_parse_from([
            "applog", "--log-dir", "/tmp/x", "write", "hello", "-l", "warn", "-t", "MyApp",
        ])
        .unwrap();
        match cli.command {
            Commands::Write {
                message,
                category,
                level,
                target,
            } => {
                assert_eq!(message, "hello");
                assert_eq!(category, "app");
                assert_eq!(level, LogLevel::Warn);
                assert_eq!(target.as_deref(), Some("MyApp"));
            }
            _ => panic!("expected write command"),
        }
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_cli_parses_upload_headers() {
        let cli = Cli::try_parse_from([
            "applog",
            "upload",
            "2025-06-10",
            "--url",
            "http://localhost/upload",
            "-H",
            "A=1",
            "-H",
            "B=2",
        ])
        .unwrap();
        match cli.command {
            Commands::Upload { date, headers, .. } => {
                assert_eq!(date, "2025-06-10");
                assert_eq!(headers.len(), 2);
            }
            _ => panic!("expected upload command"),
        }
    }
}
