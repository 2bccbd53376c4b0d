use crate::error::{LogError, Result};
use crate::logs::LogDirectoryResolver;
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use std::path::PathBuf;

/// Outcome of a retention cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted_files: Vec<PathBuf>,
    pub error_files: Vec<PathBuf>,
}

/// Match `YYYY-MM-DD.<anything>.log` with an optional `.<digits>` suffix and
/// return the leading date
pub fn parse_log_file_date(name: &str) -> Option<NaiveDate> {
    let date_part = name.get(..10)?;
    if !is_date_shaped(date_part) {
        return None;
    }
    let rest = name[10..].strip_prefix('.')?;

    let rest = match rest.rsplit_once('.') {
        Some((head, suffix))
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => rest,
    };
    // `<anything>.log`, where <anything> may be empty
    if !rest.ends_with(".log") {
        return None;
    }

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// `NNNN-NN-NN`
pub(crate) fn is_date_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Delete log files whose date (taken as local midnight) is strictly before
/// now minus `days_to_keep` days.
///
/// Scans the whole log directory regardless of category. Files that fail to
/// delete are reported in `error_files`; other names are ignored.
pub async fn cleanup_all_old_logs(
    resolver: &LogDirectoryResolver,
    days_to_keep: u32,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    let log_dir = resolver.get_config().await.log_dir;

    if !tokio::fs::try_exists(&log_dir).await? {
        tracing::info!("Log directory does not exist, nothing to clean up");
        return Ok(report);
    }

    let cutoff = Local::now().naive_local() - Duration::days(i64::from(days_to_keep));
    tracing::info!(
        "Cleaning up log files older than {} days (cutoff {})",
        days_to_keep,
        cutoff
    );

    let mut entries = tokio::fs::read_dir(&log_dir)
        .await
        .map_err(|e| LogError::LogError(format!("Failed to read log directory: {}", e)))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LogError::LogError(format!("Failed to read log directory: {}", e)))?
    {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(file_date) = parse_log_file_date(&name) else {
            continue;
        };

        if file_date.and_time(NaiveTime::MIN) < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!("Deleted old log file: {} ({})", name, file_date);
                    report.deleted_files.push(path);
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", name, e);
                    report.error_files.push(path);
                }
            }
        }
    }

    tracing::info!(
        "Log cleanup finished: {} deleted, {} failed",
        report.deleted_files.len(),
        report.error_files.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_log_file_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
        assert_eq!(parse_log_file_date("2024-05-11.app.log"), Some(date));
        assert_eq!(parse_log_file_date("2024-05-11.app.log.3"), Some(date));
        assert_eq!(parse_log_file_date("2024-05-11.my.http.log.12"), Some(date));
        assert_eq!(parse_log_file_date("2024-05-11..log"), Some(date));

        assert_eq!(parse_log_file_date("notes.txt"), None);
        assert_eq!(parse_log_file_date("2024-05-11.app.txt"), None);
        assert_eq!(parse_log_file_date("2024-05-11.app.log.x"), None);
        assert_eq!(parse_log_file_date("2024-05-11.log"), None);
        assert_eq!(parse_log_file_date("24-05-11.app.log"), None);
        assert_eq!(parse_log_file_date("2024-13-40.app.log"), None);
    }

    #[test]
    fn test_is_date_shaped() {
        assert!(is_date_shaped("2025-06-10"));
        assert!(is_date_shaped("2025-13-40"));
        assert!(!is_date_shaped("2025-6-10"));
        assert!(!is_date_shaped("2025/06/10"));
    }

    #[tokio::test]
    async fn test_cleanup_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let resolver = LogDirectoryResolver::with_log_dir(&log_dir);
        resolver.get_config().await;
        std::fs::remove_dir(&log_dir).unwrap();

        let report = cleanup_all_old_logs(&resolver, 30).await.unwrap();
        assert_eq!(report, CleanupReport::default());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let today = Local::now().date_naive();
        let name = |days: i64| {
            let date = today - Duration::days(days);
            format!("{}.app.log", date.format("%Y-%m-%d"))
        };

        std::fs::write(temp_dir.path().join(name(40)), "old\n").unwrap();
        std::fs::write(temp_dir.path().join(format!("{}.1", name(40))), "old\n").unwrap();
        std::fs::write(temp_dir.path().join(name(20)), "mid\n").unwrap();
        std::fs::write(temp_dir.path().join(name(5)), "new\n").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "keep\n").unwrap();

        let resolver = LogDirectoryResolver::with_log_dir(temp_dir.path());
        let report = cleanup_all_old_logs(&resolver, 30).await.unwrap();

        assert_eq!(report.deleted_files.len(), 2);
        assert!(report.error_files.is_empty());
        assert!(!temp_dir.path().join(name(40)).exists());
        assert!(temp_dir.path().join(name(20)).exists());
        assert!(temp_dir.path().join(name(5)).exists());
        assert!(temp_dir.path().join("notes.txt").exists());
    }
}
