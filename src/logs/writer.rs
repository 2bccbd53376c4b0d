use crate::error::{LogError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Maximum number of numbered files probed when rotating
pub const MAX_ROTATION_ATTEMPTS: usize = 1000;

/// Name of the first log file for a date and category: `YYYY-MM-DD.<category>.log`
pub fn log_file_name(date: NaiveDate, category: &str) -> String {
    format!("{}.{}.log", date.format("%Y-%m-%d"), category)
}

/// Path of a numbered log file: `<base>.<n>` for n >= 1, `<base>` for 0
pub fn sequence_path(base: &Path, sequence: usize) -> PathBuf {
    if sequence == 0 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}", sequence));
    PathBuf::from(name)
}

/// Pick the file the next entry for `(date, category)` goes to.
///
/// The base file is used while it is missing or below `max_size`; after that
/// numbered files are probed from 1 upward with the same test.
pub async fn available_log_file_path(
    log_dir: &Path,
    date: NaiveDate,
    category: &str,
    max_size: u64,
) -> Result<PathBuf> {
    let base = log_dir.join(log_file_name(date, category));

    for sequence in 0..=MAX_ROTATION_ATTEMPTS {
        let candidate = sequence_path(&base, sequence);
        if has_room(&candidate, max_size).await {
            return Ok(candidate);
        }
    }

    Err(LogError::RotationExhausted(
        base.display().to_string(),
        MAX_ROTATION_ATTEMPTS,
    ))
}

/// A file has room when it does not exist yet, is empty, or is under the limit
async fn has_room(path: &Path, max_size: u64) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len() == 0 || metadata.len() < max_size,
        // Missing or unreadable: treat as a fresh file
        Err(_) => true,
    }
}

/// Append a formatted line to a log file, creating it if needed.
///
/// A failed append is retried once after recreating the parent directory.
/// The retry appends as well, so existing content is never truncated.
pub async fn append_line(path: &Path, line: &str) -> Result<()> {
    match append(path, line).await {
        Ok(()) => Ok(()),
        Err(first) => {
            tracing::warn!(
                "Append to {} failed ({}), retrying once",
                path.display(),
                first
            );
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    LogError::LogError(format!("Failed to create log directory: {}", e))
                })?;
            }
            append(path, line).await.map_err(|e| {
                LogError::LogFileError(format!("Failed to write {}: {}", path.display(), e))
            })
        }
    }
}

async fn append(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(log_file_name(date(), "app"), "2025-06-10.app.log");

        let base = PathBuf::from("/logs/2025-06-10.app.log");
        assert_eq!(sequence_path(&base, 0), base);
        assert_eq!(
            sequence_path(&base, 1),
            PathBuf::from("/logs/2025-06-10.app.log.1")
        );
        assert_eq!(
            sequence_path(&base, 12),
            PathBuf::from("/logs/2025-06-10.app.log.12")
        );
    }

    #[tokio::test]
    async fn test_rotation_exhausted() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("2025-06-10.app.log");
        for sequence in 0..=MAX_ROTATION_ATTEMPTS {
            std::fs::write(sequence_path(&base, sequence), "x").unwrap();
        }

        let result = available_log_file_path(temp_dir.path(), date(), "app", 1).await;
        assert!(matches!(
            result,
            Err(LogError::RotationExhausted(_, MAX_ROTATION_ATTEMPTS))
        ));

        // Freeing the last slot makes it usable again
        std::fs::write(sequence_path(&base, MAX_ROTATION_ATTEMPTS), "").unwrap();
        let path = available_log_file_path(temp_dir.path(), date(), "app", 1)
            .await
            .unwrap();
        assert_eq!(path, sequence_path(&base, MAX_ROTATION_ATTEMPTS));
    }

    #[tokio::test]
    async fn test_base_path_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = available_log_file_path(temp_dir.path(), date(), "app", 100)
            .await
            .unwrap();
        assert_eq!(path, temp_dir.path().join("2025-06-10.app.log"));
    }

    #[tokio::test]
    async fn test_base_path_under_limit() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("2025-06-10.app.log");
        std::fs::write(&base, vec![b'x'; 99]).unwrap();

        let path = available_log_file_path(temp_dir.path(), date(), "app", 100)
            .await
            .unwrap();
        assert_eq!(path, base);
    }

    #[tokio::test]
    async fn test_rotates_at_limit() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("2025-06-10.app.log");
        std::fs::write(&base, vec![b'x'; 100]).unwrap();

        let path = available_log_file_path(temp_dir.path(), date(), "app", 100)
            .await
            .unwrap();
        assert_eq!(path, temp_dir.path().join("2025-06-10.app.log.1"));
    }

    #[tokio::test]
    async fn test_skips_full_sequence_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("2025-06-10.app.log");
        std::fs::write(&base, vec![b'x'; 150]).unwrap();
        std::fs::write(sequence_path(&base, 1), vec![b'x'; 100]).unwrap();
        std::fs::write(sequence_path(&base, 2), vec![b'x'; 10]).unwrap();

        let path = available_log_file_path(temp_dir.path(), date(), "app", 100)
            .await
            .unwrap();
        assert_eq!(path, sequence_path(&base, 2));
    }

    #[tokio::test]
    async fn test_empty_file_always_eligible() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("2025-06-10.app.log");
        std::fs::write(&base, b"").unwrap();

        // Even a zero limit accepts an empty file
        let path = available_log_file_path(temp_dir.path(), date(), "app", 0)
            .await
            .unwrap();
        assert_eq!(path, base);
    }

    #[tokio::test]
    async fn test_append_line_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.log");

        append_line(&path, "one\n").await.unwrap();
        append_line(&path, "two\n").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_append_line_recreates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone").join("a.log");

        append_line(&path, "line\n").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "line\n");
    }

    #[tokio::test]
    async fn test_append_line_fails_on_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = append_line(temp_dir.path(), "line\n").await;
        assert!(matches!(result, Err(LogError::LogFileError(_))));
    }
}
