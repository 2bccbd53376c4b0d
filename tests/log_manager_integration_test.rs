use applog::logs::{
    log_file_name, read_entries, sequence_path, LogDirectoryResolver, LogLevel, LogManager,
    LogReadOptions,
};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn resolver(temp_dir: &TempDir, max_size: u64) -> Arc<LogDirectoryResolver> {
    Arc::new(LogDirectoryResolver::with_log_dir(temp_dir.path()).max_file_size(max_size))
}

fn today_base(temp_dir: &TempDir, category: &str) -> PathBuf {
    temp_dir
        .path()
        .join(log_file_name(Local::now().date_naive(), category))
}

/// `[YYYY-MM-DD HH:MM:SS.mmm][target][LEVEL] message`
fn is_formatted_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.len() < 26 || bytes[0] != b'[' || bytes[24] != b']' {
        return false;
    }
    let digits_ok = bytes[1..24].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b' ',
        13 | 16 => *b == b':',
        19 => *b == b'.',
        _ => b.is_ascii_digit(),
    });
    let rest = &line[25..];
    let Some(rest) = rest.strip_prefix('[') else {
        return false;
    };
    let Some(target_end) = rest.find("][") else {
        return false;
    };
    let rest = &rest[target_end + 2..];
    let level_ok = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"]
        .iter()
        .any(|level| rest.starts_with(&format!("{}] ", level)));
    digits_ok && target_end > 0 && level_ok
}

#[tokio::test]
async fn test_every_level_matches_line_format() {
    let temp_dir = TempDir::new().unwrap();
    let manager = LogManager::app(resolver(&temp_dir, 1024 * 1024));

    for level in LogLevel::ALL {
        manager.log(format!("{} message", level), level, None).await.unwrap();
        manager
            .log(format!("{} targeted", level), level, Some("MyApp"))
            .await
            .unwrap();
    }

    let content = std::fs::read_to_string(today_base(&temp_dir, "app")).unwrap();
    assert_eq!(content.lines().count(), 10);
    for line in content.lines() {
        assert!(is_formatted_line(line), "bad line: {}", line);
    }
}

#[tokio::test]
async fn test_write_just_under_limit_stays_in_base_file() {
    let temp_dir = TempDir::new().unwrap();
    let max_size = 256;
    let manager = LogManager::app(resolver(&temp_dir, max_size));
    let base = today_base(&temp_dir, "app");

    std::fs::write(&base, vec![b'x'; (max_size - 1) as usize]).unwrap();
    manager.info("small", None).await.unwrap();

    let content = std::fs::read_to_string(&base).unwrap();
    assert!(content.ends_with("[APP][INFO] small\n"));
    assert!(!sequence_path(&base, 1).exists());

    // The base file is now over the limit, so the next entry rolls over
    manager.info("rolled", None).await.unwrap();
    let rolled = std::fs::read_to_string(sequence_path(&base, 1)).unwrap();
    assert!(rolled.ends_with("[APP][INFO] rolled\n"));
}

#[tokio::test]
async fn test_listing_stops_at_first_gap() {
    let temp_dir = TempDir::new().unwrap();
    let manager = LogManager::http(resolver(&temp_dir, 1024));
    let base = today_base(&temp_dir, "http");

    std::fs::write(&base, "a\n").unwrap();
    std::fs::write(sequence_path(&base, 1), "b\n").unwrap();
    std::fs::write(sequence_path(&base, 5), "c\n").unwrap();

    let files = manager.today_log_files().await.unwrap();
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn test_written_entries_read_back() {
    let temp_dir = TempDir::new().unwrap();
    let manager = LogManager::http(resolver(&temp_dir, 1024 * 1024));

    manager
        .info(serde_json::json!({"method": "GET", "status": 200}), None)
        .await
        .unwrap();
    manager.error("GET /api/users - 500", Some("API")).await.unwrap();

    let files = manager.today_log_files().await.unwrap();
    let entries = read_entries(&files[0], &LogReadOptions::default())
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].target, "HTTP");
    assert!(entries[0].message.contains("\"status\": 200"));
    assert_eq!(entries[1].target, "API");
    assert_eq!(entries[1].level, LogLevel::Error);
}

#[tokio::test]
async fn test_log_directory_created_on_first_write() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("app-data").join("logs");
    let manager = LogManager::app(Arc::new(LogDirectoryResolver::with_log_dir(&log_dir)));

    assert!(!log_dir.exists());
    manager.info("hello", None).await.unwrap();

    assert!(log_dir.is_dir());
    assert_eq!(manager.log_directory(), Some(log_dir));
}
