// Logs module - Category log files with rotation, retention and upload

mod entry;
mod manager;
mod reader;
mod resolver;
mod retention;
mod upload;
mod writer;

pub use entry::{format_line, LogLevel, LogLine, LogMessage, TIMESTAMP_FORMAT};
pub use manager::{LogManager, APP_CATEGORY, HTTP_CATEGORY};
pub use reader::{parse_entries, read_entries, read_log_file, LogReadOptions};
pub use resolver::{LogDirSource, LogDirectoryResolver, FALLBACK_LOG_DIR};
pub use retention::{cleanup_all_old_logs, parse_log_file_date, CleanupReport};
pub use upload::{
    format_bytes, log_type_of, upload_all_logs_by_date, validate_date, FailedFile,
    LogFilePayload, ProgressCallback, UploadOptions, UploadPayload, UploadReport,
    TEMP_UPLOAD_PREFIX,
};
pub use writer::{
    append_line, available_log_file_path, log_file_name, sequence_path, MAX_ROTATION_ATTEMPTS,
};
