// Output formatting and display for CLI

use crate::logs::{format_bytes, CleanupReport, LogLevel, LogLine, UploadReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a table of log files with their sizes
pub fn print_file_table(files: &[(PathBuf, u64)]) {
    #[derive(Tabled)]
    struct FileRow {
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Size")]
        size: String,
    }

    if files.is_empty() {
        println!("{}", "No log files for today".yellow());
        return;
    }

    let rows: Vec<FileRow> = files
        .iter()
        .map(|(path, size)| FileRow {
            file: display_name(path),
            size: format_bytes(*size),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Total: {} file(s)", files.len()).dimmed().italic()
    );
}

/// Print parsed log entries with colored levels
pub fn print_entries(entries: &[LogLine]) {
    if entries.is_empty() {
        println!("{}", "No logs available".yellow());
        return;
    }

    for entry in entries {
        println!(
            "{} {} {} {}",
            format!("[{}]", entry.timestamp).dimmed(),
            format!("[{}]", entry.target).cyan(),
            format_level_colored(entry.level),
            entry.message
        );
    }
}

/// Print the result of a retention cleanup
pub fn print_cleanup_report(report: &CleanupReport) {
    for path in &report.deleted_files {
        println!("  {} {}", "-".red(), path.display());
    }
    for path in &report.error_files {
        println!("  {} {}", "!".yellow().bold(), path.display());
    }

    print_success_msg(&format!(
        "Cleanup finished: {} deleted, {} failed",
        report.deleted_files.len(),
        report.error_files.len()
    ));
}

/// Print the result of an upload
pub fn print_upload_report(report: &UploadReport) {
    if report.success {
        if report.uploaded_files.is_empty() {
            print_info("No log files to upload");
        } else {
            print_success_msg(&format!(
                "Uploaded {} file(s), {}",
                report.uploaded_files.len(),
                format_bytes(report.total_size)
            ));
            for file in &report.uploaded_files {
                println!("  {}", file.cyan());
            }
        }
    }

    for failed in &report.failed_files {
        print_error(&format!("{}: {}", failed.file, failed.error));
    }
}

/// Format a log level with color coding
fn format_level_colored(level: LogLevel) -> String {
    let label = format!("[{}]", level);
    match level {
        LogLevel::Trace => label.bright_black().to_string(),
        LogLevel::Debug => label.blue().to_string(),
        LogLevel::Info => label.green().to_string(),
        LogLevel::Warn => label.yellow().to_string(),
        LogLevel::Error => label.red().bold().to_string(),
    }
}

/// File name of a path, or the full path if it has none
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Create a progress bar for the upload
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Finish a progress bar with success
pub fn finish_progress_success(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// Finish a progress bar with error
pub fn finish_progress_error(pb: ProgressBar, message: &str) {
    pb.abandon_with_message(format!("{} {}", "✗".red(), message));
}
