//! Display helpers for sizes, timestamps and file types.

use chrono::{DateTime, Utc};

use crate::models::UploadFile;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size: `"0 B"`, `"512 B"`, `"1.5 KB"`, `"15.0 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", size, SIZE_UNITS[unit])
    }
}

/// "just now", "3 minutes ago", "1 week ago", ...
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }

    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let (count, unit) = if minutes < 60 {
        (minutes, "minute")
    } else if hours < 24 {
        (hours, "hour")
    } else if days < 7 {
        (days, "day")
    } else if days / 7 < 4 {
        (days / 7, "week")
    } else if days / 30 < 12 {
        (days / 30, "month")
    } else {
        (days / 365, "year")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Coarse category of a MIME type, used to pick an icon or label.
pub fn file_kind(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.starts_with("image/") {
        "image"
    } else if mime.starts_with("video/") {
        "video"
    } else if mime.starts_with("audio/") {
        "audio"
    } else if mime.contains("pdf") {
        "pdf"
    } else if mime.contains("word") || mime.contains("document") {
        "document"
    } else if mime.contains("sheet") || mime.contains("excel") {
        "spreadsheet"
    } else if mime.contains("presentation") || mime.contains("powerpoint") {
        "presentation"
    } else if mime.contains("zip") || mime.contains("compressed") {
        "archive"
    } else if mime.starts_with("text/") {
        "text"
    } else {
        "file"
    }
}

/// Client-side check before an upload is attempted.
pub fn validate_upload(file: &UploadFile, max_mb: u64) -> Result<(), String> {
    let max_bytes = max_mb.saturating_mul(1024 * 1024);
    if file.size() > max_bytes {
        return Err(format!("File size exceeds {}MB limit", max_mb));
    }
    if file.mime_type.trim().is_empty() {
        return Err("File type cannot be determined".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(15 * 1024 * 1024), "15.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_file_size(u64::MAX), "16777216.0 TB");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        let ago = |d: Duration| format_relative_time(now - d, now);

        assert_eq!(ago(Duration::seconds(5)), "just now");
        assert_eq!(ago(Duration::seconds(-30)), "just now");
        assert_eq!(ago(Duration::minutes(1)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(ago(Duration::hours(2)), "2 hours ago");
        assert_eq!(ago(Duration::days(1)), "1 day ago");
        assert_eq!(ago(Duration::days(13)), "1 week ago");
        assert_eq!(ago(Duration::days(45)), "1 month ago");
        assert_eq!(ago(Duration::days(800)), "2 years ago");
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(file_kind("image/png"), "image");
        assert_eq!(file_kind("application/pdf"), "pdf");
        assert_eq!(
            file_kind("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            "document"
        );
        assert_eq!(file_kind("application/vnd.ms-excel"), "spreadsheet");
        assert_eq!(file_kind("application/zip"), "archive");
        assert_eq!(file_kind("text/plain"), "text");
        assert_eq!(file_kind("application/octet-stream"), "file");
    }

    #[test]
    fn test_validate_upload() {
        let ok = UploadFile::new("a.txt", "text/plain", vec![0; 10]);
        assert!(validate_upload(&ok, 15).is_ok());

        let big = UploadFile::new("a.txt", "text/plain", vec![0; 2 * 1024 * 1024 + 1]);
        assert_eq!(
            validate_upload(&big, 2).unwrap_err(),
            "File size exceeds 2MB limit"
        );

        let untyped = UploadFile::new("blob", "", vec![1]);
        assert!(validate_upload(&untyped, 15).is_err());
    }
}
