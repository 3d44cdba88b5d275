//! Plain-text evidence reports.
//!
//! Two line-oriented, human-readable dumps: the suspicious-files
//! listing and the recycle-bin listing. Numbered entries with fixed
//! fields under a header carrying the generation time and total count.
//! Not intended for re-parsing.

use crate::core::types::{RecycleBinEntry, ScannedFile};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

const RULE_WIDTH: usize = 80;

fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Render the suspicious-files report.
pub fn suspicious_files_report(files: &[ScannedFile], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "SUSPICIOUS FILES REPORT");
    let _ = writeln!(out, "Generated: {}", format_time(Some(generated_at)));
    let _ = writeln!(out, "Total suspicious files found: {}", files.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out);

    for (index, file) in files.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, file.path.display());
        let _ = writeln!(out, "   Filename: {}", file.file_name);
        let reasons: Vec<String> = file.reasons.iter().map(|r| r.to_string()).collect();
        let _ = writeln!(out, "   Reasons: {}", reasons.join(", "));

        if let Some(size) = file.size_bytes {
            let _ = writeln!(out, "   Size: {} bytes", size);
            let _ = writeln!(out, "   Created: {}", format_time(file.times.created));
            let _ = writeln!(out, "   Modified: {}", format_time(file.times.modified));
            let _ = writeln!(out, "   Last Accessed: {}", format_time(file.times.accessed));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        let _ = writeln!(out);
    }

    out
}

/// Render the recycle-bin report.
pub fn recycle_bin_report(entries: &[RecycleBinEntry], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "RECYCLE BIN FILES REPORT");
    let _ = writeln!(out, "Generated: {}", format_time(Some(generated_at)));
    let _ = writeln!(out, "Total files in Recycle Bin: {}", entries.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out);

    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, entry.record_path.display());
        let _ = writeln!(out, "   Filename: {}", entry.original_name);
        let _ = writeln!(out, "   Drive: {}", entry.source_drive);
        let _ = writeln!(out, "   Size: {} bytes", entry.size_bytes);
        let _ = writeln!(out, "   Deleted: {}", format_time(entry.deleted_at));
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        let _ = writeln!(out);
    }

    out
}
