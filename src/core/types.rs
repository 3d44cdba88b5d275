//! Core type definitions used throughout pc-sentinel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a file was classified as suspicious.
///
/// Tags are additive evidence: a file may carry any number of them and
/// they are never mutually exclusive. `SuspiciousDll` takes precedence
/// over `UnusualExtension` for the same file; the classifier enforces
/// that, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "tag", content = "detail")]
pub enum ReasonTag {
    /// Name looks machine-generated (long alphanumeric, high entropy)
    RandomName,
    /// Exact match against the known-bad executable name list
    KnownBadName,
    /// A cheat-related keyword matched the name or the path
    SuspiciousKeyword { location: KeywordLocation },
    /// DLL whose name matches the keyword rule
    SuspiciousDll,
    /// Binary extension (.dll/.sys/.ocx/.scr) under a user profile folder
    UnusualExtension,
    /// No descriptive version metadata at all (copyright, version, company)
    MissingMetadata,
}

/// Where a keyword match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordLocation {
    FileName,
    FullPath,
}

impl std::fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonTag::RandomName => write!(f, "Random alphanumeric name"),
            ReasonTag::KnownBadName => write!(f, "Known suspicious filename"),
            ReasonTag::SuspiciousKeyword {
                location: KeywordLocation::FileName,
            } => write!(f, "Contains suspicious name part"),
            ReasonTag::SuspiciousKeyword {
                location: KeywordLocation::FullPath,
            } => write!(f, "Located in suspicious folder"),
            ReasonTag::SuspiciousDll => write!(f, "Suspicious DLL with suspicious name part"),
            ReasonTag::UnusualExtension => write!(f, "Unusual extension in user folder"),
            ReasonTag::MissingMetadata => {
                write!(f, "Missing file metadata (copyright, version, company info)")
            }
        }
    }
}

impl ReasonTag {
    /// High-priority tags drive the "most suspicious" summary view.
    pub fn is_high_priority(&self) -> bool {
        matches!(
            self,
            ReasonTag::KnownBadName | ReasonTag::SuspiciousKeyword { .. }
        )
    }
}

/// Filesystem timestamps for a scanned file. Stat may fail; a file
/// without times is still evidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTimes {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
}

/// A file flagged by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Absolute path on the scanned volume
    pub path: PathBuf,
    /// Final path component
    pub file_name: String,
    /// Size in bytes, if stat succeeded
    pub size_bytes: Option<u64>,
    /// Filesystem timestamps, if stat succeeded
    pub times: FileTimes,
    /// Every rule that matched, in evaluation order
    pub reasons: Vec<ReasonTag>,
}

impl ScannedFile {
    /// Create a scanned file from a path and the reasons that matched.
    pub fn new(path: PathBuf, reasons: Vec<ReasonTag>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            size_bytes: None,
            times: FileTimes::default(),
            reasons,
        }
    }

    /// Attach stat results.
    pub fn with_stat(mut self, size_bytes: u64, times: FileTimes) -> Self {
        self.size_bytes = Some(size_bytes);
        self.times = times;
        self
    }

    /// True if the file name ends in `.dll` (case-insensitive).
    pub fn is_dll(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".dll")
    }
}

/// One deleted item recovered from the recycle bin's on-disk records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecycleBinEntry {
    /// Original name decoded from the index record, or the record's own
    /// filesystem name when the record is malformed
    pub original_name: String,
    /// Size of the moved content when its record exists, else the index
    /// record's size
    pub size_bytes: u64,
    /// Deletion time (index record's modified time)
    pub deleted_at: Option<DateTime<Utc>>,
    /// Volume the item was deleted from (e.g. "C:")
    pub source_drive: String,
    /// Path of the index record this entry was parsed from
    pub record_path: PathBuf,
}

/// A platform account found in the local credential store, merged with
/// the remote reputation lookup. Lookup failure degrades the record to
/// unknown rather than discarding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// 17-digit platform identifier
    pub platform_id: String,
    /// Login name from the credential store
    pub account_name: String,
    /// Display name from the credential store
    pub display_name: String,
    /// Whether this was the most recently used session
    pub most_recent: bool,
    /// Any ban on record (VAC or game ban)
    pub banned: bool,
    /// VAC ban specifically
    pub vac_banned: bool,
    /// Number of game bans
    pub ban_count: u32,
    /// Days since the most recent ban, when banned
    pub days_since_last_ban: Option<u32>,
    /// Account creation time, when the profile lookup returned one
    pub created_at: Option<DateTime<Utc>>,
    /// Human-readable age bucket ("3 months ago", "5 years ago", "Unknown")
    pub account_age: String,
    /// Remote lookup failed; ban fields are defaults, not findings
    pub lookup_failed: bool,
}

impl AccountRecord {
    /// Build a record from credential-store fields only, before any
    /// remote lookup has run.
    pub fn local_only(
        platform_id: impl Into<String>,
        account_name: impl Into<String>,
        display_name: impl Into<String>,
        most_recent: bool,
    ) -> Self {
        Self {
            platform_id: platform_id.into(),
            account_name: account_name.into(),
            display_name: display_name.into(),
            most_recent,
            banned: false,
            vac_banned: false,
            ban_count: 0,
            days_since_last_ban: None,
            created_at: None,
            account_age: "Unknown".to_string(),
            lookup_failed: false,
        }
    }
}

/// Status of a monitored OS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Stopped,
    NotFound,
    Unknown,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Running => write!(f, "Running"),
            ServiceStatus::Stopped => write!(f, "Stopped"),
            ServiceStatus::NotFound => write!(f, "Not Found"),
            ServiceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Defender tamper-protection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TamperProtection {
    Enabled,
    Disabled,
    Unknown,
}

impl std::fmt::Display for TamperProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TamperProtection::Enabled => write!(f, "Enabled"),
            TamperProtection::Disabled => write!(f, "Disabled"),
            TamperProtection::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Outcome of a collaborator check.
///
/// A degraded or failed check must stay distinguishable from a clean
/// result with zero findings, so the bundle carries the tag instead of
/// collapsing to an empty collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "value")]
pub enum Outcome<T> {
    /// The check ran and produced data
    Ok(T),
    /// The check could not run fully; partial or no data
    Degraded { reason: String },
    /// The check failed outright
    Failed { kind: String },
}

impl<T> Outcome<T> {
    /// Map the inner value, preserving degradation tags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::Degraded { reason } => Outcome::Degraded { reason },
            Outcome::Failed { kind } => Outcome::Failed { kind },
        }
    }

    /// The inner value, if the check succeeded.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the inner value, if the check succeeded.
    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Outcome::Ok(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }
}

/// Descriptive version-resource metadata for an executable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    pub has_copyright: bool,
    pub has_product_version: bool,
    pub has_file_version: bool,
    pub has_company_name: bool,
    pub has_product_name: bool,
    pub company_name: Option<String>,
    pub product_name: Option<String>,
}

impl FileMetadata {
    /// A file with any descriptive field is treated as carrying metadata.
    pub fn has_any(&self) -> bool {
        self.has_copyright
            || self.has_product_version
            || self.has_file_version
            || self.has_company_name
            || self.has_product_name
    }
}

/// A known-signature match against the fixed name+size table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureMatch {
    /// Name from the signature table
    pub signature_name: String,
    /// File that matched
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: Option<u64>,
    /// "size" or "name", whichever triggered
    pub matched_on: String,
}
