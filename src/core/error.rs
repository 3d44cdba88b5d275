//! Error types and result handling for pc-sentinel.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pc-sentinel operations.
#[derive(Error, Debug)]
pub enum Error {
    // ===== I/O Errors =====
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access directory: {path}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Permission denied: {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No scannable volume could be enumerated")]
    NoVolumes,

    // ===== Configuration Errors =====
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to save configuration: {0}")]
    ConfigSave(String),

    #[error("Invalid configuration value: {field} - {message}")]
    ConfigInvalid { field: String, message: String },

    // ===== Scanning Errors =====
    #[error("Failed to scan file: {path} - {reason}")]
    ScanError { path: PathBuf, reason: String },

    #[error("Malformed recycle-bin record: {path} - {reason}")]
    RecycleRecord { path: PathBuf, reason: String },

    // ===== Collaborator Errors =====
    #[error("Service query failed: {service}")]
    ServiceQuery { service: String, reason: String },

    #[error("Registry access error: {key}")]
    RegistryAccess { key: String, reason: String },

    #[error("File metadata query failed: {path}")]
    MetadataQuery { path: PathBuf, reason: String },

    // ===== Network Errors =====
    #[error("Network error: {0}")]
    Network(String),

    #[error("Reputation lookup timed out after {timeout_secs}s: {account}")]
    ReputationTimeout { account: String, timeout_secs: u64 },

    #[error("Chunk delivery rejected: {kind} chunk {index}/{total} - {reason}")]
    DeliveryRejected {
        kind: String,
        index: usize,
        total: usize,
        reason: String,
    },

    // ===== Serialization Errors =====
    #[error("JSON serialization error")]
    JsonSerialize(#[from] serde_json::Error),

    // ===== Concurrency Errors =====
    #[error("Worker task failed: {context}")]
    TaskJoin { context: String },

    // ===== Generic Errors =====
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl Error {
    /// Create a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a scan error.
    pub fn scan_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ScanError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable (the scan session can continue).
    ///
    /// Everything short of failing to enumerate a single volume degrades
    /// rather than aborting: subtrees are skipped, lookups are flagged,
    /// chunk kinds fail independently.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::NoVolumes)
    }

    /// Get the error category for logging/metrics.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::FileRead { .. }
            | Error::FileWrite { .. }
            | Error::DirectoryAccess { .. }
            | Error::PermissionDenied { .. }
            | Error::NoVolumes
            | Error::Io(_) => ErrorCategory::Io,

            Error::ConfigLoad(_) | Error::ConfigSave(_) | Error::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }

            Error::ScanError { .. } | Error::RecycleRecord { .. } => ErrorCategory::Scanning,

            Error::ServiceQuery { .. }
            | Error::RegistryAccess { .. }
            | Error::MetadataQuery { .. } => ErrorCategory::Collaborator,

            Error::Network(_)
            | Error::ReputationTimeout { .. }
            | Error::DeliveryRejected { .. } => ErrorCategory::Network,

            Error::JsonSerialize(_) => ErrorCategory::Serialization,

            Error::TaskJoin { .. } => ErrorCategory::Concurrency,

            Error::Internal(_) | Error::Other(_) => ErrorCategory::Other,
        }
    }
}

/// Error category for classification and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Scanning,
    Collaborator,
    Network,
    Serialization,
    Concurrency,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O"),
            Self::Configuration => write!(f, "Configuration"),
            Self::Scanning => write!(f, "Scanning"),
            Self::Collaborator => write!(f, "Collaborator"),
            Self::Network => write!(f, "Network"),
            Self::Serialization => write!(f, "Serialization"),
            Self::Concurrency => write!(f, "Concurrency"),
            Self::Other => write!(f, "Other"),
        }
    }
}
