//! Filesystem collaborator: directory listing, stat and raw reads.

use crate::core::error::{Error, Result};
use crate::core::types::FileTimes;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Stat result for a single file.
#[derive(Debug, Clone, Copy)]
pub struct StatInfo {
    pub size: u64,
    pub times: FileTimes,
}

/// Filesystem access used by the walker, classifier and recycle-bin
/// scanner.
#[async_trait]
pub trait FsProbe: Send + Sync {
    /// List a directory's immediate entries. Inaccessible directories
    /// return an error; callers skip and continue.
    async fn enumerate_directory(&self, path: &Path) -> Result<Vec<DirEntryInfo>>;

    /// Stat a file. `None` when the file cannot be statted; a missing
    /// stat never drops the file from the evidence.
    async fn stat_file(&self, path: &Path) -> Option<StatInfo>;

    /// Read a file's raw bytes.
    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Real filesystem implementation on tokio's async fs.
#[derive(Debug, Default, Clone)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

fn system_time_to_utc(t: std::io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    t.ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl FsProbe for LocalFs {
    async fn enumerate_directory(&self, path: &Path) -> Result<Vec<DirEntryInfo>> {
        let mut read_dir =
            tokio::fs::read_dir(path)
                .await
                .map_err(|e| Error::DirectoryAccess {
                    path: path.to_path_buf(),
                    source: e,
                })?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            Error::DirectoryAccess {
                path: path.to_path_buf(),
                source: e,
            }
        })? {
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(e) => {
                    log::trace!("Cannot stat entry {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }

        Ok(entries)
    }

    async fn stat_file(&self, path: &Path) -> Option<StatInfo> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                log::trace!("Cannot stat {:?}: {}", path, e);
                return None;
            }
        };

        Some(StatInfo {
            size: metadata.len(),
            times: FileTimes {
                created: system_time_to_utc(metadata.created()),
                modified: system_time_to_utc(metadata.modified()),
                accessed: system_time_to_utc(metadata.accessed()),
            },
        })
    }

    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::file_read(path, e))
    }
}
