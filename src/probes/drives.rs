//! Volume enumeration collaborator.

use async_trait::async_trait;
use std::path::PathBuf;

/// Lists the volume roots a full scan should cover.
#[async_trait]
pub trait DriveProbe: Send + Sync {
    /// Enumerate accessible volume roots. An empty result means no
    /// volume could be reached, which is the one fatal condition for a
    /// scan session.
    async fn list_all_drives(&self) -> Vec<PathBuf>;
}

/// Real drive enumeration: probe every letter A: through Z: for an
/// accessible root. On non-Windows hosts the filesystem root stands in
/// so integration tests have something to walk.
#[derive(Debug, Default, Clone)]
pub struct SystemDrives;

impl SystemDrives {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DriveProbe for SystemDrives {
    #[cfg(windows)]
    async fn list_all_drives(&self) -> Vec<PathBuf> {
        let mut drives = Vec::new();
        for letter in 'A'..='Z' {
            let root = PathBuf::from(format!("{}:\\", letter));
            if tokio::fs::metadata(&root).await.is_ok() {
                drives.push(root);
            }
        }
        drives
    }

    #[cfg(not(windows))]
    async fn list_all_drives(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("/")]
    }
}
