//! Recycle-bin forensics: index-record parsing and per-volume scanning.
//!
//! Every deletion leaves a pair of records in the bin: an index record
//! (`$I…`) holding metadata and original name, and a content record
//! (`$R…`) holding the moved payload. The index record carries a
//! little-endian u32 name length at byte 20 and the UTF-16LE original
//! name from byte 24. Malformed records degrade to the record's own
//! filesystem name; a missing content record falls back to the index
//! record's size. Nothing is dropped silently.

use crate::core::types::{Outcome, RecycleBinEntry};
use crate::probes::{FsProbe, RegistryProbe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bin directory name at each volume root.
pub const BIN_ROOT: &str = "$Recycle.Bin";

/// Byte offset of the u32 name-length field in an index record.
const NAME_LENGTH_OFFSET: usize = 20;

/// Byte offset where the UTF-16LE original name starts.
const NAME_OFFSET: usize = 24;

/// Generous upper bound on the name length field, in UTF-16 code
/// units. Anything at or above this is a corrupt or foreign record.
const MAX_NAME_UNITS: u32 = 1000;

/// Decode the original file name from an index record's raw bytes.
///
/// Returns `None` when the record is malformed (invalid length field,
/// truncated buffer, empty name); the caller falls back to the
/// record's filesystem name rather than failing the entry.
pub fn parse_index_record_name(bytes: &[u8]) -> Option<String> {
    if bytes.len() < NAME_OFFSET {
        return None;
    }

    let len_field: [u8; 4] = bytes[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4]
        .try_into()
        .ok()?;
    let units = u32::from_le_bytes(len_field);
    if units == 0 || units >= MAX_NAME_UNITS {
        return None;
    }

    let wanted = NAME_OFFSET + (units as usize) * 2;
    let end = wanted.min(bytes.len());
    let name_bytes = &bytes[NAME_OFFSET..end];

    let code_units: Vec<u16> = name_bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if code_units.is_empty() {
        return None;
    }

    let decoded: String = String::from_utf16_lossy(&code_units)
        .chars()
        .filter(|c| *c != '\0')
        .collect();

    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Volume label for an entry's source drive ("C:" from "C:\").
fn drive_label(root: &Path) -> String {
    let s = root.to_string_lossy();
    let trimmed = s.trim_end_matches(['\\', '/']);
    if trimmed.is_empty() {
        s.into_owned()
    } else {
        trimmed.to_string()
    }
}

/// When and how the bin's last cleanup time was established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum RecycleCleanup {
    /// The OS recorded the last-empty time
    Registry { time: DateTime<Utc> },
    /// Inferred from the newest deletion still in the bin
    LatestDeletion { time: DateTime<Utc> },
    /// Bin is empty and no record of a cleanup exists
    Unknown,
}

/// Scans every volume's recycle bin.
pub struct RecycleBinScanner {
    fs: Arc<dyn FsProbe>,
}

impl RecycleBinScanner {
    pub fn new(fs: Arc<dyn FsProbe>) -> Self {
        Self { fs }
    }

    /// Scan the bins of every given volume. Missing bins and unreadable
    /// subdirectories are skipped; each readable index record yields an
    /// entry even when its content record is gone.
    pub async fn scan_all(&self, roots: &[PathBuf]) -> Vec<RecycleBinEntry> {
        let mut entries = Vec::new();

        for root in roots {
            let bin_root = root.join(BIN_ROOT);
            let user_dirs = match self.fs.enumerate_directory(&bin_root).await {
                Ok(dirs) => dirs,
                Err(e) => {
                    log::debug!("No recycle bin at {:?}: {}", bin_root, e);
                    continue;
                }
            };

            let drive = drive_label(root);

            for user_dir in user_dirs.iter().filter(|d| d.is_dir) {
                let items = match self.fs.enumerate_directory(&user_dir.path).await {
                    Ok(items) => items,
                    Err(e) => {
                        log::debug!("Cannot read bin directory {:?}: {}", user_dir.path, e);
                        continue;
                    }
                };

                for item in items.iter().filter(|i| !i.is_dir) {
                    if !item.name.starts_with("$I") {
                        continue;
                    }
                    if let Some(entry) = self.parse_entry(item, &user_dir.path, &drive).await {
                        entries.push(entry);
                    }
                }
            }
        }

        log::info!("Recycle bin scan: {} entries", entries.len());
        entries
    }

    /// Build one entry from an index record.
    async fn parse_entry(
        &self,
        item: &crate::probes::DirEntryInfo,
        user_dir: &Path,
        drive: &str,
    ) -> Option<RecycleBinEntry> {
        let index_stat = self.fs.stat_file(&item.path).await?;

        // Best effort on the original name; the record's own name is
        // the documented fallback for malformed records.
        let original_name = match self.fs.read_file_bytes(&item.path).await {
            Ok(bytes) => {
                parse_index_record_name(&bytes).unwrap_or_else(|| item.name.clone())
            }
            Err(e) => {
                log::debug!("Cannot read index record {:?}: {}", item.path, e);
                item.name.clone()
            }
        };

        // Content record size wins when the record is still on disk.
        let content_name = item.name.replacen("$I", "$R", 1);
        let content_path = user_dir.join(&content_name);
        let size_bytes = match self.fs.stat_file(&content_path).await {
            Some(stat) => stat.size,
            None => index_stat.size,
        };

        Some(RecycleBinEntry {
            original_name,
            size_bytes,
            deleted_at: index_stat.times.modified,
            source_drive: drive.to_string(),
            record_path: item.path.clone(),
        })
    }
}

/// Establish when the bin was last emptied: the OS record when
/// available, else the newest deletion still present, else unknown.
pub async fn derive_cleanup(
    registry: &dyn RegistryProbe,
    entries: &[RecycleBinEntry],
) -> RecycleCleanup {
    match registry.recycle_cleanup_time().await {
        Outcome::Ok(Some(time)) => return RecycleCleanup::Registry { time },
        Outcome::Ok(None) => {}
        Outcome::Degraded { reason } => {
            log::debug!("Recycle cleanup time degraded: {}", reason);
        }
        Outcome::Failed { kind } => {
            log::warn!("Recycle cleanup time query failed: {}", kind);
        }
    }

    entries
        .iter()
        .filter_map(|e| e.deleted_at)
        .max()
        .map(|time| RecycleCleanup::LatestDeletion { time })
        .unwrap_or(RecycleCleanup::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::LocalFs;
    use chrono::TimeZone;
    use tempfile::tempdir;

    /// Build a well-formed index record for a name.
    fn make_index_record(name: &str) -> Vec<u8> {
        let mut bytes = vec![0u8; NAME_OFFSET];
        let units = name.encode_utf16().count() as u32;
        bytes[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4].copy_from_slice(&units.to_le_bytes());
        for unit in name.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_parse_well_formed_record() {
        let record = make_index_record("document.pdf");
        assert_eq!(
            parse_index_record_name(&record),
            Some("document.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_record_with_trailing_nul() {
        let mut record = make_index_record("a.txt");
        // Length field claims one extra unit covering a NUL terminator.
        let units = 6u32;
        record[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4].copy_from_slice(&units.to_le_bytes());
        record.extend_from_slice(&[0, 0]);
        assert_eq!(parse_index_record_name(&record), Some("a.txt".to_string()));
    }

    #[test]
    fn test_zero_length_falls_back() {
        let mut record = make_index_record("ignored.txt");
        record[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(parse_index_record_name(&record), None);
    }

    #[test]
    fn test_oversized_length_falls_back() {
        let mut record = make_index_record("ignored.txt");
        record[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4]
            .copy_from_slice(&1000u32.to_le_bytes());
        assert_eq!(parse_index_record_name(&record), None);

        record[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4]
            .copy_from_slice(&50_000u32.to_le_bytes());
        assert_eq!(parse_index_record_name(&record), None);
    }

    #[test]
    fn test_truncated_record_falls_back() {
        assert_eq!(parse_index_record_name(&[0u8; 10]), None);
        assert_eq!(parse_index_record_name(&[]), None);
    }

    #[test]
    fn test_truncated_name_decodes_available_portion() {
        let mut record = make_index_record("abc");
        // Claim more units than the buffer holds.
        record[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 4].copy_from_slice(&10u32.to_le_bytes());
        assert_eq!(parse_index_record_name(&record), Some("abc".to_string()));
    }

    #[test]
    fn test_drive_label() {
        assert_eq!(drive_label(Path::new("C:\\")), "C:");
        assert_eq!(drive_label(Path::new("/")), "/");
    }

    #[tokio::test]
    async fn test_scan_with_content_record() {
        let dir = tempdir().unwrap();
        let user_dir = dir.path().join(BIN_ROOT).join("S-1-5-21-1234");
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(user_dir.join("$IABCDEF.txt"), make_index_record("notes.txt")).unwrap();
        std::fs::write(user_dir.join("$RABCDEF.txt"), vec![0u8; 4096]).unwrap();

        let scanner = RecycleBinScanner::new(Arc::new(LocalFs::new()));
        let entries = scanner.scan_all(&[dir.path().to_path_buf()]).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "notes.txt");
        // Content record's size overrides the index record's.
        assert_eq!(entries[0].size_bytes, 4096);
        assert!(entries[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_scan_without_content_record() {
        let dir = tempdir().unwrap();
        let user_dir = dir.path().join(BIN_ROOT).join("S-1-5-21-9999");
        std::fs::create_dir_all(&user_dir).unwrap();

        let record = make_index_record("gone.exe");
        let record_len = record.len() as u64;
        std::fs::write(user_dir.join("$IXYZ.exe"), record).unwrap();

        let scanner = RecycleBinScanner::new(Arc::new(LocalFs::new()));
        let entries = scanner.scan_all(&[dir.path().to_path_buf()]).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "gone.exe");
        assert_eq!(entries[0].size_bytes, record_len);
    }

    #[tokio::test]
    async fn test_malformed_record_keeps_entry() {
        let dir = tempdir().unwrap();
        let user_dir = dir.path().join(BIN_ROOT).join("S-1-5-21-0000");
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(user_dir.join("$Ibroken.dat"), b"short").unwrap();

        let scanner = RecycleBinScanner::new(Arc::new(LocalFs::new()));
        let entries = scanner.scan_all(&[dir.path().to_path_buf()]).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "$Ibroken.dat");
    }

    #[tokio::test]
    async fn test_volume_without_bin_skipped() {
        let dir = tempdir().unwrap();
        let scanner = RecycleBinScanner::new(Arc::new(LocalFs::new()));
        let entries = scanner.scan_all(&[dir.path().to_path_buf()]).await;
        assert!(entries.is_empty());
    }

    struct FakeRegistry {
        cleanup: Outcome<Option<DateTime<Utc>>>,
    }

    #[async_trait::async_trait]
    impl RegistryProbe for FakeRegistry {
        async fn read_value(&self, _key: &str, _value: &str) -> Outcome<String> {
            Outcome::Failed {
                kind: "unused".into(),
            }
        }

        async fn dump_value_names(&self, _key: &str) -> Outcome<Vec<String>> {
            Outcome::Failed {
                kind: "unused".into(),
            }
        }

        async fn recycle_cleanup_time(&self) -> Outcome<Option<DateTime<Utc>>> {
            self.cleanup.clone()
        }
    }

    #[tokio::test]
    async fn test_cleanup_from_registry() {
        let t = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let registry = FakeRegistry {
            cleanup: Outcome::Ok(Some(t)),
        };
        let cleanup = derive_cleanup(&registry, &[]).await;
        assert_eq!(cleanup, RecycleCleanup::Registry { time: t });
    }

    #[tokio::test]
    async fn test_cleanup_falls_back_to_latest_deletion() {
        let t1 = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let entries = vec![
            RecycleBinEntry {
                original_name: "a".into(),
                size_bytes: 1,
                deleted_at: Some(t1),
                source_drive: "C:".into(),
                record_path: PathBuf::from("$I1"),
            },
            RecycleBinEntry {
                original_name: "b".into(),
                size_bytes: 2,
                deleted_at: Some(t2),
                source_drive: "C:".into(),
                record_path: PathBuf::from("$I2"),
            },
        ];
        let registry = FakeRegistry {
            cleanup: Outcome::Degraded {
                reason: "no registry".into(),
            },
        };
        let cleanup = derive_cleanup(&registry, &entries).await;
        assert_eq!(cleanup, RecycleCleanup::LatestDeletion { time: t2 });
    }

    #[tokio::test]
    async fn test_cleanup_unknown_when_empty() {
        let registry = FakeRegistry {
            cleanup: Outcome::Ok(None),
        };
        let cleanup = derive_cleanup(&registry, &[]).await;
        assert_eq!(cleanup, RecycleCleanup::Unknown);
    }
}
