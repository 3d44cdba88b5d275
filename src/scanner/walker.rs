//! Volume walker: two-phase directory enumeration with batched scanning.
//!
//! Phase one lists the volume root's own files. Phase two builds the
//! full directory list depth-first, pruning skip-listed system
//! directories so their subtrees are never descended into. The
//! directory list is then cut into at most four contiguous batches
//! scanned concurrently, each into its own accumulator, joined at a
//! barrier and concatenated in batch order.

use crate::classify::extensions::TARGET_EXTENSION;
use crate::core::error::{Error, Result};
use crate::probes::FsProbe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Directory names pruned at every level of the walk. Large system
/// trees that will not contain what this scan is after.
pub const SKIP_DIRECTORIES: &[&str] = &[
    "windows",
    "program files",
    "program files (x86)",
    "programdata",
    "system volume information",
    "$recycle.bin",
    "winsxs",
];

/// Whether a directory name is on the skip list.
pub fn is_skipped_dir(name: &str) -> bool {
    let lower = name.to_lowercase();
    SKIP_DIRECTORIES.iter().any(|s| *s == lower)
}

fn has_target_extension(name: &str) -> bool {
    name.rsplit('.')
        .next()
        .map(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
        .unwrap_or(false)
        && name.contains('.')
}

/// Volume walker over the filesystem collaborator.
pub struct VolumeWalker {
    fs: Arc<dyn FsProbe>,
    max_batches: usize,
}

impl VolumeWalker {
    pub fn new(fs: Arc<dyn FsProbe>, max_batches: usize) -> Self {
        Self {
            fs,
            max_batches: max_batches.max(1),
        }
    }

    /// Scan one volume for target-extension files.
    ///
    /// An inaccessible volume root is an error; inaccessible
    /// subdirectories are logged and skipped.
    pub async fn scan_volume(&self, root: &Path) -> Result<Vec<PathBuf>> {
        log::info!("Scanning volume {:?}", root);

        // Phase 1: files sitting directly in the volume root.
        let mut files = Vec::new();
        let root_entries = self.fs.enumerate_directory(root).await?;
        for entry in &root_entries {
            if !entry.is_dir && has_target_extension(&entry.name) {
                files.push(entry.path.clone());
            }
        }

        // Phase 2: full directory list, skip-list pruned.
        let directories = Self::collect_directories(root.to_path_buf()).await?;
        log::debug!("Volume {:?}: {} directories to scan", root, directories.len());

        // Phase 3: contiguous batches scanned concurrently.
        let batch_count = self.max_batches.min(directories.len()).max(1);
        let batch_size = directories.len().div_ceil(batch_count);

        let mut handles = Vec::new();
        for batch in directories.chunks(batch_size.max(1)) {
            let fs = Arc::clone(&self.fs);
            let batch = batch.to_vec();
            handles.push(tokio::spawn(async move {
                Self::scan_directory_batch(fs, batch).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(batch_files) => files.extend(batch_files),
                Err(e) => {
                    return Err(Error::TaskJoin {
                        context: format!("directory batch worker: {}", e),
                    })
                }
            }
        }

        log::info!("Volume {:?}: {} candidate files", root, files.len());
        Ok(files)
    }

    /// Build the directory list for a volume, depth-first, pruning
    /// skip-listed names so their subtrees are never entered.
    async fn collect_directories(root: PathBuf) -> Result<Vec<PathBuf>> {
        tokio::task::spawn_blocking(move || {
            let mut directories = Vec::new();
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| {
                    !(e.file_type().is_dir()
                        && is_skipped_dir(&e.file_name().to_string_lossy()))
                });

            for entry in walker {
                match entry {
                    Ok(e) if e.file_type().is_dir() => directories.push(e.into_path()),
                    Ok(_) => {}
                    Err(e) => {
                        log::debug!("Cannot access directory entry: {}", e);
                    }
                }
            }
            directories
        })
        .await
        .map_err(|e| Error::TaskJoin {
            context: format!("directory enumeration: {}", e),
        })
    }

    /// Scan one batch of directories for target-extension files. Each
    /// batch owns its accumulator; inaccessible directories are skipped.
    async fn scan_directory_batch(fs: Arc<dyn FsProbe>, dirs: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in dirs {
            match fs.enumerate_directory(&dir).await {
                Ok(entries) => {
                    for entry in entries {
                        if !entry.is_dir && has_target_extension(&entry.name) {
                            found.push(entry.path);
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Cannot access directory {:?}: {}", dir, e);
                }
            }
        }
        found
    }
}
