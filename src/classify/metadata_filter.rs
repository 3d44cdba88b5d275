//! Metadata-presence filtering pass.
//!
//! Runs after the path/name rules, in fixed-size concurrent batches: a
//! flagged file carrying any descriptive version metadata is dropped
//! from the suspicious set; one carrying none gains the
//! `MissingMetadata` tag. A failed probe keeps the file untagged.
//!
//! This is a knowingly weak heuristic inherited from the system this
//! replaces: version resources are trivially forged and legitimate
//! unsigned tools often lack them. It is preserved, not strengthened.

use crate::core::types::{Outcome, ReasonTag, ScannedFile};
use crate::probes::MetadataProbe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Apply the metadata filter over the suspicious set.
///
/// Files are probed `batch_size` at a time; batches are sequential,
/// probes within a batch concurrent. Order of survivors follows the
/// input order.
pub async fn apply_metadata_filter(
    files: Vec<ScannedFile>,
    probe: Arc<dyn MetadataProbe>,
    batch_size: usize,
) -> Vec<ScannedFile> {
    let total = files.len();
    let batch_size = batch_size.max(1);
    let mut filtered: Vec<ScannedFile> = Vec::with_capacity(total);

    for batch in files.chunks(batch_size) {
        let mut set: JoinSet<(usize, Outcome<crate::core::types::FileMetadata>)> = JoinSet::new();

        for (idx, file) in batch.iter().enumerate() {
            let probe = Arc::clone(&probe);
            let path = file.path.clone();
            set.spawn(async move { (idx, probe.query_file_metadata(&path).await) });
        }

        let mut outcomes: Vec<Option<Outcome<crate::core::types::FileMetadata>>> =
            (0..batch.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
                Err(e) => log::warn!("Metadata probe task failed: {}", e),
            }
        }

        for (file, outcome) in batch.iter().zip(outcomes) {
            let mut file = file.clone();
            match outcome {
                Some(Outcome::Ok(meta)) if meta.has_any() => {
                    // Descriptive metadata present: treated as legitimate
                    // and removed from the suspicious set.
                    log::debug!("Dropping {} (has version metadata)", file.file_name);
                    continue;
                }
                Some(Outcome::Ok(_)) => {
                    file.reasons.push(ReasonTag::MissingMetadata);
                    filtered.push(file);
                }
                Some(Outcome::Degraded { reason }) => {
                    log::debug!(
                        "Metadata check degraded for {}: {}",
                        file.file_name,
                        reason
                    );
                    filtered.push(file);
                }
                Some(Outcome::Failed { kind }) => {
                    log::debug!("Metadata check failed for {}: {}", file.file_name, kind);
                    filtered.push(file);
                }
                None => filtered.push(file),
            }
        }
    }

    log::info!(
        "Metadata filtering: {} of {} suspicious files retained",
        filtered.len(),
        total
    );
    filtered
}
