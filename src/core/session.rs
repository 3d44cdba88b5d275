//! Per-scan session context.
//!
//! One `ScanSession` owns the configuration, the collaborator probes
//! and every accumulator for a single scan, passed explicitly through
//! each step. There is no cross-session state and no artificial pacing:
//! each step runs at the speed of its I/O. A session runs to completion
//! or fails a step wholesale; the only fatal condition is having no
//! volume to scan.

use crate::classify::{apply_metadata_filter, Classifier};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{Outcome, ScannedFile};
use crate::probes::{
    DriveProbe, FsProbe, LocalFs, MetadataProbe, RegistryProbe, ServiceProbe,
    ServiceControlProbe, SystemDrives, SystemRegistry, VersionInfoProbe,
};
use crate::report::bundle::{BundleParts, EvidenceBundle};
use crate::report::chunker::Chunker;
use crate::report::delivery::{deliver_bundle, DeliveryReport, HttpTransport, Transport};
use crate::report::text::{recycle_bin_report, suspicious_files_report};
use crate::reputation::{enrich_accounts, HttpReputationClient, ReputationService};
use crate::scanner::accounts::AccountStore;
use crate::scanner::recycle_bin::{derive_cleanup, RecycleBinScanner};
use crate::scanner::security::SecurityScanner;
use crate::scanner::walker::VolumeWalker;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything one completed session produced.
pub struct SessionOutcome {
    pub bundle: EvidenceBundle,
    /// Per-kind delivery results; `None` when delivery is disabled
    pub delivery: Option<DeliveryReport>,
    pub suspicious_report_path: PathBuf,
    pub recycle_report_path: PathBuf,
}

/// One scan session: configuration plus collaborators.
pub struct ScanSession {
    config: Config,
    drives: Arc<dyn DriveProbe>,
    fs: Arc<dyn FsProbe>,
    services: Arc<dyn ServiceProbe>,
    metadata: Arc<dyn MetadataProbe>,
    registry: Arc<dyn RegistryProbe>,
    reputation: Arc<dyn ReputationService>,
    transport: Option<Arc<dyn Transport>>,
}

impl ScanSession {
    /// Build a session against the real operating system.
    pub fn new(config: Config) -> Self {
        let transport: Option<Arc<dyn Transport>> = if config.delivery.disabled
            || config.delivery.endpoint.is_empty()
        {
            None
        } else {
            Some(Arc::new(HttpTransport::new(&config.delivery)))
        };

        let reputation: Arc<dyn ReputationService> =
            Arc::new(HttpReputationClient::new(&config.reputation));

        Self {
            config,
            drives: Arc::new(SystemDrives::new()),
            fs: Arc::new(LocalFs::new()),
            services: Arc::new(ServiceControlProbe::new()),
            metadata: Arc::new(VersionInfoProbe::new()),
            registry: Arc::new(SystemRegistry::new()),
            reputation,
            transport,
        }
    }

    /// Build a session with injected collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn with_probes(
        config: Config,
        drives: Arc<dyn DriveProbe>,
        fs: Arc<dyn FsProbe>,
        services: Arc<dyn ServiceProbe>,
        metadata: Arc<dyn MetadataProbe>,
        registry: Arc<dyn RegistryProbe>,
        reputation: Arc<dyn ReputationService>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        Self {
            config,
            drives,
            fs,
            services,
            metadata,
            registry,
            reputation,
            transport,
        }
    }

    /// Run the full scan.
    pub async fn run(&self) -> Result<SessionOutcome> {
        let session_id = uuid::Uuid::new_v4().to_string();
        log::info!("Scan session {} started", session_id);

        // Volumes first: no volume, no session.
        let volumes = if self.config.scan.volumes.is_empty() {
            self.drives.list_all_drives().await
        } else {
            self.config.scan.volumes.clone()
        };
        if volumes.is_empty() {
            return Err(Error::NoVolumes);
        }
        log::info!("Scanning {} volume(s)", volumes.len());

        // Security posture and registry activity.
        let security = SecurityScanner::new(Arc::clone(&self.services), Arc::clone(&self.registry));
        let security_posture = security.collect_posture().await;
        let registry_activity = security.collect_registry_activity().await;

        // Local accounts and their remote reputation.
        let store = AccountStore::new(Arc::clone(&self.fs), Arc::clone(&self.registry));
        let (accounts, account_discovery) = match store.discover().await {
            Outcome::Ok(local) => {
                let count = local.len();
                let enriched =
                    enrich_accounts(local, self.reputation.as_ref(), Utc::now()).await;
                (enriched, Outcome::Ok(count))
            }
            Outcome::Degraded { reason } => (Vec::new(), Outcome::Degraded { reason }),
            Outcome::Failed { kind } => (Vec::new(), Outcome::Failed { kind }),
        };

        // Walk every volume and classify the candidates.
        let scanned_files = self.walk_and_classify(&volumes).await?;

        // Metadata filtering pass over the suspicious set.
        let scanned_files = apply_metadata_filter(
            scanned_files,
            Arc::clone(&self.metadata),
            self.config.scan.metadata_batch_size,
        )
        .await;

        // Recycle bin.
        let recycle_scanner = RecycleBinScanner::new(Arc::clone(&self.fs));
        let recycle_entries = recycle_scanner.scan_all(&volumes).await;
        let recycle_cleanup = derive_cleanup(self.registry.as_ref(), &recycle_entries).await;

        // Finalize and score.
        let bundle = EvidenceBundle::finalize(BundleParts {
            session_id,
            computer_name: computer_name(),
            profile: self.config.scan.profile,
            scanned_files,
            recycle_entries,
            accounts,
            account_discovery,
            security_posture,
            registry_activity,
            recycle_cleanup,
        });
        log::info!(
            "Evidence finalized: {} suspicious files, {} recycle entries, {} accounts, score {}",
            bundle.scanned_files.len(),
            bundle.recycle_entries.len(),
            bundle.accounts.len(),
            bundle.risk_score
        );

        // Plain-text evidence reports.
        let suspicious_report_path = self.config.reports.suspicious_report_path();
        let recycle_report_path = self.config.reports.recycle_report_path();
        self.write_report(
            &suspicious_report_path,
            suspicious_files_report(&bundle.scanned_files, bundle.generated_at),
        )
        .await;
        self.write_report(
            &recycle_report_path,
            recycle_bin_report(&bundle.recycle_entries, bundle.generated_at),
        )
        .await;

        // Chunked delivery.
        let delivery = match &self.transport {
            Some(transport) => {
                let chunker = Chunker::new(self.config.delivery.payload_ceiling_bytes);
                Some(deliver_bundle(transport.as_ref(), &chunker, &bundle).await)
            }
            None => {
                log::info!("Delivery disabled; bundle kept local");
                None
            }
        };

        log::info!("Scan session {} completed", bundle.session_id);
        Ok(SessionOutcome {
            bundle,
            delivery,
            suspicious_report_path,
            recycle_report_path,
        })
    }

    /// Walk every volume, classify candidates, stat the flagged ones.
    async fn walk_and_classify(&self, volumes: &[PathBuf]) -> Result<Vec<ScannedFile>> {
        let walker = VolumeWalker::new(
            Arc::clone(&self.fs),
            self.config.scan.effective_batches(),
        );
        let classifier = Classifier::new(self.config.scan.profile);

        let mut candidates = Vec::new();
        let mut scanned_volumes = 0usize;
        for volume in volumes {
            match walker.scan_volume(volume).await {
                Ok(files) => {
                    scanned_volumes += 1;
                    candidates.extend(files);
                }
                Err(e) => log::warn!("Volume {:?} skipped: {}", volume, e),
            }
        }
        if scanned_volumes == 0 {
            return Err(Error::NoVolumes);
        }

        let mut flagged = Vec::new();
        for path in candidates {
            let path_str = path.to_string_lossy().into_owned();
            let reasons = classifier.classify(&path_str);
            if reasons.is_empty() {
                continue;
            }

            let mut file = ScannedFile::new(path.clone(), reasons);
            if let Some(stat) = self.fs.stat_file(&path).await {
                file = file.with_stat(stat.size, stat.times);
            }
            log::info!(
                "Suspicious file: {} ({} reason(s))",
                file.file_name,
                file.reasons.len()
            );
            flagged.push(file);
        }

        Ok(flagged)
    }

    async fn write_report(&self, path: &PathBuf, contents: String) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
        }
        match tokio::fs::write(path, contents).await {
            Ok(()) => log::info!("Report written to {:?}", path),
            Err(e) => log::error!("Failed to write report {:?}: {}", path, e),
        }
    }
}

/// Best-effort machine name for the evidence header.
fn computer_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "Unknown PC".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Profile;
    use crate::core::types::{
        FileMetadata, ReasonTag, ServiceStatus, TamperProtection,
    };
    use crate::report::chunker::DeliveryChunk;
    use crate::reputation::{BanStatus, ProfileSummary};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeDrives {
        roots: Vec<PathBuf>,
    }

    #[async_trait]
    impl DriveProbe for FakeDrives {
        async fn list_all_drives(&self) -> Vec<PathBuf> {
            self.roots.clone()
        }
    }

    struct FakeServices;

    #[async_trait]
    impl ServiceProbe for FakeServices {
        async fn query_service_status(&self, _name: &str) -> ServiceStatus {
            ServiceStatus::Running
        }
        async fn query_tamper_protection(&self) -> TamperProtection {
            TamperProtection::Enabled
        }
        async fn query_anticheat_installed(&self) -> bool {
            true
        }
    }

    struct BareMetadata;

    #[async_trait]
    impl MetadataProbe for BareMetadata {
        async fn query_file_metadata(&self, _path: &Path) -> Outcome<FileMetadata> {
            // No version resources anywhere: every flagged file stays.
            Outcome::Ok(FileMetadata::default())
        }
    }

    struct FakeRegistry {
        store_path: Option<PathBuf>,
    }

    #[async_trait]
    impl RegistryProbe for FakeRegistry {
        async fn read_value(&self, _key: &str, _value: &str) -> Outcome<String> {
            match &self.store_path {
                Some(p) => Outcome::Ok(p.to_string_lossy().into_owned()),
                None => Outcome::Degraded {
                    reason: "platform not installed".to_string(),
                },
            }
        }
        async fn dump_value_names(&self, _key: &str) -> Outcome<Vec<String>> {
            Outcome::Ok(vec![])
        }
        async fn recycle_cleanup_time(&self) -> Outcome<Option<DateTime<Utc>>> {
            Outcome::Ok(None)
        }
    }

    struct BannedReputation;

    #[async_trait]
    impl ReputationService for BannedReputation {
        async fn lookup_bans(&self, _id: &str) -> Result<BanStatus> {
            Ok(BanStatus {
                vac_banned: true,
                game_bans: 0,
                days_since_last_ban: Some(10),
            })
        }
        async fn lookup_profile(&self, _id: &str) -> Result<ProfileSummary> {
            Ok(ProfileSummary { created_at: None })
        }
    }

    struct RecordingTransport {
        sent: Mutex<Vec<DeliveryChunk>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn deliver(&self, body: Vec<u8>) -> Result<()> {
            let chunk: DeliveryChunk = serde_json::from_slice(&body).unwrap();
            self.sent.lock().unwrap().push(chunk);
            Ok(())
        }
    }

    fn session_config(root: &Path, output: &Path, profile: Profile) -> Config {
        let mut config = Config::default();
        config.scan.profile = profile;
        config.scan.volumes = vec![root.to_path_buf()];
        config.reports.output_dir = output.to_path_buf();
        config
    }

    fn build_session(
        config: Config,
        store_path: Option<PathBuf>,
        transport: Option<Arc<dyn Transport>>,
    ) -> ScanSession {
        ScanSession::with_probes(
            config,
            Arc::new(FakeDrives { roots: vec![] }),
            Arc::new(LocalFs::new()),
            Arc::new(FakeServices),
            Arc::new(BareMetadata),
            Arc::new(FakeRegistry { store_path }),
            Arc::new(BannedReputation),
            transport,
        )
    }

    /// A volume tree with one known-bad file, one keyword file, one
    /// clean file and a recycle bin record.
    fn build_volume(root: &Path) {
        std::fs::create_dir_all(root.join("games/tools")).unwrap();
        std::fs::write(root.join("games/loader.exe"), b"x").unwrap();
        std::fs::write(root.join("games/tools/supercheat.exe"), b"x").unwrap();
        std::fs::write(root.join("games/tools/notepad.exe"), b"x").unwrap();

        let bin = root.join("$Recycle.Bin/S-1-5-21-1");
        std::fs::create_dir_all(&bin).unwrap();
        let mut record = vec![0u8; 24];
        let name: Vec<u8> = "wiped.exe"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        record[20..24].copy_from_slice(&9u32.to_le_bytes());
        record.extend_from_slice(&name);
        std::fs::write(bin.join("$I000.exe"), record).unwrap();
    }

    #[tokio::test]
    async fn test_full_session() {
        let volume = tempdir().unwrap();
        let output = tempdir().unwrap();
        build_volume(volume.path());

        // Credential store on disk.
        let store_root = tempdir().unwrap();
        std::fs::create_dir_all(store_root.path().join("config")).unwrap();
        std::fs::write(
            store_root.path().join("config/loginusers.vdf"),
            r#""76561198000000001" { "AccountName" "x" "PersonaName" "X" "MostRecent" "1" }"#,
        )
        .unwrap();

        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let session = build_session(
            session_config(volume.path(), output.path(), Profile::Strict),
            Some(store_root.path().to_path_buf()),
            Some(transport.clone() as Arc<dyn Transport>),
        );

        let outcome = session.run().await.unwrap();
        let bundle = &outcome.bundle;

        // loader.exe and supercheat.exe flagged; notepad.exe clean.
        assert_eq!(bundle.scanned_files.len(), 2);
        let names: Vec<&str> = bundle
            .scanned_files
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert!(names.contains(&"loader.exe"));
        assert!(names.contains(&"supercheat.exe"));
        assert!(bundle
            .scanned_files
            .iter()
            .all(|f| f.reasons.contains(&ReasonTag::MissingMetadata)));

        // Recycle bin parsed.
        assert_eq!(bundle.recycle_entries.len(), 1);
        assert_eq!(bundle.recycle_entries[0].original_name, "wiped.exe");

        // Banned account enriched from reputation.
        assert_eq!(bundle.accounts.len(), 1);
        assert!(bundle.accounts[0].banned);

        // 2 files * 10 + 1 ban * 15.
        assert_eq!(bundle.risk_score, 35);

        // Reports on disk with the documented headers.
        let suspicious = std::fs::read_to_string(&outcome.suspicious_report_path).unwrap();
        assert!(suspicious.starts_with("SUSPICIOUS FILES REPORT"));
        assert!(suspicious.contains("Total suspicious files found: 2"));
        let recycle = std::fs::read_to_string(&outcome.recycle_report_path).unwrap();
        assert!(recycle.contains("wiped.exe"));

        // All five kinds delivered.
        let delivery = outcome.delivery.unwrap();
        assert!(delivery.all_succeeded());
        assert_eq!(transport.sent.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_no_volumes_is_fatal() {
        let output = tempdir().unwrap();
        let mut config = Config::default();
        config.reports.output_dir = output.path().to_path_buf();
        // No config volumes and the drive probe finds nothing.
        let session = build_session(config, None, None);

        match session.run().await {
            Err(Error::NoVolumes) => {}
            other => panic!("expected NoVolumes, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_missing_store_degrades_accounts() {
        let volume = tempdir().unwrap();
        let output = tempdir().unwrap();
        build_volume(volume.path());

        let session = build_session(
            session_config(volume.path(), output.path(), Profile::Strict),
            None,
            None,
        );

        let outcome = session.run().await.unwrap();
        assert!(outcome.bundle.accounts.is_empty());
        // Degraded discovery, distinguishable from "no accounts found".
        assert!(!outcome.bundle.account_discovery.is_ok());
        assert!(outcome.delivery.is_none());
    }
}
