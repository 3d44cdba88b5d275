//! The evidence bundle: everything one scan session produced, plus the
//! derived score and summary views.

use crate::classify::match_signatures;
use crate::core::config::Profile;
use crate::core::types::{AccountRecord, Outcome, RecycleBinEntry, ScannedFile, SignatureMatch};
use crate::report::scoring::{compute_score, RiskLevel};
use crate::scanner::recycle_bin::RecycleCleanup;
use crate::scanner::security::{RegistryActivity, SecurityPosture};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Compact (name, timestamp) projection used by the summary views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDigest {
    pub file_name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Independent sorted projections over the suspicious set. They
/// overlap by design; none partitions the set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryViews {
    /// Top 5 most recently created files carrying high-priority tags
    pub most_suspicious: Vec<FileDigest>,
    /// Top 5 most recently created DLLs
    pub recent_dlls: Vec<FileDigest>,
    /// Last 5 modified suspicious files
    pub last_modified: Vec<FileDigest>,
    /// Last 5 created suspicious files
    pub last_created: Vec<FileDigest>,
}

const VIEW_LIMIT: usize = 5;

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().expect("epoch")
}

fn top_by_created<'a, I>(files: I) -> Vec<FileDigest>
where
    I: Iterator<Item = &'a ScannedFile>,
{
    let mut selected: Vec<&ScannedFile> = files.collect();
    selected.sort_by_key(|f| std::cmp::Reverse(f.times.created.unwrap_or_else(epoch)));
    selected
        .into_iter()
        .take(VIEW_LIMIT)
        .map(|f| FileDigest {
            file_name: f.file_name.clone(),
            timestamp: f.times.created,
        })
        .collect()
}

impl SummaryViews {
    /// Derive every view from the suspicious set.
    pub fn derive(files: &[ScannedFile]) -> Self {
        let most_suspicious =
            top_by_created(files.iter().filter(|f| {
                f.reasons.iter().any(|r| r.is_high_priority())
            }));

        let recent_dlls = top_by_created(files.iter().filter(|f| f.is_dll()));

        let mut by_modified: Vec<&ScannedFile> =
            files.iter().filter(|f| f.times.modified.is_some()).collect();
        by_modified.sort_by_key(|f| std::cmp::Reverse(f.times.modified));
        let last_modified = by_modified
            .into_iter()
            .take(VIEW_LIMIT)
            .map(|f| FileDigest {
                file_name: f.file_name.clone(),
                timestamp: f.times.modified,
            })
            .collect();

        let mut by_created: Vec<&ScannedFile> =
            files.iter().filter(|f| f.times.created.is_some()).collect();
        by_created.sort_by_key(|f| std::cmp::Reverse(f.times.created));
        let last_created = by_created
            .into_iter()
            .take(VIEW_LIMIT)
            .map(|f| FileDigest {
                file_name: f.file_name.clone(),
                timestamp: f.times.created,
            })
            .collect();

        Self {
            most_suspicious,
            recent_dlls,
            last_modified,
            last_created,
        }
    }
}

/// Top-level aggregate of one scan session. Immutable once finalized;
/// the risk score is a pure function of the other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub session_id: String,
    pub computer_name: String,
    pub generated_at: DateTime<Utc>,
    pub profile: Profile,
    pub scanned_files: Vec<ScannedFile>,
    pub recycle_entries: Vec<RecycleBinEntry>,
    pub accounts: Vec<AccountRecord>,
    /// Whether credential-store discovery itself worked; an empty
    /// account list with a failed discovery is not a clean result
    pub account_discovery: Outcome<usize>,
    pub security_posture: SecurityPosture,
    pub registry_activity: RegistryActivity,
    pub recycle_cleanup: RecycleCleanup,
    pub detected_signatures: Vec<SignatureMatch>,
    pub views: SummaryViews,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
}

/// Everything a session hands over for finalization.
pub struct BundleParts {
    pub session_id: String,
    pub computer_name: String,
    pub profile: Profile,
    pub scanned_files: Vec<ScannedFile>,
    pub recycle_entries: Vec<RecycleBinEntry>,
    pub accounts: Vec<AccountRecord>,
    pub account_discovery: Outcome<usize>,
    pub security_posture: SecurityPosture,
    pub registry_activity: RegistryActivity,
    pub recycle_cleanup: RecycleCleanup,
}

impl EvidenceBundle {
    /// Finalize a bundle: match signatures, derive views, score.
    pub fn finalize(parts: BundleParts) -> Self {
        let detected_signatures = match_signatures(&parts.scanned_files);
        let views = SummaryViews::derive(&parts.scanned_files);

        let banned = parts.accounts.iter().filter(|a| a.banned).count();
        let risk_score = compute_score(
            parts.scanned_files.len(),
            banned,
            !detected_signatures.is_empty(),
        );

        Self {
            session_id: parts.session_id,
            computer_name: parts.computer_name,
            generated_at: Utc::now(),
            profile: parts.profile,
            scanned_files: parts.scanned_files,
            recycle_entries: parts.recycle_entries,
            accounts: parts.accounts,
            account_discovery: parts.account_discovery,
            security_posture: parts.security_posture,
            registry_activity: parts.registry_activity,
            recycle_cleanup: parts.recycle_cleanup,
            detected_signatures,
            views,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
        }
    }

    /// Number of accounts with any ban on record.
    pub fn banned_account_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.banned).count()
    }

    /// Recompute the score from current fields; always equals
    /// `risk_score` on a finalized bundle.
    pub fn recompute_score(&self) -> u8 {
        compute_score(
            self.scanned_files.len(),
            self.banned_account_count(),
            !self.detected_signatures.is_empty(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FileTimes, ReasonTag, TamperProtection};
    use chrono::Duration;
    use std::path::PathBuf;

    fn parts() -> BundleParts {
        BundleParts {
            session_id: "test-session".to_string(),
            computer_name: "TEST-PC".to_string(),
            profile: Profile::Strict,
            scanned_files: Vec::new(),
            recycle_entries: Vec::new(),
            accounts: Vec::new(),
            account_discovery: Outcome::Ok(0),
            security_posture: SecurityPosture {
                services: vec![],
                tamper_protection: TamperProtection::Unknown,
                anticheat_installed: false,
            },
            registry_activity: RegistryActivity {
                compatibility_assistant: Outcome::Ok(vec![]),
                app_switched: Outcome::Ok(vec![]),
                mui_cache: Outcome::Ok(vec![]),
            },
            recycle_cleanup: RecycleCleanup::Unknown,
        }
    }

    fn file_with_created(name: &str, reasons: Vec<ReasonTag>, days_ago: i64) -> ScannedFile {
        let mut f = ScannedFile::new(PathBuf::from(name), reasons);
        f.file_name = name.to_string();
        f.times = FileTimes {
            created: Some(Utc::now() - Duration::days(days_ago)),
            modified: Some(Utc::now() - Duration::days(days_ago)),
            accessed: None,
        };
        f
    }

    #[test]
    fn test_clean_bundle_scores_zero() {
        let bundle = EvidenceBundle::finalize(parts());
        assert_eq!(bundle.risk_score, 0);
        assert_eq!(bundle.risk_level, RiskLevel::Low);
        assert!(bundle.detected_signatures.is_empty());
    }

    #[test]
    fn test_signature_override() {
        let mut p = parts();
        let mut f = file_with_created("mystery.exe", vec![ReasonTag::RandomName], 1);
        f.size_bytes = Some(45_639_968);
        p.scanned_files = vec![f];

        let bundle = EvidenceBundle::finalize(p);
        assert_eq!(bundle.risk_score, 99);
        assert_eq!(bundle.detected_signatures.len(), 1);
        assert_eq!(bundle.detected_signatures[0].signature_name, "Revolex NRS");
    }

    #[test]
    fn test_additive_score_and_recompute() {
        let mut p = parts();
        p.scanned_files = vec![
            file_with_created("a.exe", vec![ReasonTag::RandomName], 1),
            file_with_created("b.exe", vec![ReasonTag::RandomName], 2),
        ];
        let mut banned = AccountRecord::local_only("76561198000000001", "x", "X", true);
        banned.banned = true;
        p.accounts = vec![banned];

        let bundle = EvidenceBundle::finalize(p);
        assert_eq!(bundle.risk_score, 35);
        assert_eq!(bundle.recompute_score(), bundle.risk_score);
    }

    #[test]
    fn test_views_are_independent_projections() {
        let mut p = parts();
        p.scanned_files = vec![
            file_with_created("high.exe", vec![ReasonTag::KnownBadName], 1),
            file_with_created("hook.dll", vec![ReasonTag::SuspiciousDll], 2),
            file_with_created("random.exe", vec![ReasonTag::RandomName], 3),
        ];

        let bundle = EvidenceBundle::finalize(p);
        // Only the high-priority tag reaches most_suspicious.
        assert_eq!(bundle.views.most_suspicious.len(), 1);
        assert_eq!(bundle.views.most_suspicious[0].file_name, "high.exe");
        // Only the DLL reaches recent_dlls.
        assert_eq!(bundle.views.recent_dlls.len(), 1);
        // Every file with timestamps reaches the recency views.
        assert_eq!(bundle.views.last_modified.len(), 3);
        assert_eq!(bundle.views.last_created.len(), 3);
        // Newest first.
        assert_eq!(bundle.views.last_created[0].file_name, "high.exe");
    }

    #[test]
    fn test_views_cap_at_five() {
        let mut p = parts();
        p.scanned_files = (0..9)
            .map(|i| file_with_created(&format!("f{}.exe", i), vec![ReasonTag::KnownBadName], i))
            .collect();

        let bundle = EvidenceBundle::finalize(p);
        assert_eq!(bundle.views.most_suspicious.len(), 5);
        assert_eq!(bundle.views.last_created.len(), 5);
        assert_eq!(bundle.views.most_suspicious[0].file_name, "f0.exe");
    }
}
