//! Chunk delivery to the external reporting channel.
//!
//! Each evidence kind is planned into chunks and sent in index order.
//! A rejected chunk aborts the remaining sends of that kind only; the
//! other kinds proceed independently and the per-kind result is
//! reported upward.

use crate::core::config::DeliveryConfig;
use crate::core::error::{Error, Result};
use crate::core::types::Outcome;
use crate::report::bundle::EvidenceBundle;
use crate::report::chunker::{ChunkKind, Chunker, DeliveryChunk};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Transport contract: deliver one serialized chunk. Non-success
/// responses come back as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, body: Vec<u8>) -> Result<()>;
}

/// HTTP transport posting chunks to the reporting endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HttpTransport {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, body: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/report/chunk", self.endpoint))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_token))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Network(format!(
                "reporting endpoint responded with {}",
                status
            )))
        }
    }
}

/// Result of delivering one evidence kind.
#[derive(Debug, Clone)]
pub struct KindDelivery {
    pub kind: ChunkKind,
    pub chunks_total: usize,
    pub chunks_sent: usize,
    pub error: Option<String>,
}

impl KindDelivery {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-kind delivery results for one bundle.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub kinds: Vec<KindDelivery>,
}

impl DeliveryReport {
    pub fn all_succeeded(&self) -> bool {
        self.kinds.iter().all(|k| k.succeeded())
    }

    pub fn failed_kinds(&self) -> Vec<ChunkKind> {
        self.kinds
            .iter()
            .filter(|k| !k.succeeded())
            .map(|k| k.kind)
            .collect()
    }
}

fn activity_field(map: &mut Map<String, Value>, name: &str, outcome: &Outcome<Vec<String>>) {
    match outcome {
        Outcome::Ok(values) => {
            map.insert(name.to_string(), json!(values));
        }
        Outcome::Degraded { reason } => {
            map.insert(format!("{}_error", name), json!(reason));
        }
        Outcome::Failed { kind } => {
            map.insert(format!("{}_error", name), json!(kind));
        }
    }
}

/// Build the per-kind payloads from a finalized bundle. Large
/// collections sit at the top level so the chunker can slice them.
pub fn kind_payloads(bundle: &EvidenceBundle) -> Vec<(ChunkKind, Value)> {
    let detection = json!({
        "session_id": bundle.session_id,
        "computer_name": bundle.computer_name,
        "profile": bundle.profile,
        "risk_score": bundle.risk_score,
        "risk_level": bundle.risk_level,
        "accounts": bundle.accounts,
        "account_discovery": bundle.account_discovery,
    });

    let security = json!({
        "services": bundle.security_posture.services,
        "tamper_protection": bundle.security_posture.tamper_protection,
        "anticheat_installed": bundle.security_posture.anticheat_installed,
    });

    let suspicious = json!({
        "total": bundle.scanned_files.len(),
        "files": bundle.scanned_files,
        "detected_signatures": bundle.detected_signatures,
        "most_suspicious": bundle.views.most_suspicious,
        "recent_dlls": bundle.views.recent_dlls,
        "last_modified": bundle.views.last_modified,
        "last_created": bundle.views.last_created,
    });

    let recycle = json!({
        "total": bundle.recycle_entries.len(),
        "entries": bundle.recycle_entries,
        "cleanup": bundle.recycle_cleanup,
    });

    let mut registry = Map::new();
    activity_field(
        &mut registry,
        "compatibility_assistant",
        &bundle.registry_activity.compatibility_assistant,
    );
    activity_field(
        &mut registry,
        "app_switched",
        &bundle.registry_activity.app_switched,
    );
    activity_field(&mut registry, "mui_cache", &bundle.registry_activity.mui_cache);

    vec![
        (ChunkKind::Detection, detection),
        (ChunkKind::Security, security),
        (ChunkKind::SuspiciousFiles, suspicious),
        (ChunkKind::RecycleBin, recycle),
        (ChunkKind::RegistryActivity, Value::Object(registry)),
    ]
}

/// Deliver a bundle kind by kind. Returns the per-kind outcome; a
/// failed kind never blocks the others.
pub async fn deliver_bundle(
    transport: &dyn Transport,
    chunker: &Chunker,
    bundle: &EvidenceBundle,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for (kind, payload) in kind_payloads(bundle) {
        let chunks = match chunker.plan(kind, payload) {
            Ok(chunks) => chunks,
            Err(e) => {
                log::error!("Chunk planning failed for {}: {}", kind, e);
                report.kinds.push(KindDelivery {
                    kind,
                    chunks_total: 0,
                    chunks_sent: 0,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        report.kinds.push(send_kind(transport, kind, chunks).await);
    }

    if report.all_succeeded() {
        log::info!("All evidence kinds delivered");
    } else {
        log::warn!("Delivery failed for: {:?}", report.failed_kinds());
    }
    report
}

/// Send one kind's chunks in order, aborting the kind on first failure.
async fn send_kind(
    transport: &dyn Transport,
    kind: ChunkKind,
    chunks: Vec<DeliveryChunk>,
) -> KindDelivery {
    let chunks_total = chunks.len();
    let mut chunks_sent = 0;

    for chunk in chunks {
        let body = match serde_json::to_vec(&chunk) {
            Ok(body) => body,
            Err(e) => {
                return KindDelivery {
                    kind,
                    chunks_total,
                    chunks_sent,
                    error: Some(e.to_string()),
                };
            }
        };

        if let Err(e) = transport.deliver(body).await {
            let rejected = Error::DeliveryRejected {
                kind: kind.to_string(),
                index: chunk.index,
                total: chunk.total,
                reason: e.to_string(),
            };
            log::warn!("{}; aborting remaining {} chunks", rejected, kind);
            return KindDelivery {
                kind,
                chunks_total,
                chunks_sent,
                error: Some(rejected.to_string()),
            };
        }

        chunks_sent += 1;
        log::debug!("Delivered {} chunk {}/{}", kind, chunk.index, chunk.total);
    }

    KindDelivery {
        kind,
        chunks_total,
        chunks_sent,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Profile;
    use crate::core::types::{
        AccountRecord, FileTimes, ReasonTag, ScannedFile, TamperProtection,
    };
    use crate::report::bundle::{BundleParts, EvidenceBundle};
    use crate::scanner::recycle_bin::RecycleCleanup;
    use crate::scanner::security::{RegistryActivity, SecurityPosture};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FakeTransport {
        sent: Mutex<Vec<Value>>,
        fail_on: Option<(ChunkKind, usize)>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(kind: ChunkKind, index: usize) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_on: Some((kind, index)),
            }
        }

        fn sent_chunks(&self) -> Vec<DeliveryChunk> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|v| serde_json::from_value(v.clone()).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn deliver(&self, body: Vec<u8>) -> crate::core::error::Result<()> {
            let value: Value = serde_json::from_slice(&body).unwrap();
            let chunk: DeliveryChunk = serde_json::from_value(value.clone()).unwrap();

            if let Some((kind, index)) = self.fail_on {
                if chunk.kind == kind && chunk.index == index {
                    return Err(Error::Network("simulated 500".to_string()));
                }
            }

            self.sent.lock().unwrap().push(value);
            Ok(())
        }
    }

    fn bundle_with_files(count: usize) -> EvidenceBundle {
        let files: Vec<ScannedFile> = (0..count)
            .map(|i| {
                let mut f = ScannedFile::new(
                    PathBuf::from(format!("C:\\Users\\x\\Downloads\\bad_{:03}.exe", i)),
                    vec![ReasonTag::RandomName],
                );
                f.file_name = format!("bad_{:03}.exe", i);
                f.size_bytes = Some(1000 + i as u64);
                f.times = FileTimes::default();
                f
            })
            .collect();

        EvidenceBundle::finalize(BundleParts {
            session_id: "s".to_string(),
            computer_name: "PC".to_string(),
            profile: Profile::Strict,
            scanned_files: files,
            recycle_entries: Vec::new(),
            accounts: vec![AccountRecord::local_only(
                "76561198000000001",
                "a",
                "A",
                true,
            )],
            account_discovery: Outcome::Ok(1),
            security_posture: SecurityPosture {
                services: vec![],
                tamper_protection: TamperProtection::Unknown,
                anticheat_installed: false,
            },
            registry_activity: RegistryActivity {
                compatibility_assistant: Outcome::Ok(vec!["a.exe".to_string()]),
                app_switched: Outcome::Failed {
                    kind: "denied".to_string(),
                },
                mui_cache: Outcome::Ok(vec![]),
            },
            recycle_cleanup: RecycleCleanup::Unknown,
        })
    }

    #[tokio::test]
    async fn test_full_delivery_succeeds() {
        let transport = FakeTransport::new();
        let chunker = Chunker::new(50 * 1024);
        let bundle = bundle_with_files(3);

        let report = deliver_bundle(&transport, &chunker, &bundle).await;
        assert!(report.all_succeeded());
        assert_eq!(report.kinds.len(), 5);

        // Small bundle: one chunk per kind.
        let sent = transport.sent_chunks();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|c| c.total == 1));
    }

    #[tokio::test]
    async fn test_failed_kind_aborts_only_itself() {
        // Tight ceiling forces multiple suspicious_files chunks; the
        // second one is rejected.
        let transport = FakeTransport::failing_on(ChunkKind::SuspiciousFiles, 2);
        let chunker = Chunker::new(2048);
        let bundle = bundle_with_files(60);

        let report = deliver_bundle(&transport, &chunker, &bundle).await;
        assert!(!report.all_succeeded());
        assert_eq!(report.failed_kinds(), vec![ChunkKind::SuspiciousFiles]);

        let suspicious = report
            .kinds
            .iter()
            .find(|k| k.kind == ChunkKind::SuspiciousFiles)
            .unwrap();
        assert!(suspicious.chunks_total > 2);
        // One chunk went out before the rejection stopped the kind.
        assert_eq!(suspicious.chunks_sent, 1);

        // Later kinds were still delivered.
        let sent = transport.sent_chunks();
        assert!(sent.iter().any(|c| c.kind == ChunkKind::RecycleBin));
        assert!(sent.iter().any(|c| c.kind == ChunkKind::RegistryActivity));

        // No suspicious chunk after the failed index got through.
        assert!(!sent
            .iter()
            .any(|c| c.kind == ChunkKind::SuspiciousFiles && c.index > 1));
    }

    #[tokio::test]
    async fn test_registry_payload_keeps_failure_distinguishable() {
        let transport = FakeTransport::new();
        let chunker = Chunker::new(50 * 1024);
        let bundle = bundle_with_files(0);

        deliver_bundle(&transport, &chunker, &bundle).await;
        let sent = transport.sent_chunks();
        let registry = sent
            .iter()
            .find(|c| c.kind == ChunkKind::RegistryActivity)
            .unwrap();

        let payload = registry.payload.as_object().unwrap();
        assert!(payload.contains_key("compatibility_assistant"));
        assert_eq!(payload["app_switched_error"], "denied");
        // An empty successful dump is an empty array, not an error key.
        assert!(payload.contains_key("mui_cache"));
    }
}
