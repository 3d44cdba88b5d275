//! Security posture and registry activity collection.

use crate::core::types::{Outcome, ServiceStatus, TamperProtection};
use crate::probes::registry::{APP_SWITCHED_KEY, COMPAT_ASSISTANT_KEY, MUI_CACHE_KEY};
use crate::probes::{RegistryProbe, ServiceProbe};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Services whose state goes into every evidence bundle.
pub const MONITORED_SERVICES: &[(&str, &str)] = &[
    ("EventLog", "Windows Event Log"),
    ("WinDefend", "Windows Defender Antivirus"),
    ("MpsSvc", "Microsoft Defender Firewall"),
    ("EasyAntiCheat", "Easy Anti-Cheat"),
    ("wuauserv", "Windows Update"),
    ("wscsvc", "Windows Security Center"),
    ("Wecsvc", "Event Forwarding/Collector"),
];

/// One monitored service's observed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub display_name: String,
    pub status: ServiceStatus,
}

/// Snapshot of the machine's security-relevant state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPosture {
    pub services: Vec<ServiceEntry>,
    pub tamper_protection: TamperProtection,
    pub anticheat_installed: bool,
}

/// Program-execution history pulled from the registry. Each dump keeps
/// its own outcome so a failed read stays distinguishable from an empty
/// key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryActivity {
    pub compatibility_assistant: Outcome<Vec<String>>,
    pub app_switched: Outcome<Vec<String>>,
    pub mui_cache: Outcome<Vec<String>>,
}

impl RegistryActivity {
    /// All three dumps degraded or failed.
    pub fn is_unavailable(&self) -> bool {
        !self.compatibility_assistant.is_ok()
            && !self.app_switched.is_ok()
            && !self.mui_cache.is_ok()
    }
}

/// Strip the cache's `.FriendlyAppName` suffix from a MuiCache value
/// name, leaving the executable path.
pub fn normalize_mui_entry(name: &str) -> String {
    name.strip_suffix(".FriendlyAppName")
        .unwrap_or(name)
        .to_string()
}

/// Collects posture and activity through the service/registry probes.
pub struct SecurityScanner {
    services: Arc<dyn ServiceProbe>,
    registry: Arc<dyn RegistryProbe>,
}

impl SecurityScanner {
    pub fn new(services: Arc<dyn ServiceProbe>, registry: Arc<dyn RegistryProbe>) -> Self {
        Self { services, registry }
    }

    /// Query every monitored service plus tamper protection. A failing
    /// probe degrades the individual entry to Unknown.
    pub async fn collect_posture(&self) -> SecurityPosture {
        let anticheat_installed = self.services.query_anticheat_installed().await;

        let mut services = Vec::with_capacity(MONITORED_SERVICES.len());
        for (name, display_name) in MONITORED_SERVICES {
            // The anti-cheat runtime is a presence check, not a service
            // query: its service only registers while a game runs.
            let status = if *name == "EasyAntiCheat" {
                if anticheat_installed {
                    ServiceStatus::Running
                } else {
                    ServiceStatus::NotFound
                }
            } else {
                self.services.query_service_status(name).await
            };

            log::debug!("Service {}: {}", name, status);
            services.push(ServiceEntry {
                name: name.to_string(),
                display_name: display_name.to_string(),
                status,
            });
        }

        let tamper_protection = self.services.query_tamper_protection().await;

        SecurityPosture {
            services,
            tamper_protection,
            anticheat_installed,
        }
    }

    /// Dump the program-execution history keys.
    pub async fn collect_registry_activity(&self) -> RegistryActivity {
        let compatibility_assistant = self.registry.dump_value_names(COMPAT_ASSISTANT_KEY).await;
        let app_switched = self.registry.dump_value_names(APP_SWITCHED_KEY).await;
        let mui_cache = self
            .registry
            .dump_value_names(MUI_CACHE_KEY)
            .await
            .map(|names| names.iter().map(|n| normalize_mui_entry(n)).collect());

        RegistryActivity {
            compatibility_assistant,
            app_switched,
            mui_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    struct FakeServices {
        defender: ServiceStatus,
        anticheat: bool,
    }

    #[async_trait]
    impl ServiceProbe for FakeServices {
        async fn query_service_status(&self, name: &str) -> ServiceStatus {
            match name {
                "WinDefend" => self.defender,
                "EventLog" => ServiceStatus::Running,
                _ => ServiceStatus::Unknown,
            }
        }

        async fn query_tamper_protection(&self) -> TamperProtection {
            TamperProtection::Enabled
        }

        async fn query_anticheat_installed(&self) -> bool {
            self.anticheat
        }
    }

    struct FakeRegistry;

    #[async_trait]
    impl RegistryProbe for FakeRegistry {
        async fn read_value(&self, _key: &str, _value: &str) -> Outcome<String> {
            Outcome::Degraded {
                reason: "unused".into(),
            }
        }

        async fn dump_value_names(&self, key: &str) -> Outcome<Vec<String>> {
            if key == MUI_CACHE_KEY {
                Outcome::Ok(vec![
                    "C:\\Games\\game.exe.FriendlyAppName".to_string(),
                    "C:\\Tools\\tool.exe".to_string(),
                ])
            } else if key == APP_SWITCHED_KEY {
                Outcome::Failed {
                    kind: "access denied".into(),
                }
            } else {
                Outcome::Ok(vec![])
            }
        }

        async fn recycle_cleanup_time(&self) -> Outcome<Option<DateTime<Utc>>> {
            Outcome::Ok(None)
        }
    }

    #[tokio::test]
    async fn test_posture_covers_all_services() {
        let scanner = SecurityScanner::new(
            Arc::new(FakeServices {
                defender: ServiceStatus::Stopped,
                anticheat: true,
            }),
            Arc::new(FakeRegistry),
        );

        let posture = scanner.collect_posture().await;
        assert_eq!(posture.services.len(), MONITORED_SERVICES.len());

        let defender = posture
            .services
            .iter()
            .find(|s| s.name == "WinDefend")
            .unwrap();
        assert_eq!(defender.status, ServiceStatus::Stopped);

        let eac = posture
            .services
            .iter()
            .find(|s| s.name == "EasyAntiCheat")
            .unwrap();
        assert_eq!(eac.status, ServiceStatus::Running);
        assert!(posture.anticheat_installed);
        assert_eq!(posture.tamper_protection, TamperProtection::Enabled);
    }

    #[tokio::test]
    async fn test_anticheat_absent() {
        let scanner = SecurityScanner::new(
            Arc::new(FakeServices {
                defender: ServiceStatus::Running,
                anticheat: false,
            }),
            Arc::new(FakeRegistry),
        );

        let posture = scanner.collect_posture().await;
        let eac = posture
            .services
            .iter()
            .find(|s| s.name == "EasyAntiCheat")
            .unwrap();
        assert_eq!(eac.status, ServiceStatus::NotFound);
    }

    #[tokio::test]
    async fn test_registry_activity_mixed_outcomes() {
        let scanner = SecurityScanner::new(
            Arc::new(FakeServices {
                defender: ServiceStatus::Running,
                anticheat: false,
            }),
            Arc::new(FakeRegistry),
        );

        let activity = scanner.collect_registry_activity().await;

        // Failure and empty-success stay distinguishable.
        assert!(!activity.app_switched.is_ok());
        assert!(activity.compatibility_assistant.is_ok());
        assert!(!activity.is_unavailable());

        let mui = activity.mui_cache.as_ok().unwrap();
        assert_eq!(mui[0], "C:\\Games\\game.exe");
        assert_eq!(mui[1], "C:\\Tools\\tool.exe");
    }

    #[test]
    fn test_normalize_mui_entry() {
        assert_eq!(
            normalize_mui_entry("C:\\a\\b.exe.FriendlyAppName"),
            "C:\\a\\b.exe"
        );
        assert_eq!(normalize_mui_entry("plain"), "plain");
    }
}
