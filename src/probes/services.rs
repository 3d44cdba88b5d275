//! Service and tamper-protection collaborators.
//!
//! Status is read the way an operator would: `sc query` for services,
//! PowerShell's `Get-MpComputerStatus` for tamper protection, and the
//! anti-cheat vendor's install directories for its presence. Output
//! parsing is separated from process spawning so it stays testable on
//! any host.

use crate::core::types::{ServiceStatus, TamperProtection};
use async_trait::async_trait;
use std::path::Path;

/// Service state queries used by the security-posture check.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Query a service's current state. Failure degrades to `Unknown`.
    async fn query_service_status(&self, name: &str) -> ServiceStatus;

    /// Query Defender tamper protection. Failure degrades to `Unknown`.
    async fn query_tamper_protection(&self) -> TamperProtection;

    /// Whether the anti-cheat runtime is installed on this machine.
    async fn query_anticheat_installed(&self) -> bool;
}

/// Install locations checked for the anti-cheat runtime.
const ANTICHEAT_PATHS: &[&str] = &[
    "C:\\Program Files (x86)\\EasyAntiCheat",
    "C:\\Program Files\\EasyAntiCheat",
];

/// Parse `sc query` output into a service status.
pub(crate) fn parse_sc_query(stdout: &str, stderr: &str, success: bool) -> ServiceStatus {
    if success && stdout.contains("RUNNING") {
        ServiceStatus::Running
    } else if success && stdout.contains("STOPPED") {
        ServiceStatus::Stopped
    } else if stderr.contains("does not exist") || stdout.contains("does not exist") {
        ServiceStatus::NotFound
    } else {
        ServiceStatus::Unknown
    }
}

/// Parse the `IsTamperProtected` PowerShell output.
pub(crate) fn parse_tamper_output(stdout: &str) -> TamperProtection {
    match stdout.trim() {
        "True" => TamperProtection::Enabled,
        "False" => TamperProtection::Disabled,
        _ => TamperProtection::Unknown,
    }
}

/// Real implementation backed by the OS service control manager.
#[derive(Debug, Default, Clone)]
pub struct ServiceControlProbe;

impl ServiceControlProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ServiceProbe for ServiceControlProbe {
    #[cfg(windows)]
    async fn query_service_status(&self, name: &str) -> ServiceStatus {
        let output = tokio::process::Command::new("sc")
            .args(["query", name])
            .output()
            .await;

        match output {
            Ok(out) => parse_sc_query(
                &String::from_utf8_lossy(&out.stdout),
                &String::from_utf8_lossy(&out.stderr),
                out.status.success(),
            ),
            Err(e) => {
                log::warn!("sc query {} failed: {}", name, e);
                ServiceStatus::Unknown
            }
        }
    }

    #[cfg(not(windows))]
    async fn query_service_status(&self, name: &str) -> ServiceStatus {
        log::debug!("Service query for {} unsupported on this platform", name);
        ServiceStatus::Unknown
    }

    #[cfg(windows)]
    async fn query_tamper_protection(&self) -> TamperProtection {
        let output = tokio::process::Command::new("powershell")
            .args([
                "-Command",
                "Get-MpComputerStatus | Select-Object -ExpandProperty IsTamperProtected",
            ])
            .output()
            .await;

        match output {
            Ok(out) => parse_tamper_output(&String::from_utf8_lossy(&out.stdout)),
            Err(e) => {
                log::warn!("Tamper protection query failed: {}", e);
                TamperProtection::Unknown
            }
        }
    }

    #[cfg(not(windows))]
    async fn query_tamper_protection(&self) -> TamperProtection {
        TamperProtection::Unknown
    }

    async fn query_anticheat_installed(&self) -> bool {
        for path in ANTICHEAT_PATHS {
            if Path::new(path).exists() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sc_query_running() {
        let stdout = "SERVICE_NAME: WinDefend\n        STATE              : 4  RUNNING\n";
        assert_eq!(parse_sc_query(stdout, "", true), ServiceStatus::Running);
    }

    #[test]
    fn test_parse_sc_query_stopped() {
        let stdout = "SERVICE_NAME: wuauserv\n        STATE              : 1  STOPPED\n";
        assert_eq!(parse_sc_query(stdout, "", true), ServiceStatus::Stopped);
    }

    #[test]
    fn test_parse_sc_query_not_found() {
        let stderr = "The specified service does not exist as an installed service.";
        assert_eq!(parse_sc_query("", stderr, false), ServiceStatus::NotFound);
    }

    #[test]
    fn test_parse_sc_query_unknown() {
        assert_eq!(parse_sc_query("", "access denied", false), ServiceStatus::Unknown);
    }

    #[test]
    fn test_parse_tamper_output() {
        assert_eq!(parse_tamper_output("True\r\n"), TamperProtection::Enabled);
        assert_eq!(parse_tamper_output("False\n"), TamperProtection::Disabled);
        assert_eq!(parse_tamper_output("garbage"), TamperProtection::Unknown);
        assert_eq!(parse_tamper_output(""), TamperProtection::Unknown);
    }
}
