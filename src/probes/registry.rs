//! Registry collaborator.
//!
//! Reads individual values and dumps value-name listings through
//! `reg query`, the same data source the replaced tooling used. Output
//! parsing is pure and tested on every platform.

use crate::core::types::Outcome;
use crate::utils::time::filetime_to_datetime;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Platform credential-store install path.
pub const PLATFORM_INSTALL_KEY: &str = r"HKEY_CURRENT_USER\SOFTWARE\Valve\Steam";
pub const PLATFORM_INSTALL_VALUE: &str = "SteamPath";

/// Recycle-bin bookkeeping key holding the last-empty timestamp.
pub const BITBUCKET_KEY: &str =
    r"HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Explorer\BitBucket";
pub const LAST_EMPTY_VALUE: &str = "LastEmptyTime";

/// Program-execution history keys dumped into the evidence bundle.
pub const COMPAT_ASSISTANT_KEY: &str = r"HKEY_CURRENT_USER\Software\Microsoft\Windows NT\CurrentVersion\AppCompatFlags\Compatibility Assistant\Store";
pub const APP_SWITCHED_KEY: &str = r"HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Explorer\FeatureUsage\AppSwitched";
pub const MUI_CACHE_KEY: &str = r"HKEY_CURRENT_USER\Software\Classes\Local Settings\Software\Microsoft\Windows\Shell\MuiCache";

/// Registry reads used by the security-posture and recycle-bin checks.
#[async_trait]
pub trait RegistryProbe: Send + Sync {
    /// Read a single named value under a key.
    async fn read_value(&self, key: &str, value: &str) -> Outcome<String>;

    /// List the value names under a key.
    async fn dump_value_names(&self, key: &str) -> Outcome<Vec<String>>;

    /// When the recycle bin was last emptied, if the system recorded it.
    async fn recycle_cleanup_time(&self) -> Outcome<Option<DateTime<Utc>>>;
}

/// Extract a named value from `reg query` output.
///
/// The matching line has the shape `    Name    REG_TYPE    data...`;
/// everything from the third column on is the data.
pub(crate) fn parse_reg_value(output: &str, value_name: &str) -> Option<String> {
    for line in output.lines() {
        if line.contains(value_name) {
            let parts: Vec<&str> = line.trim().split_whitespace().collect();
            if parts.len() >= 3 && parts[0] == value_name {
                return Some(parts[2..].join(" "));
            }
        }
    }
    None
}

/// Extract the value names under a key from `reg query` output.
///
/// Value lines are indented; the key header and blank lines are not.
pub(crate) fn parse_value_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.starts_with("    ") && !line.trim().is_empty())
        .filter_map(|line| line.trim().split("    ").next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse a REG_QWORD FILETIME hex string ("0x1d9c0ffee...") into a
/// timestamp.
pub(crate) fn parse_filetime_hex(data: &str) -> Option<DateTime<Utc>> {
    let hex = data.trim().strip_prefix("0x")?;
    let filetime = u64::from_str_radix(hex, 16).ok()?;
    filetime_to_datetime(filetime)
}

/// Real registry access through `reg query`.
#[derive(Debug, Default, Clone)]
pub struct SystemRegistry;

impl SystemRegistry {
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    async fn run_reg_query(args: &[&str]) -> std::io::Result<(String, bool)> {
        let output = tokio::process::Command::new("reg")
            .arg("query")
            .args(args)
            .output()
            .await?;
        Ok((
            String::from_utf8_lossy(&output.stdout).into_owned(),
            output.status.success(),
        ))
    }
}

#[async_trait]
impl RegistryProbe for SystemRegistry {
    #[cfg(windows)]
    async fn read_value(&self, key: &str, value: &str) -> Outcome<String> {
        match Self::run_reg_query(&[key, "/v", value]).await {
            Ok((stdout, true)) => match parse_reg_value(&stdout, value) {
                Some(data) => Outcome::Ok(data),
                None => Outcome::Degraded {
                    reason: format!("value {} not present under {}", value, key),
                },
            },
            Ok((_, false)) => Outcome::Degraded {
                reason: format!("reg query failed for {}", key),
            },
            Err(e) => Outcome::Failed {
                kind: format!("reg query spawn failed: {}", e),
            },
        }
    }

    #[cfg(not(windows))]
    async fn read_value(&self, _key: &str, _value: &str) -> Outcome<String> {
        Outcome::Degraded {
            reason: "registry unavailable on this platform".to_string(),
        }
    }

    #[cfg(windows)]
    async fn dump_value_names(&self, key: &str) -> Outcome<Vec<String>> {
        match Self::run_reg_query(&[key]).await {
            Ok((stdout, true)) => Outcome::Ok(parse_value_names(&stdout)),
            Ok((_, false)) => Outcome::Degraded {
                reason: format!("reg query failed for {}", key),
            },
            Err(e) => Outcome::Failed {
                kind: format!("reg query spawn failed: {}", e),
            },
        }
    }

    #[cfg(not(windows))]
    async fn dump_value_names(&self, _key: &str) -> Outcome<Vec<String>> {
        Outcome::Degraded {
            reason: "registry unavailable on this platform".to_string(),
        }
    }

    async fn recycle_cleanup_time(&self) -> Outcome<Option<DateTime<Utc>>> {
        match self.read_value(BITBUCKET_KEY, LAST_EMPTY_VALUE).await {
            Outcome::Ok(data) => Outcome::Ok(parse_filetime_hex(&data)),
            Outcome::Degraded { reason } => Outcome::Degraded { reason },
            Outcome::Failed { kind } => Outcome::Failed { kind },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SAMPLE_QUERY: &str = "\r\nHKEY_CURRENT_USER\\Software\\Test\r\n    SteamPath    REG_SZ    c:/program files (x86)/steam\r\n    Other    REG_DWORD    0x1\r\n";

    #[test]
    fn test_parse_reg_value() {
        let value = parse_reg_value(SAMPLE_QUERY, "SteamPath").unwrap();
        assert_eq!(value, "c:/program files (x86)/steam");
    }

    #[test]
    fn test_parse_reg_value_missing() {
        assert!(parse_reg_value(SAMPLE_QUERY, "Missing").is_none());
    }

    #[test]
    fn test_parse_value_names() {
        let names = parse_value_names(SAMPLE_QUERY);
        assert_eq!(names, vec!["SteamPath", "Other"]);
    }

    #[test]
    fn test_parse_filetime_hex() {
        // 2020-01-01T00:00:00Z in FILETIME ticks
        let ticks = (1_577_836_800u64 + 11_644_473_600) * 10_000_000;
        let data = format!("0x{:x}", ticks);
        let dt = parse_filetime_hex(&data).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_filetime_hex_garbage() {
        assert!(parse_filetime_hex("not-hex").is_none());
        assert!(parse_filetime_hex("0xzz").is_none());
    }
}
