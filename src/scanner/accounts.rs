//! Local credential-store discovery.
//!
//! The game platform keeps its logged-in accounts in a VDF text file
//! under its install directory. The install directory comes from the
//! registry; the accounts come out of the file with the same field
//! extraction the replaced tooling used. A missing store degrades to an
//! empty account list.

use crate::core::types::{AccountRecord, Outcome};
use crate::probes::registry::{PLATFORM_INSTALL_KEY, PLATFORM_INSTALL_VALUE};
use crate::probes::{FsProbe, RegistryProbe};
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Store file relative to the platform install directory.
const STORE_RELATIVE_PATH: &[&str] = &["config", "loginusers.vdf"];

fn platform_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""(\d{17})""#).expect("static regex"))
}

fn field_re(field: &str) -> Regex {
    Regex::new(&format!(r#""{}"\s+"([^"]+)""#, field)).expect("static regex")
}

/// Extract account entries from the credential store's VDF text.
///
/// Ids, account names, display names and most-recent flags are pulled
/// out independently and zipped positionally; a store with fewer name
/// fields than ids still yields records ("Unknown" placeholders).
pub fn parse_credential_store(vdf: &str) -> Vec<AccountRecord> {
    let ids: Vec<&str> = platform_id_re()
        .captures_iter(vdf)
        .map(|c| c.get(1).expect("group 1").as_str())
        .collect();

    let account_names: Vec<String> = field_re("AccountName")
        .captures_iter(vdf)
        .map(|c| c[1].to_string())
        .collect();

    let display_names: Vec<String> = field_re("PersonaName")
        .captures_iter(vdf)
        .map(|c| c[1].to_string())
        .collect();

    let most_recent: Vec<bool> = field_re("MostRecent")
        .captures_iter(vdf)
        .map(|c| &c[1] == "1")
        .collect();

    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            AccountRecord::local_only(
                *id,
                account_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                display_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                most_recent.get(i).copied().unwrap_or(false),
            )
        })
        .collect()
}

/// Finds and parses the local credential store.
pub struct AccountStore {
    fs: Arc<dyn FsProbe>,
    registry: Arc<dyn RegistryProbe>,
}

impl AccountStore {
    pub fn new(fs: Arc<dyn FsProbe>, registry: Arc<dyn RegistryProbe>) -> Self {
        Self { fs, registry }
    }

    /// Discover local accounts. Degrades when the platform is not
    /// installed or the store cannot be read.
    pub async fn discover(&self) -> Outcome<Vec<AccountRecord>> {
        let install_path = match self
            .registry
            .read_value(PLATFORM_INSTALL_KEY, PLATFORM_INSTALL_VALUE)
            .await
        {
            Outcome::Ok(path) => path,
            Outcome::Degraded { reason } => {
                log::info!("Platform not installed: {}", reason);
                return Outcome::Degraded { reason };
            }
            Outcome::Failed { kind } => return Outcome::Failed { kind },
        };

        let mut store_path = PathBuf::from(install_path);
        for part in STORE_RELATIVE_PATH {
            store_path.push(part);
        }

        match self.fs.read_file_bytes(&store_path).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let accounts = parse_credential_store(&text);
                log::info!("Found {} platform account(s)", accounts.len());
                Outcome::Ok(accounts)
            }
            Err(e) => Outcome::Degraded {
                reason: format!("credential store unreadable: {}", e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_VDF: &str = r#"
"users"
{
    "76561198000000001"
    {
        "AccountName"        "gamer_one"
        "PersonaName"        "GamerOne"
        "RememberPassword"   "1"
        "MostRecent"         "1"
        "Timestamp"          "1700000000"
    }
    "76561198000000002"
    {
        "AccountName"        "alt_account"
        "PersonaName"        "TotallyNotAnAlt"
        "RememberPassword"   "0"
        "MostRecent"         "0"
        "Timestamp"          "1600000000"
    }
}
"#;

    #[test]
    fn test_parse_two_accounts() {
        let accounts = parse_credential_store(SAMPLE_VDF);
        assert_eq!(accounts.len(), 2);

        assert_eq!(accounts[0].platform_id, "76561198000000001");
        assert_eq!(accounts[0].account_name, "gamer_one");
        assert_eq!(accounts[0].display_name, "GamerOne");
        assert!(accounts[0].most_recent);

        assert_eq!(accounts[1].platform_id, "76561198000000002");
        assert!(!accounts[1].most_recent);
    }

    #[test]
    fn test_parse_empty_store() {
        assert!(parse_credential_store("\"users\"\n{\n}\n").is_empty());
    }

    #[test]
    fn test_missing_fields_degrade_to_unknown() {
        let vdf = r#""76561198000000003" { "Timestamp" "123" }"#;
        let accounts = parse_credential_store(vdf);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_name, "Unknown");
        assert_eq!(accounts[0].display_name, "Unknown");
        assert!(!accounts[0].most_recent);
    }

    #[test]
    fn test_short_numbers_ignored() {
        // Timestamps and app ids are shorter than 17 digits.
        let vdf = r#""users" { "12345678" { "AccountName" "x" } }"#;
        assert!(parse_credential_store(vdf).is_empty());
    }
}
