//! Remote account-reputation lookups.
//!
//! Every local account gets two independent lookups: ban status and a
//! profile summary (for the creation date). Each is bounded by a fixed
//! timeout. Partial data beats no data: any failure retains the record
//! with `lookup_failed` set and ban status defaulted to false.

pub mod http;

pub use http::HttpReputationClient;

use crate::core::error::Result;
use crate::core::types::AccountRecord;
use crate::utils::time::account_age_bucket;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Ban status for one platform account.
#[derive(Debug, Clone, Default)]
pub struct BanStatus {
    pub vac_banned: bool,
    pub game_bans: u32,
    pub days_since_last_ban: Option<u32>,
}

impl BanStatus {
    /// Any ban on record.
    pub fn is_banned(&self) -> bool {
        self.vac_banned || self.game_bans > 0
    }
}

/// Profile summary for one platform account.
#[derive(Debug, Clone, Default)]
pub struct ProfileSummary {
    pub created_at: Option<DateTime<Utc>>,
}

/// Reputation service the client looks accounts up against.
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Look up ban status for an account id.
    async fn lookup_bans(&self, platform_id: &str) -> Result<BanStatus>;

    /// Look up the profile summary for an account id.
    async fn lookup_profile(&self, platform_id: &str) -> Result<ProfileSummary>;
}

/// Merge one local account record with its remote reputation.
///
/// Both lookups must succeed for a fully enriched record; any failure
/// keeps the local record, flags it, and leaves ban status false.
pub async fn enrich_account(
    mut account: AccountRecord,
    service: &dyn ReputationService,
    now: DateTime<Utc>,
) -> AccountRecord {
    let bans = service.lookup_bans(&account.platform_id).await;
    let profile = service.lookup_profile(&account.platform_id).await;

    match (bans, profile) {
        (Ok(bans), Ok(profile)) => {
            account.banned = bans.is_banned();
            account.vac_banned = bans.vac_banned;
            account.ban_count = bans.game_bans + u32::from(bans.vac_banned);
            account.days_since_last_ban = if bans.is_banned() {
                bans.days_since_last_ban
            } else {
                None
            };
            account.created_at = profile.created_at;
            account.account_age = account_age_bucket(profile.created_at, now);
            account.lookup_failed = false;
        }
        (bans, profile) => {
            if let Err(e) = &bans {
                log::warn!("Ban lookup failed for {}: {}", account.platform_id, e);
            }
            if let Err(e) = &profile {
                log::warn!("Profile lookup failed for {}: {}", account.platform_id, e);
            }
            account.lookup_failed = true;
            account.banned = false;
            account.vac_banned = false;
            account.ban_count = 0;
            account.days_since_last_ban = None;
            account.account_age = "Unknown".to_string();
        }
    }

    account
}

/// Enrich every account in order. Lookups are per-account sequential;
/// a failed account never blocks the rest.
pub async fn enrich_accounts(
    accounts: Vec<AccountRecord>,
    service: &dyn ReputationService,
    now: DateTime<Utc>,
) -> Vec<AccountRecord> {
    let total = accounts.len();
    let mut enriched = Vec::with_capacity(total);
    for (i, account) in accounts.into_iter().enumerate() {
        log::info!(
            "Checking account {}/{}: {}",
            i + 1,
            total,
            account.platform_id
        );
        enriched.push(enrich_account(account, service, now).await);
    }
    enriched
}
