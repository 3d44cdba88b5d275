//! HTTP reputation client against the platform's web API.

use super::{BanStatus, ProfileSummary, ReputationService};
use crate::core::config::ReputationConfig;
use crate::core::error::{Error, Result};
use crate::utils::time::unix_secs_to_datetime;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct BansResponse {
    players: Vec<PlayerBans>,
}

#[derive(Debug, Deserialize)]
struct PlayerBans {
    #[serde(rename = "VACBanned", default)]
    vac_banned: bool,
    #[serde(rename = "NumberOfGameBans", default)]
    number_of_game_bans: u32,
    #[serde(rename = "DaysSinceLastBan", default)]
    days_since_last_ban: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    response: SummariesInner,
}

#[derive(Debug, Deserialize)]
struct SummariesInner {
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    #[serde(default)]
    timecreated: Option<i64>,
}

/// Parse a ban-status response body.
pub(crate) fn parse_bans_response(body: &str) -> Result<BanStatus> {
    let parsed: BansResponse = serde_json::from_str(body)?;
    let player = parsed
        .players
        .into_iter()
        .next()
        .ok_or_else(|| Error::Network("ban response contained no players".to_string()))?;

    Ok(BanStatus {
        vac_banned: player.vac_banned,
        game_bans: player.number_of_game_bans,
        days_since_last_ban: player.days_since_last_ban,
    })
}

/// Parse a profile-summary response body.
pub(crate) fn parse_summary_response(body: &str) -> Result<ProfileSummary> {
    let parsed: SummariesResponse = serde_json::from_str(body)?;
    let player = parsed
        .response
        .players
        .into_iter()
        .next()
        .ok_or_else(|| Error::Network("summary response contained no players".to_string()))?;

    Ok(ProfileSummary {
        created_at: player.timecreated.and_then(unix_secs_to_datetime),
    })
}

/// Reputation client over the platform's public web API.
pub struct HttpReputationClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpReputationClient {
    /// Build a client from the reputation configuration.
    pub fn new(config: &ReputationConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout,
        }
    }

    fn bans_url(&self, platform_id: &str) -> String {
        format!(
            "{}/ISteamUser/GetPlayerBans/v1/?key={}&steamids={}",
            self.endpoint, self.api_key, platform_id
        )
    }

    fn summaries_url(&self, platform_id: &str) -> String {
        format!(
            "{}/ISteamUser/GetPlayerSummaries/v0002/?key={}&steamids={}",
            self.endpoint, self.api_key, platform_id
        )
    }

    /// Fetch a URL's body within the configured deadline.
    async fn fetch(&self, url: String, platform_id: &str) -> Result<String> {
        let request = async {
            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(Error::Network(format!(
                    "reputation service responded with {}",
                    response.status()
                )));
            }
            Ok(response.text().await?)
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| Error::ReputationTimeout {
                account: platform_id.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
    }
}

#[async_trait]
impl ReputationService for HttpReputationClient {
    async fn lookup_bans(&self, platform_id: &str) -> Result<BanStatus> {
        let body = self.fetch(self.bans_url(platform_id), platform_id).await?;
        parse_bans_response(&body)
    }

    async fn lookup_profile(&self, platform_id: &str) -> Result<ProfileSummary> {
        let body = self
            .fetch(self.summaries_url(platform_id), platform_id)
            .await?;
        parse_summary_response(&body)
    }
}
