//! Risk scoring over the finalized evidence.
//!
//! The score is a pure function of the bundle's fields and is
//! recomputable at any time. A known-signature match overrides
//! everything at 99; that value is reserved for the override and is
//! never reachable additively.

use serde::{Deserialize, Serialize};

/// Score assigned when a known-signature match is present.
pub const SIGNATURE_OVERRIDE_SCORE: u8 = 99;

/// Cap for the additive (non-override) path.
pub const NON_OVERRIDE_CAP: u8 = 95;

/// Points per suspicious file, and that term's cap.
const PER_FILE: u32 = 10;
const FILES_CAP: u32 = 60;

/// Points per banned account, and that term's cap.
const PER_BAN: u32 = 15;
const BANS_CAP: u32 = 30;

/// Compute the risk score from the evidence counts.
pub fn compute_score(suspicious_files: usize, banned_accounts: usize, signature_match: bool) -> u8 {
    if signature_match {
        return SIGNATURE_OVERRIDE_SCORE;
    }

    let file_term = (suspicious_files as u32 * PER_FILE).min(FILES_CAP);
    let ban_term = (banned_accounts as u32 * PER_BAN).min(BANS_CAP);

    (file_term + ban_term).min(NON_OVERRIDE_CAP as u32) as u8
}

/// Coarse reading of a score for operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score 0-29
    Low,
    /// Score 30-69
    Elevated,
    /// Score 70-99
    Severe,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => RiskLevel::Low,
            30..=69 => RiskLevel::Elevated,
            _ => RiskLevel::Severe,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Elevated => write!(f, "Elevated"),
            RiskLevel::Severe => write!(f, "Severe"),
        }
    }
}
