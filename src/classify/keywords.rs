//! Known-bad-name and keyword rules.

use crate::core::config::Profile;

/// Executable names tied to known cheating/tampering tooling.
/// Matched exactly, case-insensitively, against the file name.
pub const KNOWN_BAD_NAMES: &[&str] = &["dControl.exe", "loader.exe", "ProcessHacker.exe"];

/// Core keyword set: the full-drive scan path.
pub const KEYWORDS_STRICT: &[&str] = &["cheat", "hack", "rustiris", "omega"];

/// Extended keyword set: the simplified scanner path.
pub const KEYWORDS_LOOSE: &[&str] = &[
    "cheat", "hack", "rustiris", "omega", "injector", "dcontrol", "loader", "iris",
];

/// Anti-cheat and anti-tamper product tokens. Their presence suppresses
/// the keyword rule for that location entirely, so legitimate security
/// software never gets flagged for an overlapping token.
pub const ANTICHEAT_ALLOWLIST: &[&str] = &["anticheat", "eac", "battleye", "vanguard", "faceit"];

/// Keyword list for a profile.
pub fn keywords_for(profile: Profile) -> &'static [&'static str] {
    match profile {
        Profile::Strict => KEYWORDS_STRICT,
        Profile::Loose => KEYWORDS_LOOSE,
    }
}

/// Exact case-insensitive match against the known-bad name list.
pub fn is_known_bad_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    KNOWN_BAD_NAMES.iter().any(|n| n.to_lowercase() == lower)
}

/// Case-insensitive keyword match with allow-list suppression.
///
/// Applied independently to the file name and to the full path; the
/// caller tags each location separately.
pub fn matches_keyword(text: &str, profile: Profile) -> bool {
    let lower = text.to_lowercase();

    if ANTICHEAT_ALLOWLIST.iter().any(|a| lower.contains(a)) {
        return false;
    }

    keywords_for(profile).iter().any(|k| lower.contains(k))
}
