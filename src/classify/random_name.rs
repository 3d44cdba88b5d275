//! Random-name rule: flags machine-generated looking executable names.

use crate::core::config::Profile;

/// Substrings that mark a long alphanumeric name as legitimate.
///
/// Long machine-generated names from real tooling (single-file hosts,
/// installers, driver updaters) almost always embed one of these; truly
/// random droppers almost never do.
pub const MEANINGFUL_SUBSTRINGS: &[&str] = &[
    "compiler", "single", "file", "host", "setup", "install", "update", "service", "helper",
    "launcher", "manager", "client", "server", "daemon", "process", "system", "microsoft",
    "windows", "discord", "steam", "nvidia", "intel", "amd", "google", "chrome", "firefox",
    "visual", "studio", "code", "git", "node", "npm", "python", "java", "dotnet", "framework",
    "runtime",
];

/// Minimum stripped-name length per profile.
pub const MIN_LEN_STRICT: usize = 20;
pub const MIN_LEN_LOOSE: usize = 10;

/// Letter/digit transitions above this count read as random (strict profile).
const TRANSITION_THRESHOLD: usize = 8;

/// Names at least this long with mixed case read as base32/hash-like.
const LONG_MIXED_CASE_LEN: usize = 32;

/// Strip the final extension from a file name.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Whether a file name looks randomly generated.
///
/// Both profiles require an alphanumeric-only stripped name of the
/// profile's minimum length, and any meaningful substring suppresses
/// the rule outright. The loose profile flags everything that clears
/// that gate; the strict profile additionally demands entropy evidence:
/// more than 8 letter/digit transitions, or 32+ characters with both
/// letter cases.
pub fn is_random_name(file_name: &str, profile: Profile) -> bool {
    let stem = strip_extension(file_name);

    let min_len = match profile {
        Profile::Strict => MIN_LEN_STRICT,
        Profile::Loose => MIN_LEN_LOOSE,
    };
    if stem.len() < min_len {
        return false;
    }

    if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let lower = stem.to_lowercase();
    if MEANINGFUL_SUBSTRINGS.iter().any(|m| lower.contains(m)) {
        return false;
    }

    if profile == Profile::Loose {
        return true;
    }

    let mut transitions = 0;
    let mut prev_is_digit: Option<bool> = None;
    for c in stem.chars() {
        let is_digit = c.is_ascii_digit();
        if let Some(prev) = prev_is_digit {
            if prev != is_digit {
                transitions += 1;
            }
        }
        prev_is_digit = Some(is_digit);
    }

    if transitions > TRANSITION_THRESHOLD {
        return true;
    }

    stem.len() >= LONG_MIXED_CASE_LEN
        && stem.chars().any(|c| c.is_ascii_lowercase())
        && stem.chars().any(|c| c.is_ascii_uppercase())
}
