//! File classification: independent rule strategies over paths and
//! names, producing additive reason tags.
//!
//! Rules are pure and order-independent; every matching rule tags the
//! file. The only cross-rule interaction is precedence between the
//! suspicious-DLL tag and the generic unusual-extension tag, and the
//! metadata filtering pass that runs after classification.

pub mod extensions;
pub mod keywords;
pub mod metadata_filter;
pub mod random_name;
pub mod signatures;

pub use metadata_filter::apply_metadata_filter;
pub use signatures::{match_signatures, KnownSignature, KNOWN_SIGNATURES, SIZE_TOLERANCE};

use crate::core::config::Profile;
use crate::core::types::{KeywordLocation, ReasonTag};

/// Path fragments excluded from classification entirely. These bound
/// scan volume and noise; exclusion is not a security judgement.
const GLOBAL_EXCLUDES: &[&str] = &["\\$recycle.bin\\", "\\windows\\winsxs\\"];

/// Install directories of known-legitimate tooling, skipped wholesale.
const LEGITIMATE_PATHS: &[&str] = &[
    "\\msys64\\",
    "\\.conan2\\",
    "\\.nuget\\",
    "\\discord\\",
    "\\fivem\\",
    "\\lghub\\",
    "\\medal\\",
    "\\roblox\\",
    "\\nvidia corporation\\",
    "\\visual studio\\",
    "\\microsoft\\",
    "\\program files\\",
    "\\program files (x86)\\",
    "\\windows\\system32\\",
    "\\windows\\syswow64\\",
];

/// Final path component, accepting either separator.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Whether a path is excluded from every rule.
pub fn is_excluded(path: &str) -> bool {
    let lower = path.to_lowercase();
    GLOBAL_EXCLUDES.iter().any(|e| lower.contains(e))
        || LEGITIMATE_PATHS.iter().any(|e| lower.contains(e))
}

/// Path/name rule evaluation for one strictness profile.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    profile: Profile,
}

impl Classifier {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Evaluate every rule against a full path. Returns the matched
    /// tags in evaluation order; empty means the file is clean or the
    /// path is excluded.
    pub fn classify(&self, path: &str) -> Vec<ReasonTag> {
        if is_excluded(path) {
            return Vec::new();
        }

        let file_name = file_name_of(path);
        let mut reasons = Vec::new();

        if random_name::is_random_name(file_name, self.profile) {
            reasons.push(ReasonTag::RandomName);
        }

        if keywords::is_known_bad_name(file_name) {
            reasons.push(ReasonTag::KnownBadName);
        }

        if keywords::matches_keyword(file_name, self.profile) {
            reasons.push(ReasonTag::SuspiciousKeyword {
                location: KeywordLocation::FileName,
            });
        }

        if keywords::matches_keyword(path, self.profile) {
            reasons.push(ReasonTag::SuspiciousKeyword {
                location: KeywordLocation::FullPath,
            });
        }

        // DLL-with-keyword takes precedence over the generic
        // unusual-extension tag for the same file.
        let ext = extensions::extension_of(path);
        if ext.as_deref() == Some("dll") && keywords::matches_keyword(file_name, self.profile) {
            reasons.push(ReasonTag::SuspiciousDll);
        } else if extensions::has_unusual_extension(path) && extensions::is_in_user_folder(path) {
            reasons.push(ReasonTag::UnusualExtension);
        }

        reasons
    }
}
