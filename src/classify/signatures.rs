//! Fixed signature table of known cheat builds.
//!
//! The table matches on exact payload size (within a small tolerance to
//! absorb patched stubs) or on name containment. A match overrides the
//! additive scoring entirely.

use crate::core::types::{ScannedFile, SignatureMatch};

/// One known cheat build.
#[derive(Debug, Clone, Copy)]
pub struct KnownSignature {
    pub name: &'static str,
    /// Exact build size in bytes; 0 disables the size check
    pub size_bytes: u64,
}

/// Known builds circulating with fixed payload sizes.
pub const KNOWN_SIGNATURES: &[KnownSignature] = &[
    KnownSignature {
        name: "Revolex NRS",
        size_bytes: 45_639_968,
    },
    KnownSignature {
        name: "OmegaCheats",
        size_bytes: 17_016_320,
    },
];

/// Size tolerance, bytes, in either direction.
pub const SIZE_TOLERANCE: u64 = 1024;

fn size_matches(file_size: u64, signature_size: u64) -> bool {
    signature_size != 0 && file_size.abs_diff(signature_size) <= SIZE_TOLERANCE
}

fn name_matches(file_name: &str, signature_name: &str) -> bool {
    let file = file_name.to_lowercase();
    let sig = signature_name.to_lowercase();
    !file.is_empty() && (file.contains(&sig) || sig.contains(&file))
}

/// Check one file against the signature table.
pub fn match_file(file: &ScannedFile) -> Option<SignatureMatch> {
    for sig in KNOWN_SIGNATURES {
        let by_size = file
            .size_bytes
            .map(|s| size_matches(s, sig.size_bytes))
            .unwrap_or(false);
        let by_name = name_matches(&file.file_name, sig.name);

        if by_size || by_name {
            return Some(SignatureMatch {
                signature_name: sig.name.to_string(),
                file_name: file.file_name.clone(),
                path: file.path.clone(),
                size_bytes: file.size_bytes,
                matched_on: if by_size { "size" } else { "name" }.to_string(),
            });
        }
    }
    None
}

/// Check every classified file; one match per signature name at most.
pub fn match_signatures(files: &[ScannedFile]) -> Vec<SignatureMatch> {
    let mut matches: Vec<SignatureMatch> = Vec::new();
    for file in files {
        if let Some(m) = match_file(file) {
            if !matches.iter().any(|e| e.signature_name == m.signature_name) {
                matches.push(m);
            }
        }
    }
    matches
}
