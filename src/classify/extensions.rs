//! Extension anomaly rules.

use regex::Regex;
use std::sync::OnceLock;

/// Binary extensions that are unusual inside a user profile folder.
pub const UNUSUAL_EXTENSIONS: &[&str] = &["dll", "sys", "ocx", "scr"];

/// Extension the directory walker collects.
pub const TARGET_EXTENSION: &str = "exe";

fn user_folder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\\Users\\[^\\]+\\").expect("static regex"))
}

/// Whether a path sits under a per-user profile directory.
pub fn is_in_user_folder(path: &str) -> bool {
    user_folder_re().is_match(path)
}

/// Lowercased extension of a path, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    let name = super::file_name_of(path);
    name.rfind('.')
        .filter(|&idx| idx > 0 && idx + 1 < name.len())
        .map(|idx| name[idx + 1..].to_lowercase())
}

/// Whether the extension is one of the unusual binary extensions.
pub fn has_unusual_extension(path: &str) -> bool {
    matches!(extension_of(path), Some(ext) if UNUSUAL_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_folder_detection() {
        assert!(is_in_user_folder("C:\\Users\\alice\\Desktop\\x.dll"));
        assert!(is_in_user_folder("c:\\users\\Bob\\Downloads\\y.sys"));
        assert!(!is_in_user_folder("C:\\Windows\\System32\\z.dll"));
        assert!(!is_in_user_folder("C:\\Users\\"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(
            extension_of("C:\\Users\\a\\x.DLL"),
            Some("dll".to_string())
        );
        assert_eq!(extension_of("C:\\tmp\\archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("C:\\tmp\\noext"), None);
        // A leading dot is a hidden-style name, not an extension.
        assert_eq!(extension_of("C:\\tmp\\.hidden"), None);
    }

    #[test]
    fn test_unusual_extensions() {
        assert!(has_unusual_extension("C:\\Users\\a\\evil.dll"));
        assert!(has_unusual_extension("C:\\Users\\a\\driver.SYS"));
        assert!(has_unusual_extension("C:\\Users\\a\\old.ocx"));
        assert!(has_unusual_extension("C:\\Users\\a\\saver.scr"));
        assert!(!has_unusual_extension("C:\\Users\\a\\app.exe"));
        assert!(!has_unusual_extension("C:\\Users\\a\\doc.txt"));
    }
}
