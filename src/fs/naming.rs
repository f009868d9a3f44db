//! Filename generation and sanitization.

use chrono::{DateTime, Utc};
use regex::Regex;

/// Maximum length of a sanitized path component.
pub const MAX_COMPONENT_LEN: usize = 200;

/// Seed used when sanitization leaves nothing usable.
const FALLBACK_COMPONENT: &str = "chat";

/// Timestamp format appended to run folder names (UTC).
const FOLDER_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sanitize a chat title or identifier into a safe path component.
///
/// Runs of characters other than alphanumerics, dots, and dashes collapse to
/// a single underscore; leading/trailing underscores and dots are trimmed and
/// the result is capped at [`MAX_COMPONENT_LEN`] characters.
pub fn sanitize_component(name: &str) -> String {
    let pattern = Regex::new(r"[^\p{L}\p{N}.\-]+").unwrap();
    let collapsed = pattern.replace_all(name, "_");
    let trimmed = collapsed.trim_matches(|c| c == '_' || c == '.');
    let capped: String = trimmed.chars().take(MAX_COMPONENT_LEN).collect();

    if capped.is_empty() {
        FALLBACK_COMPONENT.to_string()
    } else {
        capped
    }
}

/// Build the folder name for one run: `<sanitized seed>_<UTC timestamp>`.
pub fn run_folder_name(seed: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        sanitize_component(seed),
        at.format(FOLDER_TIMESTAMP_FORMAT)
    )
}

/// Build the file name for one album member: `<groupBaseId>_<position>.<ext>`.
pub fn media_file_name(base_id: i64, position: usize, extension: &str) -> String {
    format!("{}_{}.{}", base_id, position, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_component("My Chat! (2024)"), "My_Chat_2024");
        assert_eq!(sanitize_component("plain-name.v2"), "plain-name.v2");
        assert_eq!(sanitize_component("a   b\t\tc"), "a_b_c");
    }

    #[test]
    fn test_sanitize_trims_edges() {
        assert_eq!(sanitize_component("..hidden.."), "hidden");
        assert_eq!(sanitize_component("__chat__"), "chat");
        assert_eq!(sanitize_component("  spaced  "), "spaced");
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize_component("Тест чат"), "Тест_чат");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_component(&long).chars().count(), MAX_COMPONENT_LEN);
    }

    #[test]
    fn test_sanitize_fallback_when_empty() {
        assert_eq!(sanitize_component("!!!"), "chat");
        assert_eq!(sanitize_component(""), "chat");
    }

    #[test]
    fn test_run_folder_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(run_folder_name("My Chat", at), "My_Chat_20240301_090507");
    }

    #[test]
    fn test_media_file_name() {
        assert_eq!(media_file_name(1021, 1, "jpg"), "1021_1.jpg");
        assert_eq!(media_file_name(1021, 3, "mp4"), "1021_3.mp4");
    }
}
