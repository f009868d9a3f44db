//! Request and configuration validation.

use regex::Regex;

use crate::config::loader::Config;
use crate::error::{Error, Result};
use crate::run::ScanRequest;
use crate::session::ChatIdentifier;

/// Maximum accepted length for a chat identifier.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate the configuration before a run starts.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.download.concurrent_downloads == 0 {
        return Err(Error::ConfigValidation {
            field: "concurrent_downloads".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.download.group_search_radius < 1 {
        return Err(Error::ConfigValidation {
            field: "group_search_radius".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Validate a scan request.
pub fn validate_request(request: &ScanRequest) -> Result<()> {
    if request.period_days == Some(0) {
        return Err(Error::ConfigValidation {
            field: "period_days".to_string(),
            message: "must be a positive number of days".to_string(),
        });
    }

    if request.download_limit == Some(0) {
        return Err(Error::ConfigValidation {
            field: "download_limit".to_string(),
            message: "must be a positive number of entries".to_string(),
        });
    }

    Ok(())
}

/// Parse user input into a chat identifier.
///
/// Numeric input (optionally signed) is an internal id; anything else is a
/// public handle or chat title, with a leading `@` stripped.
pub fn parse_chat_identifier(input: &str) -> Result<ChatIdentifier> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingConfig(
            "chat (a username, title, or numeric id is required)".to_string(),
        ));
    }

    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(ChatIdentifier::Id(id));
    }

    let name = trimmed.trim_start_matches('@');
    if name.is_empty() || name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::ConfigValidation {
            field: "chat".to_string(),
            message: format!("'{}' is not a usable chat identifier", input),
        });
    }

    // Printable only; control characters would leak into folder names.
    let pattern = Regex::new(r"^[^\p{C}]+$").unwrap();
    if !pattern.is_match(name) {
        return Err(Error::ConfigValidation {
            field: "chat".to_string(),
            message: format!("'{}' contains control characters", input),
        });
    }

    Ok(ChatIdentifier::Username(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ScanRequest {
        ScanRequest {
            chat: ChatIdentifier::Id(1),
            period_days: None,
            reaction_filter: true,
            download_limit: None,
            download_media: false,
        }
    }

    #[test]
    fn test_parse_numeric_id() {
        assert_eq!(
            parse_chat_identifier("-1001234567").unwrap(),
            ChatIdentifier::Id(-1001234567)
        );
        assert_eq!(parse_chat_identifier(" 42 ").unwrap(), ChatIdentifier::Id(42));
    }

    #[test]
    fn test_parse_username_strips_at() {
        assert_eq!(
            parse_chat_identifier("@rustlang").unwrap(),
            ChatIdentifier::Username("rustlang".to_string())
        );
        assert_eq!(
            parse_chat_identifier("My Chat").unwrap(),
            ChatIdentifier::Username("My Chat".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_control() {
        assert!(parse_chat_identifier("").is_err());
        assert!(parse_chat_identifier("   ").is_err());
        assert!(parse_chat_identifier("@").is_err());
        assert!(parse_chat_identifier("bad\u{0007}name").is_err());
    }

    #[test]
    fn test_validate_request_rejects_zero_values() {
        let mut req = request();
        req.period_days = Some(0);
        assert!(validate_request(&req).is_err());

        let mut req = request();
        req.download_limit = Some(0);
        assert!(validate_request(&req).is_err());

        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_validate_config_bounds() {
        let mut config = Config::default();
        assert!(validate_config(&config).is_ok());

        config.download.concurrent_downloads = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.download.group_search_radius = 0;
        assert!(validate_config(&config).is_err());
    }
}
