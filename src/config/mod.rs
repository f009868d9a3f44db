//! Configuration module.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Request and configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, DownloadConfig, StorageConfig};
pub use validation::{parse_chat_identifier, validate_config, validate_request};
