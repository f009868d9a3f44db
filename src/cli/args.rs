//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{parse_chat_identifier, validate_request, Config};
use crate::error::Result;
use crate::run::ScanRequest;

/// Reaction tracker CLI.
#[derive(Parser, Debug)]
#[command(
    name = "reaction-tracker",
    version,
    about = "Rank a chat's messages by reactions and collect their media",
    long_about = "Scans a chat's history, ranks messages by total audience reactions,\n\
                  and optionally downloads the media attached to the top-ranked ones.\n\n\
                  History is read from a Telegram Desktop chat export (result.json)."
)]
pub struct Args {
    /// Chat to scan: public handle, chat title, or numeric id.
    pub chat: String,

    /// Path to the chat export: the export folder or its result.json.
    #[arg(short, long, env = "REACTION_TRACKER_EXPORT")]
    pub export: PathBuf,

    /// Only scan messages from the last N days.
    #[arg(short, long)]
    pub period_days: Option<u32>,

    /// Rank every message, not only those with reactions.
    #[arg(long)]
    pub all_messages: bool,

    /// Download media attached to the top-ranked messages.
    #[arg(long)]
    pub download: bool,

    /// Cap media downloads at N entries (an album counts as one entry).
    #[arg(short = 'l', long)]
    pub download_limit: Option<usize>,

    /// Base directory for downloaded media.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Number of concurrent download tasks.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print progress events and the result as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.storage.download_directory = Some(dir.clone());
        }

        if let Some(concurrency) = self.concurrency {
            config.download.concurrent_downloads = concurrency;
        }
    }

    /// Build the validated scan request for this invocation.
    pub fn to_request(&self) -> Result<ScanRequest> {
        let request = ScanRequest {
            chat: parse_chat_identifier(&self.chat)?,
            period_days: self.period_days,
            reaction_filter: !self.all_messages,
            download_limit: self.download_limit,
            download_media: self.download,
        };
        validate_request(&request)?;
        Ok(request)
    }
}
