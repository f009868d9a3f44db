//! Reaction Tracker - rank chat messages by audience reactions.
//!
//! This library scans a chat's message history, ranks messages by their total
//! reaction count, and optionally downloads the media attached to the
//! top-ranked messages, streaming progress events throughout.
//!
//! # Features
//!
//! - Chronological history scan with reaction counting and filtering
//! - Stable ranking (ties keep chronological order)
//! - Album-aware download cap: a media group counts as one entry
//! - Concurrent media downloads through a bounded worker pool
//! - Size-capped downloads with an oversized-media manifest
//! - Ordered progress events with keep-alive polling for slow consumers
//!
//! The chat itself is reached through the [`session::ChatSession`]
//! capability; a Telegram Desktop export backend ships in
//! [`session::ExportSession`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use reaction_tracker::progress;
//! use reaction_tracker::run::{execute_run, RunContext, RunOptions, ScanRequest};
//! use reaction_tracker::session::{ChatIdentifier, ExportSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ExportSession::open(Path::new("export/"))?;
//!     let context = RunContext::new();
//!     let (publisher, _events) = progress::channel();
//!
//!     let request = ScanRequest {
//!         chat: ChatIdentifier::Username("My Chat".to_string()),
//!         period_days: Some(30),
//!         reaction_filter: true,
//!         download_limit: Some(10),
//!         download_media: true,
//!     };
//!     let result = execute_run(
//!         &context,
//!         &session,
//!         &request,
//!         &RunOptions::default(),
//!         &publisher,
//!     )
//!     .await?;
//!     println!("scanned {} messages", result.scanned);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;
pub mod progress;
pub mod run;
pub mod scan;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use progress::{ProgressEvent, ProgressPublisher, ProgressStream};
pub use run::{execute_run, RunContext, RunResult, ScanRequest};
pub use session::{ChatSession, ExportSession};
