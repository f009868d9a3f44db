//! Run orchestration: request/result types and the full pipeline.

pub mod context;

pub use context::{RunContext, RunGuard, RunState};

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::download::{download_media_batch, DEFAULT_CONCURRENT_DOWNLOADS};
use crate::error::{Error, Result};
use crate::fs::naming::run_folder_name;
use crate::fs::paths::{create_run_dir, DEFAULT_DOWNLOADS_DIR};
use crate::media::GROUP_SEARCH_RADIUS;
use crate::progress::ProgressPublisher;
use crate::scan::{cutoff_for_period, rank_candidates, scan_chat, select_for_download};
use crate::session::{ChatIdentifier, ChatMeta, ChatSession};

/// Parameters of one run, immutable once the run starts.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub chat: ChatIdentifier,
    /// Look-back window in days; `None` scans the whole history.
    pub period_days: Option<u32>,
    /// Keep only messages with at least one reaction.
    pub reaction_filter: bool,
    /// Cap on download entries; an album counts as one entry.
    pub download_limit: Option<usize>,
    /// Whether to run the media phase at all.
    pub download_media: bool,
}

/// Ambient knobs for a run, sourced from the configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub downloads_root: PathBuf,
    pub concurrent_downloads: usize,
    pub group_search_radius: i64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            downloads_root: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
            concurrent_downloads: DEFAULT_CONCURRENT_DOWNLOADS,
            group_search_radius: GROUP_SEARCH_RADIUS,
        }
    }
}

/// One ranked message in the final result.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMessage {
    pub id: i64,
    pub reaction_count: u64,
    pub preview: String,
    pub link: String,
    /// Relative paths of downloaded media; albums share their full list
    /// across every member id.
    pub media_paths: Vec<String>,
}

/// Aggregate media counters for a run that ran the media phase.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MediaSummary {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub oversized: u64,
}

/// Final record of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub chat: ChatMeta,
    pub scanned: u64,
    /// Name of the run's folder under the downloads root, when media was
    /// downloaded.
    pub download_folder: Option<String>,
    /// Messages sorted by reaction count descending; ties keep chronological
    /// order.
    pub messages: Vec<RankedMessage>,
    pub media: Option<MediaSummary>,
}

/// Execute one full run: scan → rank → select → download.
///
/// Claims the context's run slot for the duration. Fatal errors surface both
/// as the returned `Err` and as the run's single terminal `Error` event;
/// successful runs end with a single `Complete`.
pub async fn execute_run(
    context: &RunContext,
    session: &dyn ChatSession,
    request: &ScanRequest,
    options: &RunOptions,
    publisher: &ProgressPublisher,
) -> Result<RunResult> {
    let _guard = context.try_begin()?;

    match run_pipeline(session, request, options, publisher).await {
        Ok(result) => {
            publisher.complete(result.scanned);
            Ok(result)
        }
        Err(e) => {
            publisher.error(e.to_string());
            Err(e)
        }
    }
}

async fn run_pipeline(
    session: &dyn ChatSession,
    request: &ScanRequest,
    options: &RunOptions,
    publisher: &ProgressPublisher,
) -> Result<RunResult> {
    if !session.is_authorized().await? {
        return Err(Error::Unauthorized(
            "log in before scanning".to_string(),
        ));
    }

    let chat = session.resolve_chat(&request.chat).await?;
    tracing::info!("Chat found: {}", chat.display_name());

    let since = cutoff_for_period(request.period_days);
    let summary = scan_chat(session, &chat, since, request.reaction_filter, publisher).await?;

    let mut candidates = summary.candidates;
    rank_candidates(&mut candidates);

    let mut download_folder = None;
    let mut media_summary = None;
    let mut media_paths: HashMap<i64, Vec<String>> = HashMap::new();

    if request.download_media && !candidates.is_empty() {
        let selection = select_for_download(
            session,
            &chat,
            &candidates,
            request.download_limit,
            options.group_search_radius,
        )
        .await?;

        let seed = chat
            .title
            .clone()
            .unwrap_or_else(|| request.chat.to_string());
        let folder_name = run_folder_name(&seed, Utc::now());
        let run_dir = create_run_dir(&options.downloads_root, &folder_name).await?;

        let outcome = download_media_batch(
            session,
            &chat,
            &selection.message_ids,
            &run_dir,
            &folder_name,
            options.concurrent_downloads,
            options.group_search_radius,
            publisher,
        )
        .await?;

        media_paths = outcome.media_paths;
        media_summary = Some(MediaSummary {
            total: outcome.total,
            successes: outcome.successes,
            failures: outcome.failures,
            oversized: outcome.oversized.len() as u64,
        });
        download_folder = Some(folder_name);
    }

    let messages = candidates
        .into_iter()
        .map(|c| RankedMessage {
            media_paths: media_paths.get(&c.id).cloned().unwrap_or_default(),
            id: c.id,
            reaction_count: c.reaction_count,
            preview: c.preview,
            link: c.link,
        })
        .collect();

    Ok(RunResult {
        chat,
        scanned: summary.scanned,
        download_folder,
        messages,
        media: media_summary,
    })
}
