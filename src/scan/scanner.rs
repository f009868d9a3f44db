//! Chronological history scanning.

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;

use crate::error::Result;
use crate::progress::ProgressPublisher;
use crate::session::{ChatMeta, ChatSession};

/// Emit a progress event every this many scanned messages.
pub const PROGRESS_INTERVAL: u64 = 50;

/// Maximum preview length in characters.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Preview shown for messages with no text.
const EMPTY_PREVIEW: &str = "[Media/Empty]";

/// One scanned message that passed the filter policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    pub id: i64,
    pub reaction_count: u64,
    pub preview: String,
    pub link: String,
    pub media_group_id: Option<i64>,
}

/// What a completed scan produced.
#[derive(Debug)]
pub struct ScanSummary {
    /// Candidates in chronological scan order.
    pub candidates: Vec<CandidateMessage>,
    pub scanned: u64,
}

/// Convert an optional look-back period to an absolute UTC cutoff.
pub fn cutoff_for_period(period_days: Option<u32>) -> Option<DateTime<Utc>> {
    period_days.map(|days| Utc::now() - Duration::days(i64::from(days)))
}

/// Scan the chat's history forward from `since`.
///
/// Every message contributes to the scanned count; with the reaction filter
/// on, only messages with at least one reaction become candidates. A progress
/// event is emitted every [`PROGRESS_INTERVAL`] messages and once more at the
/// end. Any error surfaced by the iterator aborts the whole scan; partial
/// results are discarded by the caller.
pub async fn scan_chat(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    since: Option<DateTime<Utc>>,
    reaction_filter: bool,
    publisher: &ProgressPublisher,
) -> Result<ScanSummary> {
    let mut stream = session.iter_messages(chat, since);
    let mut candidates = Vec::new();
    let mut scanned = 0u64;

    while let Some(message) = stream.next().await {
        let message = message?;
        scanned += 1;

        let reaction_count = message.reaction_total();
        if !reaction_filter || reaction_count > 0 {
            candidates.push(CandidateMessage {
                id: message.id,
                reaction_count,
                preview: preview_of(&message.text),
                link: chat.message_link(message.id),
                media_group_id: message.media_group_id,
            });
        }

        if scanned % PROGRESS_INTERVAL == 0 {
            publisher.progress(scanned);
            // Let the event consumer run between bursts; the channel itself
            // never blocks this loop.
            tokio::task::yield_now().await;
        }
    }

    publisher.progress(scanned);
    tracing::info!(
        "Scan complete: {} scanned, {} candidate(s)",
        scanned,
        candidates.len()
    );

    Ok(ScanSummary { candidates, scanned })
}

/// Normalize message text into a short single-line preview.
fn preview_of(text: &str) -> String {
    let source = if text.is_empty() { EMPTY_PREVIEW } else { text };
    source
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(PREVIEW_MAX_CHARS)
        .collect()
}
