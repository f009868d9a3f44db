//! The media download batch: group resolution, classification, bounded
//! fan-out, and fan-in aggregation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::fs::naming::media_file_name;
use crate::fs::paths::write_oversized_manifest;
use crate::media::classify::classify;
use crate::media::group::{resolve_media_group, MediaGroup};
use crate::progress::ProgressPublisher;
use crate::session::{ChatMeta, ChatSession, MessageRecord};

/// Message ids fetched per batch request, to bound request size.
pub const FETCH_CHUNK_SIZE: usize = 100;

/// Hard cap on a single media file (250 MiB); larger items are recorded to
/// the sidecar manifest instead of downloaded.
pub const MAX_MEDIA_BYTES: u64 = 250 * 1024 * 1024;

/// Default width of the download worker pool.
pub const DEFAULT_CONCURRENT_DOWNLOADS: usize = 4;

/// One media item skipped for exceeding [`MAX_MEDIA_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedMedia {
    pub message_id: i64,
    pub link: String,
    pub size: u64,
}

/// Aggregated result of one media batch.
#[derive(Debug, Default)]
pub struct MediaBatchOutcome {
    /// Media items considered, including unsupported and oversized ones.
    pub total: u64,
    /// Files written.
    pub successes: u64,
    /// Items that produced no file: download errors, unsupported types, and
    /// oversized skips.
    pub failures: u64,
    /// Relative media paths per message id; every member of an album maps to
    /// the album's full path list.
    pub media_paths: HashMap<i64, Vec<String>>,
    /// Oversized items, ascending by message id.
    pub oversized: Vec<OversizedMedia>,
}

/// One unit of media work, produced by classification.
enum Planned {
    Download {
        member: MessageRecord,
        group_key: i64,
        position: usize,
        file_name: String,
    },
    SkipOversized {
        message_id: i64,
        size: u64,
    },
    SkipUnsupported {
        message_id: i64,
    },
}

/// How one planned item settled.
enum Settled {
    Downloaded {
        group_key: i64,
        position: usize,
        file_name: String,
    },
    Oversized {
        message_id: i64,
        size: u64,
    },
    Skipped,
    Failed,
}

/// Download media for the selected message ids into the run folder.
///
/// Selected messages are fetched in chunks, expanded to their media groups
/// (each group resolved once), classified, and the resulting work items run
/// through a bounded worker pool. Per-item failures are logged and counted,
/// never escalated; the only fatal errors here are filesystem ones. Progress
/// is published as one `MediaPhase` before the batch and a `MediaProgress`
/// per settled item, ending at `processed == total`.
pub async fn download_media_batch(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    message_ids: &[i64],
    run_dir: &Path,
    folder_name: &str,
    concurrency: usize,
    group_radius: i64,
    publisher: &ProgressPublisher,
) -> Result<MediaBatchOutcome> {
    let fetched = fetch_selected(session, chat, message_ids).await;
    let groups = resolve_groups(session, chat, &fetched, group_radius).await;
    let (planned, member_ids_by_group) = plan_items(&groups);

    let total = planned.len() as u64;
    publisher.media_phase(total);
    tracing::info!("Media phase: {} item(s) to process", total);

    // Bounded fan-out; every task yields a value and all accounting happens
    // at this single fan-in point.
    let mut settled_stream = stream::iter(planned.into_iter().map(|item| {
        let run_dir = run_dir.to_path_buf();
        async move {
            match item {
                Planned::Download {
                    member,
                    group_key,
                    position,
                    file_name,
                } => {
                    let dest = run_dir.join(&file_name);
                    match session.download_media(chat, &member, &dest).await {
                        Ok(()) => Settled::Downloaded {
                            group_key,
                            position,
                            file_name,
                        },
                        Err(e) => {
                            tracing::warn!(
                                "Downloading media for message {} failed: {}",
                                member.id,
                                e
                            );
                            Settled::Failed
                        }
                    }
                }
                Planned::SkipOversized { message_id, size } => {
                    tracing::info!(
                        "Skipping oversized media on message {} ({} bytes)",
                        message_id,
                        size
                    );
                    Settled::Oversized { message_id, size }
                }
                Planned::SkipUnsupported { message_id } => {
                    tracing::debug!("Unsupported media type on message {}", message_id);
                    Settled::Skipped
                }
            }
        }
    }))
    .buffer_unordered(concurrency.max(1));

    let mut processed = 0u64;
    let mut successes = 0u64;
    let mut failures = 0u64;
    let mut files_by_group: HashMap<i64, Vec<(usize, String)>> = HashMap::new();
    let mut oversized: Vec<OversizedMedia> = Vec::new();

    while let Some(settled) = settled_stream.next().await {
        processed += 1;
        match settled {
            Settled::Downloaded {
                group_key,
                position,
                file_name,
            } => {
                successes += 1;
                files_by_group
                    .entry(group_key)
                    .or_default()
                    .push((position, file_name));
            }
            Settled::Oversized { message_id, size } => {
                failures += 1;
                oversized.push(OversizedMedia {
                    message_id,
                    link: chat.message_link(message_id),
                    size,
                });
            }
            Settled::Skipped | Settled::Failed => {
                failures += 1;
            }
        }
        publisher.media_progress(processed, total);
    }

    // Every member of an album shares the album's full, ordered path list.
    let mut media_paths: HashMap<i64, Vec<String>> = HashMap::new();
    for (group_key, mut files) in files_by_group {
        files.sort_by_key(|(position, _)| *position);
        let paths: Vec<String> = files
            .into_iter()
            .map(|(_, file_name)| format!("{}/{}", folder_name, file_name))
            .collect();
        if let Some(member_ids) = member_ids_by_group.get(&group_key) {
            for id in member_ids {
                media_paths.insert(*id, paths.clone());
            }
        }
    }

    oversized.sort_by_key(|o| o.message_id);
    if !oversized.is_empty() {
        write_oversized_manifest(run_dir, &oversized).await?;
    }

    tracing::info!(
        "Media batch complete: {} downloaded, {} skipped or failed",
        successes,
        failures
    );

    Ok(MediaBatchOutcome {
        total,
        successes,
        failures,
        media_paths,
        oversized,
    })
}

/// Fetch the selected messages in bounded chunks.
///
/// A failed chunk is logged and dropped; batch retrieval failures never
/// abort the run.
async fn fetch_selected(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    message_ids: &[i64],
) -> Vec<MessageRecord> {
    let mut fetched: Vec<MessageRecord> = Vec::new();
    for chunk in message_ids.chunks(FETCH_CHUNK_SIZE) {
        match session.fetch_messages(chat, chunk).await {
            Ok(batch) => fetched.extend(batch.into_iter().flatten()),
            Err(e) => {
                tracing::warn!("Fetching a chunk of {} message(s) failed: {}", chunk.len(), e);
            }
        }
    }
    fetched.sort_by_key(|m| m.id);
    fetched.dedup_by_key(|m| m.id);
    fetched
}

/// Expand fetched messages into media groups, resolving each group once.
async fn resolve_groups(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    fetched: &[MessageRecord],
    group_radius: i64,
) -> Vec<MediaGroup> {
    let mut grouped_ids: HashSet<i64> = HashSet::new();
    let mut seen_group_keys: HashSet<i64> = HashSet::new();
    let mut groups: Vec<MediaGroup> = Vec::new();

    for message in fetched {
        if grouped_ids.contains(&message.id) {
            continue;
        }
        if let Some(group_id) = message.media_group_id {
            if !seen_group_keys.insert(group_id) {
                continue;
            }
        }

        let members = match resolve_media_group(session, chat, message, group_radius).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(
                    "Resolving the group of message {} failed: {}",
                    message.id,
                    e
                );
                if message.has_media() {
                    vec![message.clone()]
                } else {
                    Vec::new()
                }
            }
        };

        grouped_ids.insert(message.id);
        grouped_ids.extend(members.iter().map(|m| m.id));

        if !members.is_empty() {
            groups.push(MediaGroup {
                key: message.media_group_id.unwrap_or(message.id),
                members,
            });
        }
    }

    groups
}

/// Classify every group member into one planned work item.
fn plan_items(groups: &[MediaGroup]) -> (Vec<Planned>, HashMap<i64, Vec<i64>>) {
    let mut planned: Vec<Planned> = Vec::new();
    let mut member_ids_by_group: HashMap<i64, Vec<i64>> = HashMap::new();

    for group in groups {
        let base_id = group.base_id();
        member_ids_by_group.insert(group.key, group.members.iter().map(|m| m.id).collect());

        for (index, member) in group.members.iter().enumerate() {
            let Some(attachment) = &member.attachment else {
                continue;
            };
            let position = index + 1;

            match classify(attachment) {
                None => planned.push(Planned::SkipUnsupported {
                    message_id: member.id,
                }),
                Some(media) => {
                    if media.size.map(|size| size > MAX_MEDIA_BYTES).unwrap_or(false) {
                        planned.push(Planned::SkipOversized {
                            message_id: member.id,
                            size: media.size.unwrap_or(0),
                        });
                    } else {
                        planned.push(Planned::Download {
                            member: member.clone(),
                            group_key: group.key,
                            position,
                            file_name: media_file_name(base_id, position, &media.extension),
                        });
                    }
                }
            }
        }
    }

    (planned, member_ids_by_group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::paths::MANIFEST_FILE_NAME;
    use crate::progress::{self, ProgressEvent};
    use crate::session::{Attachment, MemorySession, ReactionCount};
    use chrono::{Duration, TimeZone, Utc};

    fn chat() -> ChatMeta {
        ChatMeta {
            id: -1002222,
            title: Some("Batch".to_string()),
            username: None,
        }
    }

    fn message(id: i64, group: Option<i64>, attachment: Option<Attachment>) -> MessageRecord {
        MessageRecord {
            id,
            date: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
            text: format!("message {}", id),
            reactions: vec![ReactionCount {
                emoji: "👍".to_string(),
                count: 2,
            }],
            media_group_id: group,
            attachment,
        }
    }

    fn photo() -> Option<Attachment> {
        Some(Attachment::Photo {
            rendition_sizes: vec![1024],
        })
    }

    fn session() -> MemorySession {
        MemorySession::new(
            chat(),
            vec![
                message(100, None, photo()),
                message(201, Some(9), photo()),
                message(202, Some(9), photo()),
                message(203, Some(9), photo()),
                message(
                    300,
                    None,
                    Some(Attachment::Document {
                        file_name: Some("notes.txt".to_string()),
                        mime_type: Some("text/plain".to_string()),
                        size: Some(64),
                        is_streaming_video: false,
                    }),
                ),
                message(
                    400,
                    None,
                    Some(Attachment::Document {
                        file_name: Some("movie.mp4".to_string()),
                        mime_type: Some("video/mp4".to_string()),
                        size: Some(300 * 1024 * 1024),
                        is_streaming_video: false,
                    }),
                ),
                message(500, None, photo()),
            ],
        )
        .fail_download(500)
    }

    async fn run_batch(
        session: &MemorySession,
        ids: &[i64],
    ) -> (MediaBatchOutcome, Vec<ProgressEvent>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (publisher, mut stream) = progress::channel();

        let outcome = download_media_batch(
            session,
            &chat(),
            ids,
            dir.path(),
            "Batch_20240401_000000",
            DEFAULT_CONCURRENT_DOWNLOADS,
            10,
            &publisher,
        )
        .await
        .unwrap();
        drop(publisher);

        let mut events = Vec::new();
        while let Some(event) = stream.try_next() {
            events.push(event);
        }
        (outcome, events, dir)
    }

    #[tokio::test]
    async fn test_counts_add_up_and_progress_is_complete() {
        let session = session();
        let ids = [100, 201, 202, 203, 300, 400, 500];
        let (outcome, events, _dir) = run_batch(&session, &ids).await;

        // 7 media items: 5 photos, one unsupported document, one oversized.
        assert_eq!(outcome.total, 7);
        assert_eq!(outcome.successes, 4);
        assert_eq!(outcome.failures, 3);
        assert_eq!(outcome.successes + outcome.failures, outcome.total);

        assert_eq!(events[0], ProgressEvent::MediaPhase { total_media: 7 });
        let processed: Vec<u64> = events[1..]
            .iter()
            .map(|e| match e {
                ProgressEvent::MediaProgress {
                    processed_count, ..
                } => *processed_count,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(processed, (1..=7).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_album_files_and_shared_paths() {
        let session = session();
        let (outcome, _events, dir) = run_batch(&session, &[201, 202, 203]).await;

        assert_eq!(outcome.successes, 3);
        let expected: Vec<String> = vec![
            "Batch_20240401_000000/201_1.jpg".to_string(),
            "Batch_20240401_000000/201_2.jpg".to_string(),
            "Batch_20240401_000000/201_3.jpg".to_string(),
        ];
        for id in [201, 202, 203] {
            assert_eq!(outcome.media_paths.get(&id), Some(&expected));
        }
        for name in ["201_1.jpg", "201_2.jpg", "201_3.jpg"] {
            assert!(dir.path().join(name).is_file());
        }
    }

    #[tokio::test]
    async fn test_group_expansion_from_single_selected_member() {
        let session = session();
        let (outcome, _events, _dir) = run_batch(&session, &[202]).await;

        // Selecting one album member processes the whole album.
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.successes, 3);
        assert!(outcome.media_paths.contains_key(&201));
        assert!(outcome.media_paths.contains_key(&203));
    }

    #[tokio::test]
    async fn test_oversized_goes_to_manifest_not_disk() {
        let session = session();
        let (outcome, _events, dir) = run_batch(&session, &[400]).await;

        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.successes, 0);
        assert_eq!(outcome.failures, 1);
        assert!(outcome.media_paths.is_empty());
        assert_eq!(outcome.oversized.len(), 1);
        assert_eq!(outcome.oversized[0].message_id, 400);

        let manifest = dir.path().join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(manifest).unwrap();
        assert!(content.contains("Message ID: 400"));
        assert!(content.contains(&format!("Size: {} bytes", 300 * 1024 * 1024)));
        assert!(!dir.path().join("400_1.mp4").exists());
    }

    #[tokio::test]
    async fn test_download_failure_is_isolated() {
        let session = session();
        let (outcome, _events, _dir) = run_batch(&session, &[100, 500]).await;

        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.successes, 1);
        assert_eq!(outcome.failures, 1);
        assert!(outcome.media_paths.contains_key(&100));
        assert!(!outcome.media_paths.contains_key(&500));
    }

    #[tokio::test]
    async fn test_no_manifest_without_oversized_items() {
        let session = session();
        let (_outcome, _events, dir) = run_batch(&session, &[100]).await;
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_missing_messages_are_ignored() {
        let session = session();
        let (outcome, _events, _dir) = run_batch(&session, &[100, 999]).await;
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.successes, 1);
    }
}
