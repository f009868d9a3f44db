//! Media group (album) resolution.
//!
//! The remote platform has no direct "list album members" query, so grouped
//! messages are found by fetching a symmetric window of message ids around
//! the starting message and keeping the ones that share its group identity.
//! Albums wider than the window resolve partially; that is a known
//! limitation of the heuristic.

use crate::error::Result;
use crate::session::{ChatMeta, ChatSession, MessageRecord};

/// Default half-width of the id window searched around a grouped message.
pub const GROUP_SEARCH_RADIUS: i64 = 10;

/// One resolved album: members sorted ascending by id, each carrying media.
#[derive(Debug, Clone)]
pub struct MediaGroup {
    /// The shared group id, or the lone member's message id for singletons.
    pub key: i64,
    pub members: Vec<MessageRecord>,
}

impl MediaGroup {
    /// Smallest member id; file names for the album derive from it.
    pub fn base_id(&self) -> i64 {
        self.members.first().map(|m| m.id).unwrap_or(self.key)
    }
}

/// Resolve the full group for one message.
///
/// Ungrouped messages are their own singleton group when they carry media,
/// and resolve to nothing otherwise.
pub async fn resolve_media_group(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    message: &MessageRecord,
    radius: i64,
) -> Result<Vec<MessageRecord>> {
    match message.media_group_id {
        None => {
            if message.has_media() {
                Ok(vec![message.clone()])
            } else {
                Ok(Vec::new())
            }
        }
        Some(group_id) => resolve_group_members(session, chat, message.id, group_id, radius).await,
    }
}

/// Resolve the members of a known group around `message_id`.
///
/// Keeps fetched messages that exist, share `group_id`, and carry media,
/// sorted ascending by id. If the starting message falls out of the window
/// result (a boundary artifact of ranged fetches), it is re-fetched
/// individually and appended when it genuinely belongs to the group.
pub async fn resolve_group_members(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    message_id: i64,
    group_id: i64,
    radius: i64,
) -> Result<Vec<MessageRecord>> {
    let ids: Vec<i64> = (message_id - radius..=message_id + radius)
        .filter(|id| *id > 0)
        .collect();

    let fetched = session.fetch_messages(chat, &ids).await?;
    let mut members: Vec<MessageRecord> = fetched
        .into_iter()
        .flatten()
        .filter(|m| m.media_group_id == Some(group_id) && m.has_media())
        .collect();
    members.sort_by_key(|m| m.id);

    if !members.iter().any(|m| m.id == message_id) {
        if let Some(Some(original)) = session
            .fetch_messages(chat, &[message_id])
            .await?
            .into_iter()
            .next()
        {
            if original.media_group_id == Some(group_id) && original.has_media() {
                members.push(original);
                members.sort_by_key(|m| m.id);
            }
        }
    }

    tracing::debug!(
        "Resolved group {} around message {}: {} member(s)",
        group_id,
        message_id,
        members.len()
    );

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Attachment, MemorySession, ReactionCount};
    use chrono::{TimeZone, Utc};

    fn chat() -> ChatMeta {
        ChatMeta {
            id: -1001234,
            title: Some("Albums".to_string()),
            username: None,
        }
    }

    fn message(id: i64, group: Option<i64>, media: bool) -> MessageRecord {
        MessageRecord {
            id,
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(id),
            text: format!("message {}", id),
            reactions: vec![ReactionCount {
                emoji: "👍".to_string(),
                count: 1,
            }],
            media_group_id: group,
            attachment: media.then(|| Attachment::Photo {
                rendition_sizes: vec![512],
            }),
        }
    }

    fn session() -> MemorySession {
        MemorySession::new(
            chat(),
            vec![
                message(8, None, true),
                message(10, Some(5), true),
                message(11, Some(5), false),
                message(12, Some(5), true),
                message(13, Some(5), true),
                message(40, Some(6), true),
            ],
        )
    }

    #[tokio::test]
    async fn test_singleton_with_media() {
        let session = session();
        let msg = message(8, None, true);
        let members = resolve_media_group(&session, &chat(), &msg, GROUP_SEARCH_RADIUS)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, 8);
    }

    #[tokio::test]
    async fn test_singleton_without_media_is_empty() {
        let session = session();
        let msg = message(9, None, false);
        let members = resolve_media_group(&session, &chat(), &msg, GROUP_SEARCH_RADIUS)
            .await
            .unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_grouped_members_sorted_and_filtered() {
        let session = session();
        let msg = message(12, Some(5), true);
        let members = resolve_media_group(&session, &chat(), &msg, GROUP_SEARCH_RADIUS)
            .await
            .unwrap();
        // 11 shares the group but carries no media; 40 is another group.
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 12, 13]);
    }

    #[tokio::test]
    async fn test_boundary_refetch_restores_original() {
        let session = session().hide_from_batch(12);
        let members = resolve_group_members(&session, &chat(), 12, 5, GROUP_SEARCH_RADIUS)
            .await
            .unwrap();
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 12, 13]);
    }

    #[tokio::test]
    async fn test_window_clips_at_history_start() {
        let session = MemorySession::new(chat(), vec![message(1, Some(3), true), message(2, Some(3), true)]);
        let members = resolve_group_members(&session, &chat(), 1, 3, GROUP_SEARCH_RADIUS)
            .await
            .unwrap();
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_base_id_is_smallest_member() {
        let group = MediaGroup {
            key: 5,
            members: vec![message(10, Some(5), true), message(12, Some(5), true)],
        };
        assert_eq!(group.base_id(), 10);
    }
}
