//! Domain types shared between the session boundary and the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host used when building message links.
pub const LINK_HOST: &str = "t.me";

/// How the caller names the chat to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIdentifier {
    /// Public handle, e.g. `rustlang`.
    Username(String),
    /// Internal numeric id, possibly negative/marked.
    Id(i64),
}

impl std::fmt::Display for ChatIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatIdentifier::Username(name) => write!(f, "{}", name),
            ChatIdentifier::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Resolved chat metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMeta {
    /// Internal numeric id. Broadcast/supergroup ids carry the `-100` marker.
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl ChatMeta {
    /// Human-readable name for logs, folder seeds, and summaries.
    pub fn display_name(&self) -> String {
        if let Some(title) = &self.title {
            title.clone()
        } else if let Some(username) = &self.username {
            username.clone()
        } else {
            self.id.to_string()
        }
    }

    /// Build the public link for one message in this chat.
    ///
    /// Public chats link through the handle; private chats use the `/c/` form
    /// with the `-100` broadcast marker (or a bare sign) stripped from the
    /// internal id. Deterministic: identical inputs yield identical strings.
    pub fn message_link(&self, message_id: i64) -> String {
        if let Some(username) = &self.username {
            return format!("https://{}/{}/{}", LINK_HOST, username, message_id);
        }

        let id = self.id.to_string();
        let internal = if let Some(stripped) = id.strip_prefix("-100") {
            stripped
        } else if let Some(stripped) = id.strip_prefix('-') {
            stripped
        } else {
            id.as_str()
        };

        format!("https://{}/c/{}/{}", LINK_HOST, internal, message_id)
    }
}

/// Count of one reaction kind on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: u64,
}

/// Media attached to a message, as reported by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A photo with the byte sizes of its available renditions.
    Photo { rendition_sizes: Vec<u64> },

    /// A document (file, video, animation, ...).
    Document {
        file_name: Option<String>,
        mime_type: Option<String>,
        size: Option<u64>,
        /// Set when the container is a streamed-video type (round videos,
        /// in-chat video files without a declared file name).
        is_streaming_video: bool,
    },
}

/// One message as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub text: String,
    pub reactions: Vec<ReactionCount>,
    /// Album identity; messages posted together share one value.
    pub media_group_id: Option<i64>,
    pub attachment: Option<Attachment>,
}

impl MessageRecord {
    /// Total reactions across all kinds.
    pub fn reaction_total(&self) -> u64 {
        self.reactions.iter().map(|r| r.count).sum()
    }

    /// Whether the message carries any attachment.
    pub fn has_media(&self) -> bool {
        self.attachment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: i64, username: Option<&str>) -> ChatMeta {
        ChatMeta {
            id,
            title: Some("Test Chat".to_string()),
            username: username.map(String::from),
        }
    }

    #[test]
    fn test_public_link_uses_handle() {
        let chat = chat(-1001234567, Some("somechat"));
        assert_eq!(chat.message_link(42), "https://t.me/somechat/42");
    }

    #[test]
    fn test_private_supergroup_link_strips_marker() {
        let chat = chat(-1001234567, None);
        assert_eq!(chat.message_link(42), "https://t.me/c/1234567/42");
    }

    #[test]
    fn test_private_group_link_strips_sign() {
        let chat = chat(-987654, None);
        assert_eq!(chat.message_link(7), "https://t.me/c/987654/7");
    }

    #[test]
    fn test_positive_id_link_unchanged() {
        let chat = chat(555, None);
        assert_eq!(chat.message_link(1), "https://t.me/c/555/1");
    }

    #[test]
    fn test_link_is_deterministic() {
        let chat = chat(-1009999, None);
        assert_eq!(chat.message_link(3), chat.message_link(3));
    }

    #[test]
    fn test_reaction_total_sums_kinds() {
        let msg = MessageRecord {
            id: 1,
            date: Utc::now(),
            text: String::new(),
            reactions: vec![
                ReactionCount {
                    emoji: "👍".to_string(),
                    count: 3,
                },
                ReactionCount {
                    emoji: "🔥".to_string(),
                    count: 2,
                },
            ],
            media_group_id: None,
            attachment: None,
        };
        assert_eq!(msg.reaction_total(), 5);
    }
}
