//! Chat session backed by a Telegram Desktop export.
//!
//! Reads the `result.json` produced by the desktop client's "export chat
//! history" together with its media folders, and serves it through the
//! [`ChatSession`] capability so the whole pipeline runs offline. Exports
//! carry no album grouping and no public handle; grouped resolution degrades
//! to singletons and links use the private `/c/` form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::types::{
    Attachment, ChatIdentifier, ChatMeta, MessageRecord, ReactionCount,
};
use crate::session::{ChatSession, MessageStream};

/// File name the desktop client gives the export manifest.
const EXPORT_MANIFEST: &str = "result.json";

/// Placeholder the exporter writes when media was excluded from the export.
const MEDIA_OMITTED_PREFIX: &str = "(";

/// Export media types that are streamed-video containers.
const STREAMING_VIDEO_TYPES: [&str; 2] = ["video_file", "video_message"];

/// A chat history loaded from a Telegram Desktop export.
pub struct ExportSession {
    chat: ChatMeta,
    raw_chat_id: i64,
    messages: Vec<MessageRecord>,
    /// Absolute media source per message id, for attachments the export
    /// actually includes.
    media_sources: HashMap<i64, PathBuf>,
}

impl ExportSession {
    /// Open an export from its folder or directly from `result.json`.
    pub fn open(path: &Path) -> Result<Self> {
        let manifest = if path.is_dir() {
            path.join(EXPORT_MANIFEST)
        } else {
            path.to_path_buf()
        };
        let root = manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let content = std::fs::read_to_string(&manifest).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Export(format!("export manifest not found: {}", manifest.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let export: ExportFile = serde_json::from_str(&content)?;

        let chat = ChatMeta {
            id: marked_chat_id(export.kind.as_deref(), export.id),
            title: export.name.clone(),
            username: None,
        };

        let mut messages = Vec::new();
        let mut media_sources = HashMap::new();
        for raw in export.messages {
            if raw.kind != "message" {
                continue;
            }
            let Some(date) = raw.date() else {
                tracing::debug!("Skipping export message {} without a date", raw.id);
                continue;
            };

            let (attachment, source) = raw.attachment();
            if let Some(source) = source {
                media_sources.insert(raw.id, root.join(source));
            }

            messages.push(MessageRecord {
                id: raw.id,
                date,
                text: raw.text.flatten(),
                reactions: raw
                    .reactions
                    .iter()
                    .map(|r| ReactionCount {
                        emoji: r.emoji.clone().unwrap_or_default(),
                        count: r.count,
                    })
                    .collect(),
                media_group_id: None,
                attachment,
            });
        }
        messages.sort_by_key(|m| m.id);

        tracing::info!(
            "Loaded export of {} ({} messages)",
            chat.display_name(),
            messages.len()
        );

        Ok(Self {
            chat,
            raw_chat_id: export.id,
            messages,
            media_sources,
        })
    }

    /// The chat this export contains.
    pub fn chat(&self) -> &ChatMeta {
        &self.chat
    }

    fn find(&self, id: i64) -> Option<&MessageRecord> {
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|index| &self.messages[index])
    }
}

#[async_trait]
impl ChatSession for ExportSession {
    async fn is_authorized(&self) -> Result<bool> {
        // An export on disk needs no credentials.
        Ok(true)
    }

    async fn resolve_chat(&self, identifier: &ChatIdentifier) -> Result<ChatMeta> {
        let matches = match identifier {
            ChatIdentifier::Id(id) => *id == self.chat.id || *id == self.raw_chat_id,
            ChatIdentifier::Username(name) => self
                .chat
                .title
                .as_deref()
                .map(|title| title.eq_ignore_ascii_case(name))
                .unwrap_or(false),
        };

        if matches {
            Ok(self.chat.clone())
        } else {
            Err(Error::ChatNotFound(format!(
                "{} (export contains {})",
                identifier,
                self.chat.display_name()
            )))
        }
    }

    fn iter_messages(&self, _chat: &ChatMeta, since: Option<DateTime<Utc>>) -> MessageStream<'_> {
        let items: Vec<Result<MessageRecord>> = self
            .messages
            .iter()
            .filter(|m| since.map(|cutoff| m.date >= cutoff).unwrap_or(true))
            .cloned()
            .map(Ok)
            .collect();
        Box::pin(stream::iter(items))
    }

    async fn fetch_messages(
        &self,
        _chat: &ChatMeta,
        ids: &[i64],
    ) -> Result<Vec<Option<MessageRecord>>> {
        Ok(ids.iter().map(|id| self.find(*id).cloned()).collect())
    }

    async fn download_media(
        &self,
        _chat: &ChatMeta,
        message: &MessageRecord,
        dest: &Path,
    ) -> Result<()> {
        let source = self.media_sources.get(&message.id).ok_or_else(|| {
            Error::Download(format!("message {} has no media in the export", message.id))
        })?;

        tokio::fs::copy(source, dest).await.map_err(|e| {
            Error::Download(format!(
                "copying {} failed: {}",
                source.display(),
                e
            ))
        })?;
        Ok(())
    }
}

/// Mark a raw export chat id the way the platform's internal ids are marked:
/// broadcast/supergroup ids get the `-100` prefix, basic groups a bare sign.
fn marked_chat_id(kind: Option<&str>, raw: i64) -> i64 {
    if raw <= 0 {
        return raw;
    }
    match kind {
        Some(kind) if kind.contains("channel") || kind.contains("supergroup") => {
            format!("-100{}", raw).parse().unwrap_or(raw)
        }
        Some(kind) if kind.contains("group") => -raw,
        _ => raw,
    }
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    id: i64,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    date: Option<String>,
    date_unixtime: Option<String>,
    #[serde(default)]
    text: ExportText,
    photo: Option<String>,
    photo_file_size: Option<u64>,
    file: Option<String>,
    file_name: Option<String>,
    file_size: Option<u64>,
    mime_type: Option<String>,
    media_type: Option<String>,
    #[serde(default)]
    reactions: Vec<ExportReaction>,
}

impl ExportMessage {
    fn date(&self) -> Option<DateTime<Utc>> {
        if let Some(unix) = &self.date_unixtime {
            if let Ok(secs) = unix.parse::<i64>() {
                return DateTime::from_timestamp(secs, 0);
            }
        }
        let naive = self.date.as_deref()?;
        NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }

    /// Map export media fields to an attachment plus its on-disk source.
    ///
    /// The exporter writes a parenthesized placeholder instead of a relative
    /// path when media was excluded; those count as attachments that cannot
    /// be downloaded from this export.
    fn attachment(&self) -> (Option<Attachment>, Option<&str>) {
        if let Some(photo) = self.photo.as_deref() {
            let attachment = Attachment::Photo {
                rendition_sizes: self.photo_file_size.into_iter().collect(),
            };
            return (Some(attachment), included_path(photo));
        }

        if let Some(file) = self.file.as_deref() {
            let is_streaming_video = self
                .media_type
                .as_deref()
                .map(|t| STREAMING_VIDEO_TYPES.contains(&t))
                .unwrap_or(false);
            let attachment = Attachment::Document {
                file_name: self.file_name.clone(),
                mime_type: self.mime_type.clone(),
                size: self.file_size,
                is_streaming_video,
            };
            return (Some(attachment), included_path(file));
        }

        (None, None)
    }
}

fn included_path(path: &str) -> Option<&str> {
    if path.starts_with(MEDIA_OMITTED_PREFIX) {
        None
    } else {
        Some(path)
    }
}

/// Message text is either a plain string or a list of entity runs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportText {
    Plain(String),
    Rich(Vec<ExportTextPiece>),
}

impl Default for ExportText {
    fn default() -> Self {
        ExportText::Plain(String::new())
    }
}

impl ExportText {
    fn flatten(&self) -> String {
        match self {
            ExportText::Plain(text) => text.clone(),
            ExportText::Rich(pieces) => pieces
                .iter()
                .map(|piece| match piece {
                    ExportTextPiece::Plain(text) => text.as_str(),
                    ExportTextPiece::Entity { text } => text.as_str(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportTextPiece {
    Plain(String),
    Entity { text: String },
}

#[derive(Debug, Deserialize)]
struct ExportReaction {
    count: u64,
    emoji: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Rust Chat",
        "type": "private_supergroup",
        "id": 1234567,
        "messages": [
            {
                "id": 1,
                "type": "message",
                "date": "2024-03-01T10:00:00",
                "date_unixtime": "1709287200",
                "text": "plain text",
                "reactions": [
                    {"type": "emoji", "count": 3, "emoji": "👍"},
                    {"type": "emoji", "count": 2, "emoji": "🔥"}
                ]
            },
            {
                "id": 2,
                "type": "service",
                "date": "2024-03-01T10:01:00",
                "date_unixtime": "1709287260",
                "text": ""
            },
            {
                "id": 3,
                "type": "message",
                "date": "2024-03-02T09:00:00",
                "date_unixtime": "1709370000",
                "text": ["mixed ", {"type": "bold", "text": "bold"}, " tail"],
                "photo": "photos/photo_3.jpg",
                "photo_file_size": 2048
            },
            {
                "id": 4,
                "type": "message",
                "date": "2024-03-02T09:05:00",
                "date_unixtime": "1709370300",
                "text": "",
                "file": "video_files/clip.mp4",
                "file_size": 4096,
                "mime_type": "video/mp4",
                "media_type": "video_file"
            },
            {
                "id": 5,
                "type": "message",
                "date": "2024-03-02T09:10:00",
                "date_unixtime": "1709370600",
                "text": "omitted",
                "file": "(File not included. Change data exporting settings to download.)",
                "mime_type": "video/mp4",
                "media_type": "video_file"
            }
        ]
    }"#;

    fn write_export(dir: &Path) -> PathBuf {
        let manifest = dir.join(EXPORT_MANIFEST);
        std::fs::write(&manifest, SAMPLE).unwrap();
        std::fs::create_dir_all(dir.join("photos")).unwrap();
        std::fs::write(dir.join("photos/photo_3.jpg"), b"jpeg-bytes").unwrap();
        manifest
    }

    #[test]
    fn test_open_parses_messages_and_marks_id() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let session = ExportSession::open(dir.path()).unwrap();

        assert_eq!(session.chat().id, -1001234567);
        assert_eq!(session.chat().title.as_deref(), Some("Rust Chat"));
        // The service message is dropped.
        assert_eq!(session.messages.len(), 4);
    }

    #[test]
    fn test_text_and_reaction_mapping() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let session = ExportSession::open(dir.path()).unwrap();

        let first = session.find(1).unwrap();
        assert_eq!(first.text, "plain text");
        assert_eq!(first.reaction_total(), 5);

        let rich = session.find(3).unwrap();
        assert_eq!(rich.text, "mixed bold tail");
        assert!(matches!(
            rich.attachment,
            Some(Attachment::Photo { ref rendition_sizes }) if rendition_sizes == &vec![2048]
        ));
    }

    #[test]
    fn test_streaming_video_and_omitted_media() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let session = ExportSession::open(dir.path()).unwrap();

        let video = session.find(4).unwrap();
        assert!(matches!(
            video.attachment,
            Some(Attachment::Document { is_streaming_video: true, .. })
        ));

        // Omitted media still reads as an attachment, but has no source file.
        let omitted = session.find(5).unwrap();
        assert!(omitted.has_media());
        assert!(!session.media_sources.contains_key(&5));
    }

    #[tokio::test]
    async fn test_resolve_chat_by_name_and_id() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let session = ExportSession::open(dir.path()).unwrap();

        assert!(session
            .resolve_chat(&ChatIdentifier::Username("rust chat".to_string()))
            .await
            .is_ok());
        assert!(session
            .resolve_chat(&ChatIdentifier::Id(-1001234567))
            .await
            .is_ok());
        assert!(session
            .resolve_chat(&ChatIdentifier::Id(1234567))
            .await
            .is_ok());
        assert!(matches!(
            session
                .resolve_chat(&ChatIdentifier::Username("other".to_string()))
                .await,
            Err(Error::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_download_media_copies_export_file() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let session = ExportSession::open(dir.path()).unwrap();

        let chat = session.chat().clone();
        let message = session.find(3).unwrap().clone();
        let dest = dir.path().join("3_1.jpg");
        session.download_media(&chat, &message, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg-bytes");

        let omitted = session.find(5).unwrap().clone();
        let dest = dir.path().join("5_1.mp4");
        assert!(session.download_media(&chat, &omitted, &dest).await.is_err());
    }

    #[test]
    fn test_marked_chat_id() {
        assert_eq!(marked_chat_id(Some("private_supergroup"), 1234567), -1001234567);
        assert_eq!(marked_chat_id(Some("public_channel"), 99), -10099);
        assert_eq!(marked_chat_id(Some("private_group"), 4321), -4321);
        assert_eq!(marked_chat_id(Some("personal_chat"), 777), 777);
        assert_eq!(marked_chat_id(None, 777), 777);
        assert_eq!(marked_chat_id(Some("private_supergroup"), -1001234567), -1001234567);
    }
}
