//! In-memory chat session used by the test suite.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;

use crate::error::{Error, Result};
use crate::session::types::{ChatIdentifier, ChatMeta, MessageRecord};
use crate::session::{ChatSession, MessageStream};

/// A fixed chat history with injectable failure points.
///
/// Messages are held in chronological order. The failure knobs mirror the
/// situations the pipeline must tolerate: an unauthorized session, an error
/// mid-iteration, ids a windowed batch fetch misses, and downloads that fail.
pub struct MemorySession {
    chat: ChatMeta,
    messages: Vec<MessageRecord>,
    authorized: bool,
    media_payload: Vec<u8>,
    fail_download_ids: HashSet<i64>,
    batch_hidden_ids: HashSet<i64>,
    fail_iteration_at: Option<usize>,
}

impl MemorySession {
    pub fn new(chat: ChatMeta, mut messages: Vec<MessageRecord>) -> Self {
        messages.sort_by_key(|m| m.id);
        Self {
            chat,
            messages,
            authorized: true,
            media_payload: b"media".to_vec(),
            fail_download_ids: HashSet::new(),
            batch_hidden_ids: HashSet::new(),
            fail_iteration_at: None,
        }
    }

    /// Report the session as not authenticated.
    pub fn unauthorized(mut self) -> Self {
        self.authorized = false;
        self
    }

    /// Fail the history iterator after yielding `count` messages.
    pub fn fail_iteration_after(mut self, count: usize) -> Self {
        self.fail_iteration_at = Some(count);
        self
    }

    /// Make multi-id fetches miss this id (single-id fetches still find it).
    pub fn hide_from_batch(mut self, id: i64) -> Self {
        self.batch_hidden_ids.insert(id);
        self
    }

    /// Fail media downloads for this message id.
    pub fn fail_download(mut self, id: i64) -> Self {
        self.fail_download_ids.insert(id);
        self
    }

    fn find(&self, id: i64) -> Option<&MessageRecord> {
        self.messages.iter().find(|m| m.id == id)
    }
}

#[async_trait]
impl ChatSession for MemorySession {
    async fn is_authorized(&self) -> Result<bool> {
        Ok(self.authorized)
    }

    async fn resolve_chat(&self, identifier: &ChatIdentifier) -> Result<ChatMeta> {
        let matches = match identifier {
            ChatIdentifier::Id(id) => *id == self.chat.id,
            ChatIdentifier::Username(name) => {
                self.chat.username.as_deref() == Some(name.as_str())
            }
        };

        if matches {
            Ok(self.chat.clone())
        } else {
            Err(Error::ChatNotFound(identifier.to_string()))
        }
    }

    fn iter_messages(&self, _chat: &ChatMeta, since: Option<DateTime<Utc>>) -> MessageStream<'_> {
        let mut items: Vec<Result<MessageRecord>> = self
            .messages
            .iter()
            .filter(|m| since.map(|cutoff| m.date >= cutoff).unwrap_or(true))
            .cloned()
            .map(Ok)
            .collect();

        if let Some(at) = self.fail_iteration_at {
            items.truncate(at);
            items.push(Err(Error::Session("history iteration failed".to_string())));
        }

        Box::pin(stream::iter(items))
    }

    async fn fetch_messages(
        &self,
        _chat: &ChatMeta,
        ids: &[i64],
    ) -> Result<Vec<Option<MessageRecord>>> {
        let windowed = ids.len() > 1;
        Ok(ids
            .iter()
            .map(|id| {
                if windowed && self.batch_hidden_ids.contains(id) {
                    None
                } else {
                    self.find(*id).cloned()
                }
            })
            .collect())
    }

    async fn download_media(
        &self,
        _chat: &ChatMeta,
        message: &MessageRecord,
        dest: &Path,
    ) -> Result<()> {
        if self.fail_download_ids.contains(&message.id) {
            return Err(Error::Download(format!(
                "simulated failure for message {}",
                message.id
            )));
        }

        tokio::fs::write(dest, &self.media_payload).await?;
        Ok(())
    }
}
