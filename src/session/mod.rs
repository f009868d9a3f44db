//! The remote-chat session boundary.
//!
//! The pipeline never talks to a chat platform directly; everything it needs
//! is the [`ChatSession`] capability: resolve a chat, iterate its history,
//! fetch specific messages by id, and download one message's media. An
//! authenticated live session is implemented downstream against this trait;
//! this crate ships [`ExportSession`] (Telegram Desktop chat exports, used by
//! the CLI) and [`MemorySession`] (in-memory fixture used by the tests).

pub mod export;
pub mod memory;
pub mod types;

pub use export::ExportSession;
pub use memory::MemorySession;
pub use types::{
    Attachment, ChatIdentifier, ChatMeta, MessageRecord, ReactionCount, LINK_HOST,
};

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::Result;

/// Chronological stream of history messages.
pub type MessageStream<'a> = BoxStream<'a, Result<MessageRecord>>;

/// Capability handle for one authenticated chat session.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Whether the session is authenticated and usable.
    async fn is_authorized(&self) -> Result<bool>;

    /// Resolve a chat identifier to its metadata.
    async fn resolve_chat(&self, identifier: &ChatIdentifier) -> Result<ChatMeta>;

    /// Iterate message history oldest-first, starting at `since` when set.
    fn iter_messages(&self, chat: &ChatMeta, since: Option<DateTime<Utc>>) -> MessageStream<'_>;

    /// Fetch specific messages by id. The result aligns one-to-one with
    /// `ids`; positions for messages that do not exist hold `None`.
    async fn fetch_messages(
        &self,
        chat: &ChatMeta,
        ids: &[i64],
    ) -> Result<Vec<Option<MessageRecord>>>;

    /// Download the message's attachment to `dest`.
    async fn download_media(
        &self,
        chat: &ChatMeta,
        message: &MessageRecord,
        dest: &Path,
    ) -> Result<()>;
}
