//! Chat platform access beyond the event stream. Bulk scans read channel
//! history and auto teams read voice channel membership; `??dp` is the only
//! writer.

use async_trait::async_trait;
use thiserror::Error;

use trivia_core::domain::message::ChannelMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel `{0}` was not found")]
    NotFound(String),
    #[error("channel read failed: {0}")]
    Read(String),
}

#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// Newest-first history of `channel_id`, at most `limit` messages.
    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<ChannelMessage>, ChannelError>;
}

#[async_trait]
pub trait VoiceRoster: Send + Sync {
    /// Display names of everyone currently connected to `channel_id`.
    async fn member_names(&self, channel_id: &str) -> Result<Vec<String>, ChannelError>;
}

#[async_trait]
pub trait ChannelPurge: Send + Sync {
    /// Deletes up to `limit` of the newest messages in `channel_id` and
    /// returns how many were removed.
    async fn delete_recent(&self, channel_id: &str, limit: u32) -> Result<u32, ChannelError>;
}

#[derive(Default)]
pub struct NoopChannelHistory;

#[async_trait]
impl ChannelHistory for NoopChannelHistory {
    async fn recent_messages(
        &self,
        _channel_id: &str,
        _limit: u32,
    ) -> Result<Vec<ChannelMessage>, ChannelError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct NoopVoiceRoster;

#[async_trait]
impl VoiceRoster for NoopVoiceRoster {
    async fn member_names(&self, _channel_id: &str) -> Result<Vec<String>, ChannelError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct NoopChannelPurge;

#[async_trait]
impl ChannelPurge for NoopChannelPurge {
    async fn delete_recent(&self, _channel_id: &str, _limit: u32) -> Result<u32, ChannelError> {
        Ok(0)
    }
}
