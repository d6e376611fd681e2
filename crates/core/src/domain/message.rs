use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message as delivered by the platform adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub text: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub is_from_bot: bool,
}

impl ChannelMessage {
    pub fn new(
        text: impl Into<String>,
        author_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { text: text.into(), author_name: author_name.into(), created_at, is_from_bot: false }
    }

    pub fn from_bot(mut self) -> Self {
        self.is_from_bot = true;
        self
    }
}
