//! Discord REST wire types.
//!
//! Only the fields the mirror consumes are deserialized; everything else in
//! the API payload is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use dcm_core::{
    domain::{Attachment, ChannelId, FetchedMessage, MessageId},
    Error, Result,
};

/// A message object from a history page.
#[derive(Debug, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
    pub author: Author,
    #[serde(default)]
    pub pinned: bool,
    pub timestamp: String,
    #[serde(default)]
    pub attachments: Vec<WireAttachment>,
}

#[derive(Debug, Deserialize)]
pub struct Author {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct WireAttachment {
    pub filename: String,
    pub url: String,
}

/// The slice of a create-message response the mirror needs back.
#[derive(Debug, Deserialize)]
pub struct Created {
    pub id: String,
}

impl Message {
    /// Normalize into the core fetched form. The ISO-8601 timestamp becomes
    /// a UTC instant here; microsecond truncation happens at encode time.
    pub fn into_fetched(self) -> Result<FetchedMessage> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| Error::transport("discord timestamp parse", e))?
            .with_timezone(&Utc);

        Ok(FetchedMessage {
            id: MessageId(self.id),
            channel_id: ChannelId(self.channel_id),
            content: self.content,
            author: self.author.username,
            pinned: self.pinned,
            timestamp,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    filename: a.filename,
                    url: a.url,
                })
                .collect(),
        })
    }
}
