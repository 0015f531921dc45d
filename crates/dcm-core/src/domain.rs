use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discord channel id (snowflake, kept as a string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

/// Discord message id (snowflake, kept as a string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stable reference to a message the destination platform created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// One attached file as received; order within a message is preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// A message as fetched from a source channel, before encoding.
///
/// `author` is the display name resolved at fetch time; the source account
/// may later rename, and the stored record must not follow it.
#[derive(Clone, Debug)]
pub struct FetchedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: String,
    pub author: String,
    pub pinned: bool,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

/// The canonical persisted record. Written once, read once, never updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub author: String,
    pub pinned: bool,
    pub timestamp: i64,
    pub attachments: Vec<Attachment>,
}

impl StoredMessage {
    /// Normalize a fetched message; the timestamp drops to microseconds.
    pub fn from_fetched(msg: FetchedMessage) -> Self {
        Self {
            id: msg.id.0,
            channel_id: msg.channel_id.0,
            content: msg.content,
            author: msg.author,
            pinned: msg.pinned,
            timestamp: msg.timestamp.timestamp_micros(),
            attachments: msg.attachments,
        }
    }

    pub fn sort_key(&self) -> Vec<u8> {
        sort_key(self.timestamp, &self.id)
    }
}

/// Byte key placing every record from every channel on one timeline.
///
/// The timestamp is zero-padded to a fixed width so lexicographic byte order
/// equals numeric order, and the id breaks ties. Comparing two keys must
/// agree with comparing `(timestamp, id)` as a tuple; that is what merges
/// independently fetched channels without an explicit merge step.
/// Timestamps are microseconds since the epoch and never negative.
pub fn sort_key(timestamp: i64, id: &str) -> Vec<u8> {
    debug_assert!(timestamp >= 0);
    format!("{timestamp:020}_{id}").into_bytes()
}
