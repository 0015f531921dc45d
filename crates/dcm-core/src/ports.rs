use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChannelId, FetchedMessage, MessageId, MessageRef},
    Result,
};

/// Capabilities the pipeline needs from the chat platform.
///
/// Discord REST is the only implementation; the shape keeps transport
/// details (auth, endpoints, wire format) out of the pipeline. Every call is
/// fallible with a transport error and nothing is retried here.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// One page of up to `limit` messages strictly older than `before`,
    /// newest first. `None` fetches the most recent page.
    async fn history_before(
        &self,
        channel: &ChannelId,
        limit: usize,
        before: Option<&MessageId>,
    ) -> Result<Vec<FetchedMessage>>;

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<MessageRef>;

    async fn pin(&self, msg: &MessageRef) -> Result<()>;

    async fn send_file(
        &self,
        channel: &ChannelId,
        filename: &str,
        path: &Path,
    ) -> Result<MessageRef>;
}

/// Embedded ordered key-value engine.
///
/// Keys iterate in ascending byte order. `write_batch` is atomic and flushed
/// to disk before it returns, so a crash after a page commit cannot lose
/// that page.
pub trait OrderedStore: Send + Sync {
    fn write_batch(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()>;

    /// Consistent point-in-time forward scan over the full key range.
    fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + '_>>;
}
