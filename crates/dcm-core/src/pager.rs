use crate::{
    domain::{ChannelId, FetchedMessage, MessageId},
    ports::ChatPort,
    Result,
};

/// Fixed history page size (the Discord API maximum).
pub const PAGE_SIZE: usize = 100;

/// Lazy, single-pass walk over one channel's history, newest to oldest.
///
/// Each page moves the cursor to the oldest message seen; an empty page ends
/// the sequence for good. Transport errors propagate immediately: no retry,
/// no skip-and-continue.
pub struct HistoryPager<'a, C: ChatPort + ?Sized> {
    chat: &'a C,
    channel: ChannelId,
    before: Option<MessageId>,
    done: bool,
}

impl<'a, C: ChatPort + ?Sized> HistoryPager<'a, C> {
    pub fn new(chat: &'a C, channel: ChannelId) -> Self {
        Self {
            chat,
            channel,
            before: None,
            done: false,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<FetchedMessage>>> {
        if self.done {
            return Ok(None);
        }

        let page = self
            .chat
            .history_before(&self.channel, PAGE_SIZE, self.before.as_ref())
            .await?;
        if page.is_empty() {
            self.done = true;
            return Ok(None);
        }

        // Pages arrive newest-first, so the last entry is the oldest.
        self.before = page.last().map(|m| m.id.clone());
        Ok(Some(page))
    }
}
