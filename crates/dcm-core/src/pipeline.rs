use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    attachments::AttachmentRelay,
    domain::{ChannelId, FetchedMessage, StoredMessage},
    pager::HistoryPager,
    ports::{ChatPort, OrderedStore},
    Result,
};

/// Ingest every source channel, then replay the merged timeline.
///
/// The two phases are strictly sequential: replay never starts on a
/// partially ingested store.
pub async fn run<C, S>(
    chat: &C,
    store: &S,
    relay: &AttachmentRelay,
    from: &[ChannelId],
    to: &ChannelId,
    cancel: CancellationToken,
) -> Result<()>
where
    C: ChatPort + ?Sized,
    S: OrderedStore + ?Sized,
{
    let stored = ingest(chat, store, from).await?;
    info!(messages = stored, channels = from.len(), "ingest complete");

    let sent = replay(chat, store, relay, to, &cancel).await?;
    info!(messages = sent, "replay complete");

    Ok(())
}

/// Walk each source channel backward and commit every page as one durable
/// batch. Keys are global rather than scoped per channel, so per-channel
/// batches interleave into the final order on their own.
pub async fn ingest<C, S>(chat: &C, store: &S, from: &[ChannelId]) -> Result<u64>
where
    C: ChatPort + ?Sized,
    S: OrderedStore + ?Sized,
{
    let mut total = 0u64;
    for channel in from {
        let mut pager = HistoryPager::new(chat, channel.clone());
        let mut count = 0u64;
        while let Some(page) = pager.next_page().await? {
            count += page.len() as u64;
            write_page(store, page)?;
        }
        debug!(%channel, messages = count, "channel ingested");
        total += count;
    }
    Ok(total)
}

/// Encode one fetched page and commit it atomically.
fn write_page<S: OrderedStore + ?Sized>(store: &S, page: Vec<FetchedMessage>) -> Result<()> {
    let mut entries = Vec::with_capacity(page.len());
    for raw in page {
        let record = StoredMessage::from_fetched(raw);
        let key = record.sort_key();
        let value = serde_json::to_vec(&record)?;
        entries.push((key, value));
    }
    store.write_batch(entries)
}

/// Scan the store front to back and re-emit every record to the destination.
///
/// Cancellation stops further iteration; messages already sent stay sent,
/// there is no compensating action.
pub async fn replay<C, S>(
    chat: &C,
    store: &S,
    relay: &AttachmentRelay,
    to: &ChannelId,
    cancel: &CancellationToken,
) -> Result<u64>
where
    C: ChatPort + ?Sized,
    S: OrderedStore + ?Sized,
{
    let mut sent = 0u64;
    for entry in store.scan()? {
        if cancel.is_cancelled() {
            info!(messages = sent, "replay cancelled");
            break;
        }

        let (_key, value) = entry?;
        let record: StoredMessage = serde_json::from_slice(&value)?;
        send_stored(chat, relay, to, record).await?;
        sent += 1;
    }
    Ok(sent)
}

/// Re-emit one record: post, pin if the source was pinned, then forward each
/// attachment in its original order through a transient local file.
async fn send_stored<C: ChatPort + ?Sized>(
    chat: &C,
    relay: &AttachmentRelay,
    to: &ChannelId,
    record: StoredMessage,
) -> Result<()> {
    let posted = chat
        .send_text(to, &format!("{}: {}", record.author, record.content))
        .await?;

    if record.pinned {
        chat.pin(&posted).await?;
    }

    for attachment in &record.attachments {
        // The guard deletes the local copy whether or not the upload lands.
        let staged = relay.fetch(&attachment.url).await?;
        chat.send_file(to, &attachment.filename, staged.path())
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::domain::{MessageId, MessageRef};
    use crate::errors::Error;

    /// Ordered in-memory stand-in for the RocksDB adapter.
    #[derive(Default)]
    struct MemStore {
        map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    }

    impl OrderedStore for MemStore {
        fn write_batch(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
            let mut map = self.map.lock().unwrap();
            for (key, value) in entries {
                map.insert(key, value);
            }
            Ok(())
        }

        fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + '_>> {
            let snapshot: Vec<_> = self
                .map
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Box::new(snapshot.into_iter().map(Ok)))
        }
    }

    /// Scripted source channels plus a recording destination.
    #[derive(Default)]
    struct FakeChat {
        pages: Mutex<HashMap<String, VecDeque<Vec<FetchedMessage>>>>,
        fail_on_fetch: Option<usize>,
        fetches: AtomicUsize,
        sent: Mutex<Vec<String>>,
        pinned: Mutex<Vec<String>>,
        next_id: AtomicUsize,
    }

    impl FakeChat {
        fn with_pages(channels: Vec<(&str, Vec<Vec<FetchedMessage>>)>) -> Self {
            let pages = channels
                .into_iter()
                .map(|(ch, pages)| (ch.to_string(), pages.into_iter().collect()))
                .collect();
            Self {
                pages: Mutex::new(pages),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPort for FakeChat {
        async fn history_before(
            &self,
            channel: &ChannelId,
            _limit: usize,
            _before: Option<&MessageId>,
        ) -> Result<Vec<FetchedMessage>> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_fetch == Some(call) {
                return Err(Error::transport("discord history fetch", "injected"));
            }
            Ok(self
                .pages
                .lock()
                .unwrap()
                .get_mut(&channel.0)
                .and_then(|pages| pages.pop_front())
                .unwrap_or_default())
        }

        async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(text.to_string());
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(MessageRef {
                channel_id: channel.clone(),
                message_id: MessageId(format!("dst-{id}")),
            })
        }

        async fn pin(&self, msg: &MessageRef) -> Result<()> {
            self.pinned.lock().unwrap().push(msg.message_id.0.clone());
            Ok(())
        }

        async fn send_file(
            &self,
            channel: &ChannelId,
            _filename: &str,
            _path: &Path,
        ) -> Result<MessageRef> {
            self.send_text(channel, "[file]").await
        }
    }

    fn msg(channel: &str, author: &str, ts: i64) -> FetchedMessage {
        FetchedMessage {
            id: MessageId(ts.to_string()),
            channel_id: ChannelId(channel.to_string()),
            content: format!("t{ts}"),
            author: author.to_string(),
            pinned: false,
            timestamp: DateTime::from_timestamp_micros(ts).unwrap(),
            attachments: Vec::new(),
        }
    }

    fn relay() -> AttachmentRelay {
        AttachmentRelay::new(Duration::from_secs(1)).unwrap()
    }

    fn channels(ids: &[&str]) -> Vec<ChannelId> {
        ids.iter().map(|id| ChannelId(id.to_string())).collect()
    }

    #[tokio::test]
    async fn replay_merges_channels_in_timestamp_order() {
        // Pages are newest-first, and channel b is ingested before a; the
        // key order alone must produce the merged timeline.
        let chat = FakeChat::with_pages(vec![
            (
                "a",
                vec![vec![msg("a", "alice", 50), msg("a", "alice", 30), msg("a", "alice", 10)]],
            ),
            ("b", vec![vec![msg("b", "bob", 40), msg("b", "bob", 20)]]),
        ]);
        let store = MemStore::default();

        run(
            &chat,
            &store,
            &relay(),
            &channels(&["b", "a"]),
            &ChannelId("dst".to_string()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            chat.sent(),
            vec![
                "alice: t10".to_string(),
                "bob: t20".to_string(),
                "alice: t30".to_string(),
                "bob: t40".to_string(),
                "alice: t50".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn pinned_records_pin_their_destination_message_exactly_once() {
        let mut pinned = msg("a", "alice", 20);
        pinned.pinned = true;
        let chat = FakeChat::with_pages(vec![(
            "a",
            vec![vec![pinned, msg("a", "alice", 10)]],
        )]);
        let store = MemStore::default();

        run(
            &chat,
            &store,
            &relay(),
            &channels(&["a"]),
            &ChannelId("dst".to_string()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(chat.sent().len(), 2);
        // The pinned record replays second, onto destination message dst-1.
        assert_eq!(*chat.pinned.lock().unwrap(), vec!["dst-1".to_string()]);
    }

    #[tokio::test]
    async fn a_failing_fetch_aborts_ingest_before_any_replay() {
        let chat = FakeChat {
            fail_on_fetch: Some(3),
            ..FakeChat::with_pages(vec![(
                "a",
                vec![
                    (101..=200).rev().map(|ts| msg("a", "alice", ts)).collect(),
                    (1..=100).rev().map(|ts| msg("a", "alice", ts)).collect(),
                ],
            )])
        };
        let store = MemStore::default();

        let result = run(
            &chat,
            &store,
            &relay(),
            &channels(&["a"]),
            &ChannelId("dst".to_string()),
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::Transport { .. })));
        assert!(chat.sent().is_empty());
        // The committed prefix stays in the store; the run still failed.
        assert_eq!(store.map.lock().unwrap().len(), 200);
    }

    #[tokio::test]
    async fn a_cancelled_token_stops_replay_without_sending() {
        let chat = FakeChat::with_pages(vec![("a", vec![vec![msg("a", "alice", 10)]])]);
        let store = MemStore::default();
        ingest(&chat, &store, &channels(&["a"])).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let sent = replay(&chat, &store, &relay(), &ChannelId("dst".to_string()), &cancel)
            .await
            .unwrap();

        assert_eq!(sent, 0);
        assert!(chat.sent().is_empty());
    }

    #[tokio::test]
    async fn a_corrupt_record_fails_replay_as_decode_error() {
        let chat = FakeChat::default();
        let store = MemStore::default();
        store
            .write_batch(vec![(b"000_k".to_vec(), b"not json".to_vec())])
            .unwrap();

        let result = replay(
            &chat,
            &store,
            &relay(),
            &ChannelId("dst".to_string()),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
