//! RocksDB adapter for the ordered message store.
//!
//! The store is transient working state: it exists for one run, is filled
//! during ingest, scanned once during replay, and its directory is removed
//! when the handle drops, on success and failure alike. Durability on each
//! batch only matters within a run; nothing is ever resumed from it.

use std::path::{Path, PathBuf};

use rocksdb::{IteratorMode, Options, WriteBatch, WriteOptions, DB};

use dcm_core::{ports::OrderedStore, Error, Result};

pub struct MessageStore {
    // `None` only transiently inside `drop`, so the DB closes before the
    // directory is unlinked.
    db: Option<DB>,
    path: PathBuf,
}

impl MessageStore {
    /// Open the store at `path`, creating it if missing.
    ///
    /// Single-threaded mode: this process is the only writer and the only
    /// reader for the store's whole lifetime.
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(16);

        let db = DB::open(&opts, path).map_err(|e| Error::storage("store open", e))?;
        Ok(Self {
            db: Some(db),
            path: path.to_path_buf(),
        })
    }

    fn db(&self) -> &DB {
        self.db.as_ref().expect("db open for the guard's lifetime")
    }
}

impl OrderedStore for MessageStore {
    /// Commit `entries` as one batch, fsynced before returning.
    fn write_batch(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for (key, value) in entries {
            batch.put(key, value);
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db()
            .write_opt(batch, &write_opts)
            .map_err(|e| Error::storage("store commit", e))
    }

    fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + '_>> {
        let iter = self.db().iterator(IteratorMode::Start).map(|entry| {
            entry
                .map(|(key, value)| (key.to_vec(), value.to_vec()))
                .map_err(|e| Error::storage("store iterate", e))
        });
        Ok(Box::new(iter))
    }
}

impl Drop for MessageStore {
    fn drop(&mut self) {
        // Close, then unlink unconditionally: a run never leaves resumable
        // state behind.
        self.db.take();
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
