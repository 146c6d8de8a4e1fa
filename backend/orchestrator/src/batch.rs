//! Batch assembler: buffers deliveries per [`BatchKey`] until the batch completes.
//!
//! Per-key lifecycle: absent -> accumulating -> draining -> absent. A standalone
//! photo is drained by its own delivery; an album is drained by a completion
//! task that the first item schedules. Siblings that arrive after that task has
//! drained the key start a new batch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use photodrop_core::{BatchKey, ImageIdentity};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default wait for album siblings before a batch completes.
pub const DEFAULT_ALBUM_DELAY: Duration = Duration::from_secs(1);

/// One buffered image.
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub identity: ImageIdentity,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct BatchAssembler {
    pending: Arc<Mutex<HashMap<BatchKey, Vec<PendingItem>>>>,
    album_delay: Duration,
}

impl BatchAssembler {
    pub fn new(album_delay: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            album_delay,
        }
    }

    /// Append an item; returns its 1-based position within the batch.
    ///
    /// A standalone key holds at most one item: a re-delivery of the same photo
    /// replaces the copy still waiting for a hosting choice.
    pub async fn enqueue(&self, key: BatchKey, identity: ImageIdentity, bytes: Bytes) -> usize {
        let mut pending = self.pending.lock().await;
        let album = key.is_album();
        let items = pending.entry(key).or_default();
        if !album && !items.is_empty() {
            debug!(%identity, "Replacing buffered copy of a standalone photo");
            items.clear();
        }
        items.push(PendingItem { identity, bytes });
        items.len()
    }

    /// Drop everything buffered under `keys`; returns how many items were released.
    pub async fn discard(&self, keys: &[BatchKey]) -> usize {
        let mut pending = self.pending.lock().await;
        keys.iter()
            .filter_map(|key| pending.remove(key))
            .map(|items| items.len())
            .sum()
    }

    /// Remove and return everything buffered under `key`, in arrival order.
    /// Unknown (or already drained) keys yield an empty batch.
    pub async fn drain(&self, key: &BatchKey) -> Vec<PendingItem> {
        self.pending.lock().await.remove(key).unwrap_or_default()
    }

    pub async fn pending_len(&self, key: &BatchKey) -> usize {
        self.pending.lock().await.get(key).map_or(0, Vec::len)
    }

    /// After the album delay, drain `key` and hand the items to `on_complete`.
    ///
    /// Runs to completion once spawned. If the key was drained by someone else in
    /// the meantime, `on_complete` is not called.
    pub fn schedule_completion<F, Fut>(&self, key: BatchKey, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Vec<PendingItem>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let assembler = self.clone();
        debug!(batch = %key, delay_ms = self.album_delay.as_millis() as u64, "Album completion scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(assembler.album_delay).await;
            let items = assembler.drain(&key).await;
            if items.is_empty() {
                debug!(batch = %key, "Album already drained before its timer fired");
                return;
            }
            debug!(batch = %key, items = items.len(), "Album batch complete");
            on_complete(items).await;
        })
    }
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_ALBUM_DELAY)
    }
}
