//! Recently-uploaded image cache.
//!
//! An identity uploaded less than `interval` ago blocks new buffering of the
//! same identity. Only confirmed successes are recorded.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use photodrop_core::ImageIdentity;
use tokio::sync::Mutex;
use tracing::debug;

/// Default dedup window (10 minutes).
pub const DUPLICATE_INTERVAL_SECS: i64 = 600;

/// Prune once the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

/// Entries older than this many intervals are dropped on prune.
const PRUNE_AFTER_INTERVALS: i32 = 6;

pub struct DedupCache {
    interval: Duration,
    entries: Mutex<HashMap<ImageIdentity, DateTime<Utc>>>,
}

impl DedupCache {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// True if `identity` was recorded within the window ending at `now`. Never mutates.
    pub async fn would_block(&self, identity: &ImageIdentity, now: DateTime<Utc>) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(identity)
            .is_some_and(|last| now.signed_duration_since(*last) < self.interval)
    }

    /// Set (or overwrite) the last successful upload time of `identity`.
    pub async fn record(&self, identity: &ImageIdentity, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        entries.insert(identity.clone(), now);

        if entries.len() > PRUNE_THRESHOLD {
            let horizon = self.interval * PRUNE_AFTER_INTERVALS;
            let before = entries.len();
            entries.retain(|_, last| now.signed_duration_since(*last) < horizon);
            debug!(pruned = before - entries.len(), "Pruned stale dedup entries");
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DUPLICATE_INTERVAL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn blocks_inside_window_only() {
        let cache = DedupCache::default();
        let id = ImageIdentity::new("p1");
        cache.record(&id, t0()).await;

        assert!(cache.would_block(&id, t0() + Duration::minutes(9)).await);
        assert!(!cache.would_block(&id, t0() + Duration::minutes(10)).await);
        assert!(!cache.would_block(&id, t0() + Duration::minutes(11)).await);
    }

    #[tokio::test]
    async fn unknown_identity_passes() {
        let cache = DedupCache::default();
        assert!(!cache.would_block(&ImageIdentity::new("never"), t0()).await);
    }

    #[tokio::test]
    async fn record_overwrites_timestamp() {
        let cache = DedupCache::default();
        let id = ImageIdentity::new("p1");
        cache.record(&id, t0()).await;
        cache.record(&id, t0() + Duration::minutes(8)).await;
        assert!(cache.would_block(&id, t0() + Duration::minutes(15)).await);
    }

    #[tokio::test]
    async fn check_does_not_mutate() {
        let cache = DedupCache::default();
        let id = ImageIdentity::new("p1");
        assert!(!cache.would_block(&id, t0()).await);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn prunes_long_stale_entries() {
        let cache = DedupCache::new(Duration::seconds(1));
        for i in 0..PRUNE_THRESHOLD {
            cache.record(&ImageIdentity::new(format!("old-{i}")), t0()).await;
        }
        cache
            .record(&ImageIdentity::new("fresh"), t0() + Duration::hours(1))
            .await;
        assert_eq!(cache.len().await, 1);
    }
}
