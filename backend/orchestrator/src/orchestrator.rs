//! Upload orchestration: dedup check, batching, hosting selection and the
//! upload/record/reply step that completes a batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use photodrop_core::{
    AuditSink, ConversationId, Hosting, ImageIdentity, Messenger, PhotoDelivered, Reply,
    UploadError, UploadRecord, Uploader,
};
use photodrop_hosting::HostingRegistry;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::batch::{BatchAssembler, PendingItem, DEFAULT_ALBUM_DELAY};
use crate::dedup::{DedupCache, DUPLICATE_INTERVAL_SECS};
use crate::messages;
use crate::session::{SessionState, TokenResolution, SELECTION_TOKEN_TTL_SECS};

/// Timing knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub album_delay: Duration,
    pub duplicate_interval: chrono::Duration,
    pub selection_token_ttl: chrono::Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            album_delay: DEFAULT_ALBUM_DELAY,
            duplicate_interval: chrono::Duration::seconds(DUPLICATE_INTERVAL_SECS),
            selection_token_ttl: chrono::Duration::seconds(SELECTION_TOKEN_TTL_SECS),
        }
    }
}

/// Result of uploading one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub identity: ImageIdentity,
    pub result: Result<String, UploadError>,
}

/// What happened to an inbound photo.
#[derive(Debug)]
pub enum PhotoOutcome {
    /// Uploaded recently; not buffered.
    Duplicate,
    /// Buffered; the user was asked to choose a hosting.
    AwaitingHosting,
    /// Buffered into an album whose completion is already scheduled.
    Accumulating,
    /// First album item: completion runs after the album delay.
    Scheduled(JoinHandle<()>),
    /// Standalone photo, uploaded right away.
    Completed(Vec<UploadOutcome>),
}

/// What a hosting button press led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// Hosting stored; nothing was waiting for it.
    Selected(Hosting),
    /// Hosting stored and the batch that was waiting for it uploaded.
    Uploaded {
        hosting: Hosting,
        outcomes: Vec<UploadOutcome>,
    },
    /// Token unknown, reused or expired. The hosting is unchanged; `token` is a fresh unbound one.
    Reprompted { token: String },
}

impl ChoiceOutcome {
    /// Text the pressed message should be turned into.
    pub fn reply(&self) -> Reply {
        match self {
            Self::Selected(hosting) | Self::Uploaded { hosting, .. } => {
                messages::selection_confirmed(*hosting)
            }
            Self::Reprompted { token } => messages::token_expired(token),
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    hostings: Arc<HostingRegistry>,
    dedup: Arc<DedupCache>,
    batches: BatchAssembler,
    sessions: Arc<SessionState>,
    audit: Arc<dyn AuditSink>,
    messenger: Arc<dyn Messenger>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        hostings: HostingRegistry,
        audit: Arc<dyn AuditSink>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            hostings: Arc::new(hostings),
            dedup: Arc::new(DedupCache::new(config.duplicate_interval)),
            batches: BatchAssembler::new(config.album_delay),
            sessions: Arc::new(SessionState::new(config.selection_token_ttl)),
            audit,
            messenger,
        }
    }

    pub fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    /// Dedup check on its own, so a transport can skip downloading a duplicate.
    /// Sends the duplicate warning and returns true when `identity` is blocked.
    pub async fn reject_duplicate(
        &self,
        conversation: ConversationId,
        identity: &ImageIdentity,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.dedup.would_block(identity, now).await {
            return false;
        }
        info!(%conversation, %identity, "Duplicate photo blocked");
        self.send(conversation, messages::duplicate_warning()).await;
        true
    }

    /// Entry point for every inbound photo.
    pub async fn handle_photo(&self, event: PhotoDelivered) -> PhotoOutcome {
        let now = event.received_at;
        let conversation = event.conversation;

        if self.reject_duplicate(conversation, &event.identity, now).await {
            return PhotoOutcome::Duplicate;
        }
        self.release_expired(now).await;

        let key = event.batch_key();
        let position = self
            .batches
            .enqueue(key.clone(), event.identity.clone(), event.bytes.clone())
            .await;
        debug!(batch = %key, position, "Photo buffered");

        let Some(hosting) = self.sessions.selected_hosting(conversation).await else {
            let token = self
                .sessions
                .create_selection_token(Some(key), now)
                .await;
            self.send(conversation, messages::hosting_prompt(&token)).await;
            return PhotoOutcome::AwaitingHosting;
        };

        if key.is_album() {
            if position > 1 {
                return PhotoOutcome::Accumulating;
            }
            let this = self.clone();
            let user = event.user.clone();
            let handle = self.batches.schedule_completion(key, move |items| async move {
                this.complete_batch(conversation, hosting, items, &user, now)
                    .await;
            });
            return PhotoOutcome::Scheduled(handle);
        }

        let items = self.batches.drain(&key).await;
        let outcomes = self
            .complete_batch(conversation, hosting, items, &event.user, now)
            .await;
        PhotoOutcome::Completed(outcomes)
    }

    /// Handle a hosting button press carrying `token`.
    pub async fn resolve_choice(
        &self,
        conversation: ConversationId,
        hosting: Hosting,
        token: &str,
        user: &Uploader,
        now: DateTime<Utc>,
    ) -> ChoiceOutcome {
        self.release_expired(now).await;
        let key = match self.sessions.resolve_token(token, now).await {
            TokenResolution::Unknown => {
                info!(%conversation, "Stale hosting choice, asking again");
                let token = self.sessions.create_selection_token(None, now).await;
                return ChoiceOutcome::Reprompted { token };
            }
            TokenResolution::Unbound => {
                self.sessions.set_selected_hosting(conversation, hosting).await;
                return ChoiceOutcome::Selected(hosting);
            }
            TokenResolution::Pending(key) => key,
        };

        self.sessions.set_selected_hosting(conversation, hosting).await;
        let items = self.batches.drain(&key).await;
        if items.is_empty() {
            debug!(batch = %key, "Batch already drained by an earlier choice");
            return ChoiceOutcome::Selected(hosting);
        }
        let outcomes = self
            .complete_batch(key.conversation, hosting, items, user, now)
            .await;
        ChoiceOutcome::Uploaded { hosting, outcomes }
    }

    /// Hosting menu with a fresh pre-selection token.
    pub async fn open_hosting_menu(&self, now: DateTime<Utc>) -> Reply {
        self.release_expired(now).await;
        let token = self.sessions.create_selection_token(None, now).await;
        messages::hosting_menu(&token)
    }

    /// Expire old selection tokens and drop the batches only they could complete.
    async fn release_expired(&self, now: DateTime<Utc>) {
        let orphaned = self.sessions.prune_expired(now).await;
        if orphaned.is_empty() {
            return;
        }
        let released = self.batches.discard(&orphaned).await;
        info!(batches = orphaned.len(), items = released, "Dropped batches whose hosting prompt expired");
    }

    /// Upload every drained item, record the successes and reply once.
    async fn complete_batch(
        &self,
        conversation: ConversationId,
        hosting: Hosting,
        items: Vec<PendingItem>,
        user: &Uploader,
        now: DateTime<Utc>,
    ) -> Vec<UploadOutcome> {
        if items.is_empty() {
            return Vec::new();
        }

        let outcomes = match self.hostings.get(hosting) {
            Some(adapter) => {
                let uploads = items.into_iter().map(|item| {
                    let adapter = Arc::clone(&adapter);
                    async move {
                        let file_name = item.identity.file_name();
                        let result = adapter.upload(item.bytes, &file_name).await;
                        UploadOutcome {
                            identity: item.identity,
                            result,
                        }
                    }
                });
                join_all(uploads).await
            }
            None => {
                error!(%hosting, "No adapter registered for the selected hosting");
                items
                    .into_iter()
                    .map(|item| UploadOutcome {
                        identity: item.identity,
                        result: Err(UploadError::Unavailable(hosting)),
                    })
                    .collect()
            }
        };

        for outcome in &outcomes {
            match &outcome.result {
                Ok(url) => {
                    self.dedup.record(&outcome.identity, now).await;
                    let record = UploadRecord {
                        timestamp: now,
                        user_id: user.id,
                        username: user.username.clone(),
                        identity: outcome.identity.clone(),
                        url: url.clone(),
                        hosting,
                    };
                    if let Err(e) = self.audit.append_record(&record).await {
                        error!(identity = %outcome.identity, error = %e, "Failed to append upload record");
                    }
                }
                Err(err) if err.is_parse_failure() => {
                    warn!(%hosting, identity = %outcome.identity, error = %err, "Unrecognized hosting response");
                }
                Err(err) => {
                    warn!(%hosting, identity = %outcome.identity, error = %err, "Upload failed");
                }
            }
        }

        let uploaded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(%conversation, %hosting, uploaded, total = outcomes.len(), "Batch complete");

        self.send(conversation, messages::upload_results(hosting, &outcomes))
            .await;
        outcomes
    }

    async fn send(&self, conversation: ConversationId, reply: Reply) {
        if let Err(e) = self.messenger.send(conversation, reply).await {
            error!(%conversation, error = %e, "Failed to deliver reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::TimeZone;
    use photodrop_core::CallbackAction;
    use photodrop_hosting::MockHosting;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(ConversationId, Reply)>>,
    }

    impl RecordingMessenger {
        async fn texts(&self) -> Vec<String> {
            self.sent.lock().await.iter().map(|(_, r)| r.text.clone()).collect()
        }

        async fn last(&self) -> Reply {
            self.sent.lock().await.last().cloned().unwrap().1
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(&self, conversation: ConversationId, reply: Reply) -> anyhow::Result<()> {
            self.sent.lock().await.push((conversation, reply));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryAudit {
        records: Mutex<Vec<UploadRecord>>,
        broken: bool,
    }

    #[async_trait]
    impl AuditSink for MemoryAudit {
        async fn append_record(&self, record: &UploadRecord) -> anyhow::Result<()> {
            if self.broken {
                bail!("disk full");
            }
            self.records.lock().await.push(record.clone());
            Ok(())
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        messenger: Arc<RecordingMessenger>,
        audit: Arc<MemoryAudit>,
    }

    fn harness_with(registry: HostingRegistry, audit: MemoryAudit) -> Harness {
        let messenger = Arc::new(RecordingMessenger::default());
        let audit = Arc::new(audit);
        let config = OrchestratorConfig {
            album_delay: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(config, registry, audit.clone(), messenger.clone());
        Harness {
            orchestrator,
            messenger,
            audit,
        }
    }

    fn harness(anoimage: MockHosting) -> Harness {
        let registry = HostingRegistry::new()
            .with(Arc::new(anoimage))
            .with(Arc::new(MockHosting::new(Hosting::Ninjabox)));
        harness_with(registry, MemoryAudit::default())
    }

    const CHAT: ConversationId = ConversationId(100);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn user() -> Uploader {
        Uploader {
            id: 42,
            username: Some("alice".into()),
        }
    }

    fn photo(id: &str, group: Option<&str>, at: DateTime<Utc>) -> PhotoDelivered {
        PhotoDelivered {
            conversation: CHAT,
            group_id: group.map(str::to_string),
            identity: ImageIdentity::new(id),
            bytes: Bytes::from(format!("jpeg:{id}")),
            user: user(),
            received_at: at,
        }
    }

    fn prompt_token(reply: &Reply) -> String {
        reply
            .actions()
            .find_map(|a| match a {
                CallbackAction::ChooseHosting { token, .. } => Some(token.clone()),
                _ => None,
            })
            .unwrap()
    }

    fn urls(outcomes: &[UploadOutcome]) -> Vec<Result<String, UploadError>> {
        outcomes.iter().map(|o| o.result.clone()).collect()
    }

    #[tokio::test]
    async fn first_photo_prompts_then_choice_uploads() {
        let h = harness(MockHosting::new(Hosting::Anoimage));

        let outcome = h.orchestrator.handle_photo(photo("P1", None, t0())).await;
        assert!(matches!(outcome, PhotoOutcome::AwaitingHosting));
        let token = prompt_token(&h.messenger.last().await);

        let choice = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &token, &user(), t0())
            .await;
        let ChoiceOutcome::Uploaded { hosting, outcomes } = choice else {
            panic!("expected upload, got {choice:?}");
        };
        assert_eq!(hosting, Hosting::Anoimage);
        assert_eq!(urls(&outcomes), vec![Ok("https://anoimage.example/P1".to_string())]);

        assert_eq!(
            h.messenger.last().await.text,
            "✅ <b>Your link on Anoimage:</b> https://anoimage.example/P1"
        );
        let records = h.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity.as_str(), "P1");
        assert_eq!(records[0].hosting, Hosting::Anoimage);
        assert_eq!(records[0].username.as_deref(), Some("alice"));
        assert_eq!(
            h.orchestrator.sessions().selected_hosting(CHAT).await,
            Some(Hosting::Anoimage)
        );
    }

    #[tokio::test]
    async fn standalone_photo_completes_without_waiting() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let outcome = h.orchestrator.handle_photo(photo("P1", None, t0())).await;
        let PhotoOutcome::Completed(outcomes) = outcome else {
            panic!("expected synchronous completion");
        };
        assert_eq!(outcomes.len(), 1);
        assert_eq!(h.audit.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_is_blocked_inside_window_only() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;
        h.orchestrator.handle_photo(photo("P1", None, t0())).await;

        let again = t0() + chrono::Duration::minutes(5);
        assert!(matches!(
            h.orchestrator.handle_photo(photo("P1", None, again)).await,
            PhotoOutcome::Duplicate
        ));
        assert!(h.messenger.last().await.text.contains("already uploaded"));

        let later = t0() + chrono::Duration::minutes(11);
        assert!(matches!(
            h.orchestrator.handle_photo(photo("P1", None, later)).await,
            PhotoOutcome::Completed(_)
        ));
        assert_eq!(h.audit.records.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_upload_is_retryable() {
        let h = harness(MockHosting::new(Hosting::Anoimage).fail_on("P1.jpg", UploadError::Timeout));
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let PhotoOutcome::Completed(outcomes) =
            h.orchestrator.handle_photo(photo("P1", None, t0())).await
        else {
            panic!("expected completion");
        };
        assert_eq!(urls(&outcomes), vec![Err(UploadError::Timeout)]);
        assert!(h.messenger.last().await.text.contains("failed"));
        assert!(!h.orchestrator.dedup().would_block(&ImageIdentity::new("P1"), t0()).await);
        assert!(h.audit.records.lock().await.is_empty());

        // Retrying straight away is not treated as a duplicate.
        assert!(matches!(
            h.orchestrator.handle_photo(photo("P1", None, t0())).await,
            PhotoOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn album_results_keep_arrival_order() {
        let mock = MockHosting::new(Hosting::Anoimage)
            .delay_on("p1.jpg", Duration::from_millis(40))
            .delay_on("p3.jpg", Duration::from_millis(20));
        let h = harness(mock);
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let first = h.orchestrator.handle_photo(photo("p1", Some("g"), t0())).await;
        let PhotoOutcome::Scheduled(handle) = first else {
            panic!("first album item must schedule completion");
        };
        for id in ["p2", "p3"] {
            assert!(matches!(
                h.orchestrator.handle_photo(photo(id, Some("g"), t0())).await,
                PhotoOutcome::Accumulating
            ));
        }
        handle.await.unwrap();

        let reply = h.messenger.last().await;
        let lines: Vec<_> = reply.text.lines().skip(1).collect();
        assert_eq!(
            lines,
            vec![
                "1: https://anoimage.example/p1",
                "2: https://anoimage.example/p2",
                "3: https://anoimage.example/p3",
            ]
        );
        let recorded: Vec<_> = h
            .audit
            .records
            .lock()
            .await
            .iter()
            .map(|r| r.identity.to_string())
            .collect();
        assert_eq!(recorded, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn late_album_sibling_forms_its_own_batch() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let PhotoOutcome::Scheduled(handle) =
            h.orchestrator.handle_photo(photo("p1", Some("g"), t0())).await
        else {
            panic!("expected scheduled completion");
        };
        handle.await.unwrap();

        let PhotoOutcome::Scheduled(handle) =
            h.orchestrator.handle_photo(photo("p2", Some("g"), t0())).await
        else {
            panic!("late sibling must start a new batch");
        };
        handle.await.unwrap();
        assert_eq!(h.messenger.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_reports_both_lines() {
        let h = harness(
            MockHosting::new(Hosting::Anoimage)
                .fail_on("p2.jpg", UploadError::parse("no digit-only key", "{}")),
        );
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let PhotoOutcome::Scheduled(handle) =
            h.orchestrator.handle_photo(photo("p1", Some("g"), t0())).await
        else {
            panic!("expected scheduled completion");
        };
        h.orchestrator.handle_photo(photo("p2", Some("g"), t0())).await;
        handle.await.unwrap();

        let text = h.messenger.last().await.text;
        assert!(text.contains("1: https://anoimage.example/p1"));
        assert!(text.contains("2: ❌ Error: unrecognized response"));

        let dedup = h.orchestrator.dedup();
        assert!(dedup.would_block(&ImageIdentity::new("p1"), t0()).await);
        assert!(!dedup.would_block(&ImageIdentity::new("p2"), t0()).await);
        assert_eq!(h.audit.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn token_resolves_once() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.handle_photo(photo("P1", None, t0())).await;
        let token = prompt_token(&h.messenger.last().await);

        let first = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &token, &user(), t0())
            .await;
        assert!(matches!(first, ChoiceOutcome::Uploaded { .. }));

        let second = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Ninjabox, &token, &user(), t0())
            .await;
        let ChoiceOutcome::Reprompted { token: fresh } = &second else {
            panic!("reused token must re-prompt, got {second:?}");
        };
        assert_ne!(fresh, &token);
        assert!(second.reply().text.contains("no longer valid"));
        // The stale press changed nothing.
        assert_eq!(
            h.orchestrator.sessions().selected_hosting(CHAT).await,
            Some(Hosting::Anoimage)
        );
        assert_eq!(h.audit.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn expired_token_reprompts() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.handle_photo(photo("P1", None, t0())).await;
        let token = prompt_token(&h.messenger.last().await);

        let late = t0() + chrono::Duration::hours(2);
        let outcome = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &token, &user(), late)
            .await;
        assert!(matches!(outcome, ChoiceOutcome::Reprompted { .. }));
        assert_eq!(h.orchestrator.sessions().selected_hosting(CHAT).await, None);
    }

    #[tokio::test]
    async fn resend_after_menu_choice_uploads_once() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.handle_photo(photo("P1", None, t0())).await;
        let stale_prompt = prompt_token(&h.messenger.last().await);

        let menu = h.orchestrator.open_hosting_menu(t0()).await;
        let choice = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &prompt_token(&menu), &user(), t0())
            .await;
        assert_eq!(choice, ChoiceOutcome::Selected(Hosting::Anoimage));

        let PhotoOutcome::Completed(outcomes) =
            h.orchestrator.handle_photo(photo("P1", None, t0())).await
        else {
            panic!("expected completion");
        };
        assert_eq!(urls(&outcomes), vec![Ok("https://anoimage.example/P1".to_string())]);
        assert_eq!(
            h.messenger.last().await.text,
            "✅ <b>Your link on Anoimage:</b> https://anoimage.example/P1"
        );
        assert_eq!(h.audit.records.lock().await.len(), 1);

        // The first prompt has nothing left to upload.
        assert_eq!(
            h.orchestrator
                .resolve_choice(CHAT, Hosting::Anoimage, &stale_prompt, &user(), t0())
                .await,
            ChoiceOutcome::Selected(Hosting::Anoimage)
        );
        assert_eq!(h.audit.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn expired_prompt_releases_buffered_photo() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        let event = photo("P9", None, t0());
        let key = event.batch_key();
        h.orchestrator.handle_photo(event).await;
        let token = prompt_token(&h.messenger.last().await);
        assert_eq!(h.orchestrator.batches.pending_len(&key).await, 1);

        let late = t0() + chrono::Duration::hours(2);
        let ChoiceOutcome::Reprompted { token: fresh } = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &token, &user(), late)
            .await
        else {
            panic!("expired token must re-prompt");
        };
        assert_eq!(h.orchestrator.batches.pending_len(&key).await, 0);

        let outcome = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &fresh, &user(), late)
            .await;
        assert_eq!(outcome, ChoiceOutcome::Selected(Hosting::Anoimage));
        assert!(h.audit.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unanswered_prompt_is_released_on_next_activity() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        let event = photo("P1", None, t0());
        let key = event.batch_key();
        h.orchestrator.handle_photo(event).await;

        h.orchestrator
            .open_hosting_menu(t0() + chrono::Duration::hours(2))
            .await;
        assert_eq!(h.orchestrator.batches.pending_len(&key).await, 0);
    }

    #[tokio::test]
    async fn duplicate_screen_runs_without_bytes() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        let identity = ImageIdentity::new("P1");
        assert!(!h.orchestrator.reject_duplicate(CHAT, &identity, t0()).await);
        assert!(h.messenger.sent.lock().await.is_empty());

        h.orchestrator.dedup().record(&identity, t0()).await;
        let soon = t0() + chrono::Duration::minutes(1);
        assert!(h.orchestrator.reject_duplicate(CHAT, &identity, soon).await);
        assert!(h.messenger.last().await.text.contains("already uploaded"));
    }

    #[tokio::test]
    async fn preselection_only_stores_hosting() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        let menu = h.orchestrator.open_hosting_menu(t0()).await;
        let token = prompt_token(&menu);

        let outcome = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Ninjabox, &token, &user(), t0())
            .await;
        assert_eq!(outcome, ChoiceOutcome::Selected(Hosting::Ninjabox));
        assert!(outcome.reply().text.starts_with("Selected Ninjabox"));
        assert!(h.messenger.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn audit_failure_still_reports_url() {
        let registry = HostingRegistry::new().with(Arc::new(MockHosting::new(Hosting::Anoimage)));
        let h = harness_with(
            registry,
            MemoryAudit {
                broken: true,
                ..MemoryAudit::default()
            },
        );
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Anoimage).await;

        let PhotoOutcome::Completed(outcomes) =
            h.orchestrator.handle_photo(photo("P1", None, t0())).await
        else {
            panic!("expected completion");
        };
        assert!(outcomes[0].result.is_ok());
        assert!(h.messenger.last().await.text.contains("https://anoimage.example/P1"));
        assert!(h.orchestrator.dedup().would_block(&ImageIdentity::new("P1"), t0()).await);
    }

    #[tokio::test]
    async fn unregistered_hosting_fails_per_item() {
        let registry = HostingRegistry::new().with(Arc::new(MockHosting::new(Hosting::Anoimage)));
        let h = harness_with(registry, MemoryAudit::default());
        h.orchestrator.sessions().set_selected_hosting(CHAT, Hosting::Ninjabox).await;

        let PhotoOutcome::Completed(outcomes) =
            h.orchestrator.handle_photo(photo("P1", None, t0())).await
        else {
            panic!("expected completion");
        };
        assert_eq!(urls(&outcomes), vec![Err(UploadError::Unavailable(Hosting::Ninjabox))]);
    }

    #[tokio::test]
    async fn every_unselected_delivery_is_prompted() {
        let h = harness(MockHosting::new(Hosting::Anoimage));
        h.orchestrator.handle_photo(photo("p1", Some("g"), t0())).await;
        h.orchestrator.handle_photo(photo("p2", Some("g"), t0())).await;

        let texts = h.messenger.texts().await;
        assert_eq!(texts.len(), 2);
        let sent = h.messenger.sent.lock().await;
        let first = prompt_token(&sent[0].1);
        let second = prompt_token(&sent[1].1);
        drop(sent);

        // Either token drains the whole album; the other finds nothing left.
        let outcome = h
            .orchestrator
            .resolve_choice(CHAT, Hosting::Anoimage, &second, &user(), t0())
            .await;
        let ChoiceOutcome::Uploaded { outcomes, .. } = outcome else {
            panic!("expected upload");
        };
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            h.orchestrator
                .resolve_choice(CHAT, Hosting::Anoimage, &first, &user(), t0())
                .await,
            ChoiceOutcome::Selected(Hosting::Anoimage)
        );
    }
}
