//! Per-conversation hosting choice and the selection tokens that tie a
//! button press back to a pending batch.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use photodrop_core::{BatchKey, ConversationId, Hosting};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Default lifetime of an unresolved selection token (1 hour).
pub const SELECTION_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct TokenEntry {
    batch: Option<BatchKey>,
    issued_at: DateTime<Utc>,
}

/// What a selection token turned out to refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResolution {
    /// Bound to a batch that was waiting for a hosting choice.
    Pending(BatchKey),
    /// Pre-selection: the user picked a hosting before sending anything.
    Unbound,
    /// Never issued, already consumed, or expired.
    Unknown,
}

pub struct SessionState {
    selected: RwLock<HashMap<ConversationId, Hosting>>,
    tokens: Mutex<HashMap<String, TokenEntry>>,
    token_ttl: Duration,
}

impl SessionState {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            selected: RwLock::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            token_ttl,
        }
    }

    pub async fn selected_hosting(&self, conversation: ConversationId) -> Option<Hosting> {
        self.selected.read().await.get(&conversation).copied()
    }

    pub async fn set_selected_hosting(&self, conversation: ConversationId, hosting: Hosting) {
        self.selected.write().await.insert(conversation, hosting);
        debug!(%conversation, %hosting, "Hosting selected");
    }

    /// Issue a fresh token, optionally bound to a pending batch.
    pub async fn create_selection_token(
        &self,
        batch: Option<BatchKey>,
        now: DateTime<Utc>,
    ) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.lock().await.insert(
            token.clone(),
            TokenEntry {
                batch,
                issued_at: now,
            },
        );
        token
    }

    /// Consume `token`. A token resolves at most once.
    pub async fn resolve_token(&self, token: &str, now: DateTime<Utc>) -> TokenResolution {
        let Some(entry) = self.tokens.lock().await.remove(token) else {
            return TokenResolution::Unknown;
        };
        if now.signed_duration_since(entry.issued_at) >= self.token_ttl {
            debug!("Selection token expired");
            return TokenResolution::Unknown;
        }
        match entry.batch {
            Some(key) => TokenResolution::Pending(key),
            None => TokenResolution::Unbound,
        }
    }

    /// Forget expired tokens. Returns the batch keys no live token points to
    /// any more; nothing can complete those batches.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Vec<BatchKey> {
        let mut tokens = self.tokens.lock().await;
        let ttl = self.token_ttl;
        let mut expired = Vec::new();
        tokens.retain(|_, entry| {
            let live = now.signed_duration_since(entry.issued_at) < ttl;
            if !live {
                expired.extend(entry.batch.clone());
            }
            live
        });

        let mut orphaned: Vec<BatchKey> = Vec::new();
        for key in expired {
            let still_bound = tokens.values().any(|e| e.batch.as_ref() == Some(&key));
            if !still_bound && !orphaned.contains(&key) {
                orphaned.push(key);
            }
        }
        orphaned
    }

    pub async fn outstanding_tokens(&self) -> usize {
        self.tokens.lock().await.len()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Duration::seconds(SELECTION_TOKEN_TTL_SECS))
    }
}
