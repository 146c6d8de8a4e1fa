use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Chat the photo arrived in (Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, transport-assigned identifier of one delivered image.
///
/// Used as the dedup key and as the stem of the uploaded file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageIdentity(String);

impl ImageIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name hint sent to the hosting backend.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl fmt::Display for ImageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Second half of a [`BatchKey`]: an album id, or the image itself for a standalone photo.
///
/// The two variants never compare equal, so a standalone photo cannot land in an album batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BatchGroup {
    Album(String),
    Single(ImageIdentity),
}

/// Key under which deliveries are buffered until their batch completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub conversation: ConversationId,
    pub group: BatchGroup,
}

impl BatchKey {
    pub fn for_delivery(
        conversation: ConversationId,
        group_id: Option<&str>,
        identity: &ImageIdentity,
    ) -> Self {
        let group = match group_id {
            Some(album) => BatchGroup::Album(album.to_string()),
            None => BatchGroup::Single(identity.clone()),
        };
        Self { conversation, group }
    }

    pub fn is_album(&self) -> bool {
        matches!(self.group, BatchGroup::Album(_))
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            BatchGroup::Album(id) => write!(f, "{}/album:{}", self.conversation, id),
            BatchGroup::Single(id) => write!(f, "{}/photo:{}", self.conversation, id),
        }
    }
}

// ---------------------------------------------------------------------------
// Hosting backends
// ---------------------------------------------------------------------------

/// External image host a conversation uploads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hosting {
    Anoimage,
    Ninjabox,
}

impl Hosting {
    pub const ALL: [Hosting; 2] = [Hosting::Anoimage, Hosting::Ninjabox];

    /// Machine name, as written to the upload log.
    pub fn name(self) -> &'static str {
        match self {
            Hosting::Anoimage => "anoimage",
            Hosting::Ninjabox => "ninjabox",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Hosting::Anoimage => "Anoimage",
            Hosting::Ninjabox => "Ninjabox",
        }
    }

    /// Site name shown on the hosting buttons.
    pub fn site(self) -> &'static str {
        match self {
            Hosting::Anoimage => "Anoimage.com",
            Hosting::Ninjabox => "Ninjabox.org",
        }
    }

    /// How long the host keeps an upload.
    pub fn retention_days(self) -> u32 {
        match self {
            Hosting::Anoimage => 120,
            Hosting::Ninjabox => 180,
        }
    }

    /// Short code used inside inline-button payloads.
    pub fn code(self) -> &'static str {
        match self {
            Hosting::Anoimage => "ano",
            Hosting::Ninjabox => "ninja",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.code() == code)
    }
}

impl fmt::Display for Hosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hosting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|h| h.name() == s || h.code() == s)
            .ok_or_else(|| format!("unknown hosting '{s}' (expected anoimage or ninjabox)"))
    }
}

// ---------------------------------------------------------------------------
// Events and records
// ---------------------------------------------------------------------------

/// The person who sent a photo or pressed a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub id: u64,
    pub username: Option<String>,
}

/// Inbound event from the transport: one photo with its bytes already downloaded.
#[derive(Debug, Clone)]
pub struct PhotoDelivered {
    pub conversation: ConversationId,
    /// Album (media group) id, `None` for a standalone photo.
    pub group_id: Option<String>,
    pub identity: ImageIdentity,
    pub bytes: Bytes,
    pub user: Uploader,
    pub received_at: DateTime<Utc>,
}

impl PhotoDelivered {
    pub fn batch_key(&self) -> BatchKey {
        BatchKey::for_delivery(self.conversation, self.group_id.as_deref(), &self.identity)
    }
}

/// Audit row for one successful upload. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: u64,
    pub username: Option<String>,
    pub identity: ImageIdentity,
    pub url: String,
    pub hosting: Hosting,
}
