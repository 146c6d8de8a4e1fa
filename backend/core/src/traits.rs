use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UploadError;
use crate::reply::Reply;
use crate::types::{ConversationId, Hosting, UploadRecord};

/// Uploads raw image bytes to one external host and returns a shareable URL.
///
/// Implementations must never substitute a default URL: anything short of a
/// recognised link is an [`UploadError`].
#[async_trait]
pub trait HostingAdapter: Send + Sync {
    /// Which backend this adapter talks to.
    fn hosting(&self) -> Hosting;

    /// Upload one image. `file_name` only names the multipart part.
    async fn upload(&self, image: Bytes, file_name: &str) -> Result<String, UploadError>;
}

/// Append-only sink for [`UploadRecord`]s.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append_record(&self, record: &UploadRecord) -> Result<()>;
}

/// Outbound half of the chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a new message into a conversation.
    async fn send(&self, conversation: ConversationId, reply: Reply) -> Result<()>;
}
