//! Shared vocabulary of the photodrop bot: domain types, the per-item error
//! taxonomy, and the capability traits the orchestrator is wired against.

pub mod callback;
pub mod error;
pub mod reply;
pub mod traits;
pub mod types;

pub use callback::CallbackAction;
pub use error::{body_snippet, UploadError};
pub use reply::{escape_html, Button, Reply};
pub use traits::{AuditSink, HostingAdapter, Messenger};
pub use types::{
    BatchGroup, BatchKey, ConversationId, Hosting, ImageIdentity, PhotoDelivered, UploadRecord,
    Uploader,
};
