//! The upload orchestration engine: dedup cache, batch assembler, session
//! state and the orchestrator that drives them.

pub mod batch;
pub mod dedup;
pub mod messages;
pub mod orchestrator;
pub mod session;

pub use batch::{BatchAssembler, PendingItem};
pub use dedup::DedupCache;
pub use orchestrator::{ChoiceOutcome, Orchestrator, OrchestratorConfig, PhotoOutcome, UploadOutcome};
pub use session::{SessionState, TokenResolution};
