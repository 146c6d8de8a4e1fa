//! Chat transports. Each one turns platform updates into orchestrator calls
//! and renders [`photodrop_core::Reply`] values back onto the platform.

use std::sync::Arc;

use async_trait::async_trait;
use photodrop_core::Messenger;
use photodrop_orchestrator::Orchestrator;

pub mod telegram;
pub mod telegram_commands;
pub mod telegram_media;

pub use telegram::{TelegramAdapter, TelegramMessenger};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Outbound half, handed to the orchestrator before `start`.
    fn messenger(&self) -> Arc<dyn Messenger>;

    /// Run the adapter's receive loop until shutdown.
    async fn start(&self, orchestrator: Orchestrator) -> anyhow::Result<()>;
}
