use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use photodrop_core::{CallbackAction, ConversationId, Messenger, Reply};
use photodrop_logging::redact_sensitive_data;
use photodrop_orchestrator::{messages, Orchestrator, PhotoOutcome};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::telegram_commands::{handle_command, Command};
use crate::telegram_media::{photo_delivery, photo_identity, uploader};
use crate::ChannelAdapter;

pub(crate) type HandlerResult = anyhow::Result<()>;

/// Render reply buttons as an inline keyboard.
pub fn keyboard(reply: &Reply) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(reply.buttons.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.encode()))
            .collect::<Vec<_>>()
    }))
}

pub(crate) async fn send_reply(bot: &Bot, chat: ChatId, reply: Reply) -> HandlerResult {
    let markup = keyboard(&reply);
    let request = bot.send_message(chat, reply.text).parse_mode(ParseMode::Html);
    if reply.buttons.is_empty() {
        request.await?;
    } else {
        request.reply_markup(markup).await?;
    }
    Ok(())
}

async fn edit_reply(bot: &Bot, message: &Message, reply: Reply) -> HandlerResult {
    let markup = keyboard(&reply);
    bot.edit_message_text(message.chat.id, message.id, reply.text)
        .parse_mode(ParseMode::Html)
        .reply_markup(markup)
        .await?;
    Ok(())
}

/// Outbound half: sends orchestrator replies as new messages.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, conversation: ConversationId, reply: Reply) -> anyhow::Result<()> {
        send_reply(&self.bot, ChatId(conversation.0), reply).await
    }
}

pub struct TelegramAdapter {
    bot: Bot,
}

impl TelegramAdapter {
    pub fn new(token: String) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    fn messenger(&self) -> Arc<dyn Messenger> {
        Arc::new(TelegramMessenger {
            bot: self.bot.clone(),
        })
    }

    async fn start(&self, orchestrator: Orchestrator) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %redact_sensitive_data(&e.to_string()), "Failed to register bot commands");
        }

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .branch(
                        dptree::entry()
                            .filter_command::<Command>()
                            .endpoint(handle_command),
                    )
                    .branch(
                        dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo),
                    ),
            )
            .branch(Update::filter_callback_query().endpoint(handle_callback));

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![orchestrator])
            .default_handler(|upd| async move {
                debug!(update_id = upd.id.0, "Ignoring unsupported update");
            })
            .error_handler(Arc::new(|err: anyhow::Error| async move {
                warn!(error = %redact_sensitive_data(&format!("{err:#}")), "Telegram handler failed");
            }))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

async fn handle_photo(bot: Bot, msg: Message, orchestrator: Orchestrator) -> HandlerResult {
    let Some(identity) = photo_identity(&msg) else {
        return Ok(());
    };
    let now = Utc::now();
    if orchestrator
        .reject_duplicate(ConversationId(msg.chat.id.0), &identity, now)
        .await
    {
        return Ok(());
    }

    let Some(event) = photo_delivery(&bot, &msg, now).await? else {
        return Ok(());
    };

    match orchestrator.handle_photo(event).await {
        PhotoOutcome::Duplicate => debug!(%identity, "Duplicate ignored"),
        PhotoOutcome::AwaitingHosting => debug!(%identity, "Waiting for hosting choice"),
        PhotoOutcome::Accumulating => debug!(%identity, "Added to album"),
        // Detached: the completion task runs to the end on its own.
        PhotoOutcome::Scheduled(_) => debug!(%identity, "Album completion scheduled"),
        PhotoOutcome::Completed(outcomes) => {
            debug!(%identity, items = outcomes.len(), "Upload finished")
        }
    }
    Ok(())
}

async fn handle_callback(bot: Bot, q: CallbackQuery, orchestrator: Orchestrator) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        debug!(data = ?q.data, "Ignoring unknown callback payload");
        return Ok(());
    };
    let Some(message) = q.regular_message() else {
        debug!("Callback without an accessible message");
        return Ok(());
    };

    let now = Utc::now();
    let reply = match action {
        CallbackAction::ChooseHosting { hosting, token } => {
            let conversation = ConversationId(message.chat.id.0);
            orchestrator
                .resolve_choice(conversation, hosting, &token, &uploader(&q.from), now)
                .await
                .reply()
        }
        CallbackAction::HostingMenu => orchestrator.open_hosting_menu(now).await,
        CallbackAction::About => messages::about(),
        CallbackAction::Back => messages::start_greeting(),
    };
    edit_reply(&bot, message, reply).await
}
