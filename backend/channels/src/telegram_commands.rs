//! Telegram Bot Commands: `/start` and `/help`.

use photodrop_orchestrator::messages;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::telegram::{send_reply, HandlerResult};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show this help")]
    Help,
}

pub async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> HandlerResult {
    info!(chat = msg.chat.id.0, command = ?cmd, "Handling Telegram command");
    let reply = match cmd {
        Command::Start => messages::start_greeting(),
        Command::Help => messages::help(),
    };
    send_reply(&bot, msg.chat.id, reply).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("/start", "photodrop_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "photodrop_bot").unwrap(), Command::Help);
        assert!(Command::parse("/upload", "photodrop_bot").is_err());
    }
}
