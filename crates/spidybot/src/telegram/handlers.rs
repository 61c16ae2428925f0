//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use spidycore::download::progress::START_MESSAGE;
use spidycore::download::target::extract_first_url;

use super::bot::Command;
use super::status::TelegramReporter;
use super::types::{HandlerDeps, HandlerError};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched first; any other text message is treated as a
/// download request.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler())
        .branch(message_handler(deps))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        |bot: Bot, msg: Message, cmd: Command| async move {
            log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);
            match cmd {
                Command::Start => {
                    bot.send_message(msg.chat.id, START_MESSAGE).await?;
                }
                Command::Help => {
                    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
                }
            }
            Ok(())
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().and_then(request_text))
        .endpoint(move |bot: Bot, msg: Message, text: String| {
            let deps = deps.clone();
            async move {
                handle_download_request(bot, msg.chat.id, &text, &deps).await;
                Ok(())
            }
        })
}

/// Text of a plain message; unknown `/commands` are ignored
fn request_text(text: &str) -> Option<String> {
    if text.trim_start().starts_with('/') {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Runs one download request and reports progress in the chat.
///
/// Text without any URL is answered directly, without a status message.
pub async fn handle_download_request(bot: Bot, chat_id: ChatId, text: &str, deps: &HandlerDeps) {
    let mut reporter = if extract_first_url(text).is_some() {
        TelegramReporter::start(bot, chat_id).await
    } else {
        TelegramReporter::new(bot, chat_id)
    };

    // Failures are already reported to the chat and logged by the orchestrator
    let _ = deps.orchestrator.handle_request(text, chat_id.0, &mut reporter).await;
}
