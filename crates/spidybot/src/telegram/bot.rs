//! Bot instance creation and command list

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use spidycore::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Send me a video link. I understand:")]
pub enum Command {
    #[command(description = "greeting and usage")]
    Start,
    #[command(description = "show this help")]
    Help,
}

/// Creates a Bot instance whose HTTP client waits long enough for large uploads
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token or the HTTP client could not be built
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("TELEGRAM_BOT_TOKEN environment variable not set");
    }

    let client = teloxide::net::default_reqwest_settings()
        .timeout(config::network::timeout())
        .build()?;

    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
