use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;

use spidybot::cli::{Cli, Commands};
use spidybot::console::ConsoleReporter;
use spidybot::telegram::{create_bot, schema, serve_status, setup_bot_commands, start_webhook, HandlerDeps};

use spidycore::core::logging::log_tools_availability;
use spidycore::core::process::SystemRunner;
use spidycore::core::{config, init_logger, log_credentials_configuration, metrics};
use spidycore::download::classifier::ErrorClassifier;
use spidycore::download::{CredentialSet, SessionManager, ToolConfig};
use spidycore::Orchestrator;

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation, webhook registration).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present, before any config is read
    let _ = dotenv();

    init_logger(&config::LOG_LEVEL, config::LOG_FILE_PATH.as_deref())?;

    match cli.command {
        Some(Commands::Run { webhook, polling }) => {
            let use_webhook = webhook || (!polling && config::WEBHOOK_URL.is_some());
            log::info!("Running bot (webhook: {})", use_webhook);
            run_bot(use_webhook).await
        }
        Some(Commands::Fetch { url, output }) => run_fetch(url, output).await,
        Some(Commands::CheckTools) => run_check_tools().await,
        None => {
            // Container default: webhook when configured, polling otherwise
            let use_webhook = config::WEBHOOK_URL.is_some();
            log::info!("No command specified, running bot (webhook: {})", use_webhook);
            run_bot(use_webhook).await
        }
    }
}

/// Builds the orchestrator from the environment
fn build_orchestrator(sessions: SessionManager) -> Orchestrator {
    let credentials = CredentialSet::from_env();
    log_credentials_configuration(&credentials);

    Orchestrator::new(Arc::new(SystemRunner), sessions, Arc::new(credentials))
        .with_tools(ToolConfig::from_env())
        .with_classifier(ErrorClassifier::from_env())
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    log::info!("Starting bot...");

    metrics::init_metrics();

    // Leftovers of a previous bot run; a one-off `fetch` must not do this
    // next to a live bot.
    let sessions = SessionManager::new(config::TEMP_DIR.as_str());
    if let Err(e) = sessions.purge_stale().await {
        log::warn!("Failed to purge stale workspaces under {}: {}", sessions.root().display(), e);
    }

    let orchestrator = build_orchestrator(sessions);
    if !log_tools_availability(orchestrator.runner(), orchestrator.tools()).await {
        log::warn!("Some external tools are missing; downloads will fail until they are installed");
    }

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::new(Arc::new(orchestrator));
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema(deps))
        .enable_ctrlc_handler()
        .build();

    if use_webhook {
        let url = config::WEBHOOK_URL
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--webhook requires WEBHOOK_URL"))?;
        let url = url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid WEBHOOK_URL: {}", e))?;
        log::info!("Starting bot in webhook mode at {}", url);

        let listener = start_webhook(bot, url, *config::PORT, config::WEBHOOK_SECRET.clone()).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        bot.delete_webhook().await?;

        let port = *config::PORT;
        tokio::spawn(async move {
            if let Err(e) = serve_status(port).await {
                log::error!("Status server error: {}", e);
            }
        });

        dispatcher.dispatch().await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Runs one request from the terminal
async fn run_fetch(url: String, output: PathBuf) -> Result<()> {
    let orchestrator = build_orchestrator(SessionManager::new(config::TEMP_DIR.as_str()));
    let mut reporter = ConsoleReporter::new(output);

    orchestrator
        .handle_request(&url, 0, &mut reporter)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}

async fn run_check_tools() -> Result<()> {
    let tools = ToolConfig::from_env();
    if log_tools_availability(&SystemRunner, &tools).await {
        Ok(())
    } else {
        Err(anyhow::anyhow!("yt-dlp and/or ffmpeg are not available"))
    }
}
