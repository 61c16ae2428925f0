//! Telegram transport: bot setup, dispatcher schema, status messages and the
//! webhook HTTP server

pub mod bot;
pub mod handlers;
pub mod status;
pub mod types;
pub mod webhook;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::schema;
pub use status::TelegramReporter;
pub use types::{HandlerDeps, HandlerError};
pub use webhook::{serve_status, start_webhook, status_router};
