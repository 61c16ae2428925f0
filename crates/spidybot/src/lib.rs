//! spidybot - Telegram front end for spidycore
//!
//! - `cli`: command line interface
//! - `console`: terminal progress sink used by `spidybot fetch`
//! - `telegram`: bot, dispatcher schema, status messages, webhook server

pub mod cli;
pub mod console;
pub mod telegram;
