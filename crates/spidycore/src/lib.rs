//! spidycore - download orchestration for the spidybot Telegram bot
//!
//! This library holds everything that does not talk to Telegram directly:
//! running `yt-dlp`/`ffmpeg`, per-request workspaces, credential rotation,
//! failure classification and the orchestrator that ties them together.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics, external process runner
//! - `download`: sessions, credentials, targets, tool commands, orchestrator

pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use core::error::{AppError, AppResult};
pub use download::error::DownloadError;
pub use download::orchestrator::Orchestrator;
pub use download::progress::{Artifact, DownloadStatus, ProgressSink};
