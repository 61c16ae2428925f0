//! Test doubles for the orchestrator
//!
//! `ScriptedRunner` stands in for yt-dlp/ffmpeg and `RecordingSink` for the
//! chat transport, so whole requests run without network or external tools.

pub mod recording_sink;
pub mod scripted_runner;

pub use recording_sink::RecordingSink;
pub use scripted_runner::{Reply, ScriptedRunner, Step};
