use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::core::error::AppError;

/// External tool step that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolStep {
    Metadata,
    Download,
    Transcode,
}

/// Why the inbound message was rejected before any work started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// The message text contains no URL at all
    #[error("No URL found in message")]
    NoUrl,
    /// An authenticated-platform URL that is not a reel/post/tv link
    #[error("Invalid Instagram URL format (expected a reel, post or tv link)")]
    BadFormat,
}

/// Structured error type for download requests.
///
/// Every terminal failure of a request is one of these variants; the
/// notification layer maps each one to a fixed user-facing message.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Malformed or missing URL
    #[error("{0}")]
    InvalidInput(InvalidInput),

    /// Authentication is required but no credentials are configured
    #[error("Instagram URL detected but no credentials are configured")]
    Configuration,

    /// Hostname resolution for the platform fails: the whole server is blocked
    #[error("Network block detected for Instagram: {0}")]
    NetworkBlock(String),

    /// Every planned credential was rejected with an authentication error
    #[error("All {attempts} login attempt(s) failed: {last_error}")]
    AuthExhausted { attempts: usize, last_error: String },

    /// Expected file missing after a tool step
    #[error("File not found after {step}: {message}")]
    ArtifactNotFound { step: ToolStep, message: String },

    /// Non-zero exit of yt-dlp (or unusable output from it)
    #[error("{step} failed: {message}")]
    ToolFailure { step: ToolStep, message: String },

    /// Non-zero exit of ffmpeg
    #[error("FFmpeg encoding failed: {0}")]
    TranscodeFailed(String),

    /// The finished file could not be sent to the chat
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// Process could not be launched, filesystem failure, etc.
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] AppError),
}

impl DownloadError {
    /// Returns subcategory for metrics and logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::InvalidInput(InvalidInput::NoUrl) => "no_url",
            DownloadError::InvalidInput(InvalidInput::BadFormat) => "invalid_url_format",
            DownloadError::Configuration => "configuration",
            DownloadError::NetworkBlock(_) => "network_block",
            DownloadError::AuthExhausted { .. } => "auth_exhausted",
            DownloadError::ArtifactNotFound { .. } => "file_not_found",
            DownloadError::ToolFailure { .. } => "tool_failure",
            DownloadError::TranscodeFailed(_) => "transcode",
            DownloadError::DeliveryFailed(_) => "delivery",
            DownloadError::Infrastructure(_) => "infrastructure",
        }
    }
}
