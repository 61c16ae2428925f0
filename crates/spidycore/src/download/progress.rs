//! Progress reporting for a download request
//!
//! The orchestrator reports checkpoints, hands over the finished file and
//! announces the final outcome through [`ProgressSink`]. Rendering of the
//! user-facing texts lives here so every transport shows the same wording.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::core::config;
use crate::download::error::{DownloadError, InvalidInput};
use crate::download::tools::{truncate_utf16, utf16_len};

/// Reply to `/start`
pub const START_MESSAGE: &str =
    "👋 Hello! Send me any Instagram Reel, Post, or IGTV link, and I'll try to download it for you.";

/// First status message, shown before any checkpoint
pub const PROCESSING_MESSAGE: &str = "🔄 Processing...";

const TOOL_FAILURE_PREFIX: &str = "Video download failed: ";

/// Download state for displaying progress to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// `yt-dlp --dump-json` is running
    FetchingMetadata { attempt: usize, total: usize },
    /// `yt-dlp` is downloading the media
    Downloading { attempt: usize, total: usize },
    /// `ffmpeg` is re-encoding
    Transcoding { attempt: usize },
    /// The document is being sent to the chat
    Uploading,
}

impl DownloadStatus {
    /// Label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingMetadata { .. } => "fetching_metadata",
            Self::Downloading { .. } => "downloading",
            Self::Transcoding { .. } => "transcoding",
            Self::Uploading => "uploading",
        }
    }

    /// Status text shown in the chat
    pub fn to_message(&self) -> String {
        match self {
            Self::FetchingMetadata { attempt, total } => {
                format!("📄 Fetching video metadata (Attempt {}/{})...", attempt, total)
            }
            Self::Downloading { attempt, total } => {
                format!(
                    "⬇️ Downloading best quality video and audio (Attempt {}/{})...",
                    attempt, total
                )
            }
            Self::Transcoding { attempt } => format!(
                "🎞️ Re-encoding video with FFmpeg for optimal quality and size (Attempt {})...",
                attempt
            ),
            Self::Uploading => "📤 Uploading to Telegram...".to_string(),
        }
    }
}

/// The finished file, ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub caption: Option<String>,
    /// File name shown in the chat (`vid_<session_id>.mp4`)
    pub file_name: String,
}

/// Receives progress for one request.
///
/// `checkpoint` is best effort: a transport failure there is logged by the
/// implementation and never fails the request. `deliver` failing ends the
/// request with [`DownloadError::DeliveryFailed`]. `finish` is called exactly
/// once per request, after everything else.
#[async_trait]
pub trait ProgressSink: Send {
    async fn checkpoint(&mut self, status: DownloadStatus);

    async fn deliver(&mut self, artifact: &Artifact) -> Result<(), DownloadError>;

    async fn finish(&mut self, outcome: &Result<(), DownloadError>);
}

/// Pre-mapped user message for a terminal failure.
///
/// Only the generic tool failure carries the tool's own output; everything
/// else is a fixed text.
pub fn user_message(err: &DownloadError) -> String {
    match err {
        DownloadError::InvalidInput(InvalidInput::NoUrl) => "⚠️ Please send a valid video URL.".to_string(),
        DownloadError::InvalidInput(InvalidInput::BadFormat) => {
            "⚠️ That doesn't look like a valid Instagram video URL. Please send a Reel, Post, or IGTV link.".to_string()
        }
        DownloadError::Configuration => {
            "⚠️ Instagram downloads are not configured on this bot yet. Please notify the bot administrator.".to_string()
        }
        DownloadError::NetworkBlock(_) => {
            "⚠️ It seems there's a network block preventing access to Instagram from this server. Instagram downloads might not work.".to_string()
        }
        DownloadError::AuthExhausted { .. } => {
            "⚠️ Login required to access this video. All login attempts failed. Please notify the bot administrator to update cookies.".to_string()
        }
        DownloadError::ArtifactNotFound { .. } => {
            "Could not find the media file after download. It might be unavailable or a temporary issue.".to_string()
        }
        DownloadError::TranscodeFailed(_) => {
            "Video encoding failed. The downloaded file might be corrupted or in an unsupported format.".to_string()
        }
        DownloadError::ToolFailure { message, .. } => {
            // The tool output must not push the reply past the message limit
            let budget = config::download::MESSAGE_MAX_LEN - utf16_len(TOOL_FAILURE_PREFIX);
            format!("{}{}", TOOL_FAILURE_PREFIX, truncate_utf16(message, budget))
        }
        DownloadError::DeliveryFailed(_) => {
            "❌ The video was processed but could not be sent. It may be too large for Telegram.".to_string()
        }
        DownloadError::Infrastructure(_) => {
            "❌ Failed to process video.\n• It may be deleted/private.\n• Or our login session expired.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::download::error::ToolStep;
    use std::collections::HashSet;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            DownloadStatus::FetchingMetadata { attempt: 2, total: 3 }.to_message(),
            "📄 Fetching video metadata (Attempt 2/3)..."
        );
        assert!(DownloadStatus::Downloading { attempt: 1, total: 1 }
            .to_message()
            .contains("Attempt 1/1"));
        assert_eq!(DownloadStatus::Uploading.to_message(), "📤 Uploading to Telegram...");
        assert_eq!(DownloadStatus::Transcoding { attempt: 1 }.as_str(), "transcoding");
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = vec![
            DownloadError::InvalidInput(InvalidInput::NoUrl),
            DownloadError::InvalidInput(InvalidInput::BadFormat),
            DownloadError::Configuration,
            DownloadError::NetworkBlock("x".into()),
            DownloadError::AuthExhausted {
                attempts: 2,
                last_error: "x".into(),
            },
            DownloadError::ArtifactNotFound {
                step: ToolStep::Download,
                message: "x".into(),
            },
            DownloadError::TranscodeFailed("x".into()),
            DownloadError::ToolFailure {
                step: ToolStep::Download,
                message: "x".into(),
            },
            DownloadError::DeliveryFailed("x".into()),
            DownloadError::Infrastructure(AppError::Io(std::io::Error::other("x"))),
        ];
        let messages: HashSet<String> = errors.iter().map(user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_only_tool_failure_leaks_diagnostics() {
        let tool = DownloadError::ToolFailure {
            step: ToolStep::Download,
            message: "HTTP Error 404: Not Found".into(),
        };
        assert_eq!(user_message(&tool), "Video download failed: HTTP Error 404: Not Found");

        let auth = DownloadError::AuthExhausted {
            attempts: 3,
            last_error: "ERROR: secret stderr".into(),
        };
        assert!(!user_message(&auth).contains("secret stderr"));

        let transcode = DownloadError::TranscodeFailed("moov atom not found".into());
        assert!(!user_message(&transcode).contains("moov"));
    }

    #[test]
    fn test_long_tool_output_fits_one_message() {
        let err = DownloadError::ToolFailure {
            step: ToolStep::Download,
            message: "WARNING: [Instagram] retrying\n".repeat(200),
        };
        let text = user_message(&err);
        assert!(text.starts_with("Video download failed: WARNING: [Instagram] retrying"));
        assert!(utf16_len(&text) <= config::download::MESSAGE_MAX_LEN);

        let emoji = DownloadError::ToolFailure {
            step: ToolStep::Metadata,
            message: "🚫".repeat(5000),
        };
        assert!(utf16_len(&user_message(&emoji)) <= config::download::MESSAGE_MAX_LEN);
    }
}
