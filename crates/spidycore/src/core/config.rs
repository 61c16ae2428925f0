use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Cached ffmpeg binary path
/// Read once at startup from FFMPEG_BIN environment variable or defaults to "ffmpeg"
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// Root directory for per-request workspaces
/// Read from TEMP_DIR environment variable
/// Default: /tmp/temp_processing
pub static TEMP_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_DIR").unwrap_or_else(|_| "/tmp/temp_processing".to_string()));

/// Optional log file path
/// Read from LOG_FILE_PATH environment variable
/// When unset, logs go to the terminal only (containers collect stdout)
pub static LOG_FILE_PATH: Lazy<Option<String>> = Lazy::new(|| non_empty_var("LOG_FILE_PATH"));

/// Log level filter, parsed by `log::LevelFilter::from_str`
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Bot token
/// Read from TELEGRAM_BOT_TOKEN, BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("TELEGRAM_BOT_TOKEN")
        .or_else(|_| env::var("BOT_TOKEN"))
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public webhook URL for Telegram updates, including the path
/// Read from WEBHOOK_URL environment variable
/// Example: https://bot.example.com/telegram_webhook
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_URL"));

/// Secret token Telegram echoes back in the X-Telegram-Bot-Api-Secret-Token header
/// Read from WEBHOOK_SECRET environment variable
pub static WEBHOOK_SECRET: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_SECRET"));

/// HTTP listen port for the webhook, health and metrics routes
/// Read from PORT environment variable (Cloud Run convention)
/// Default: 8080
pub static PORT: Lazy<u16> = Lazy::new(|| env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080));

/// Credential configuration
pub mod credentials {
    use once_cell::sync::Lazy;
    use std::env;

    /// Prefix of the numbered credential variables (`<PREFIX>1`, `<PREFIX>2`, ...)
    /// Read from CREDENTIAL_ENV_PREFIX environment variable
    /// Default: INSTAGRAM_COOKIES
    pub static ENV_PREFIX: Lazy<String> =
        Lazy::new(|| env::var("CREDENTIAL_ENV_PREFIX").unwrap_or_else(|_| "INSTAGRAM_COOKIES".to_string()));

    /// File name of the per-attempt credential file inside the workspace
    pub const FILE_NAME: &str = "cookie.txt";
}

/// stderr classification patterns (comma-separated, case-insensitive)
pub mod classifier {
    use once_cell::sync::Lazy;

    /// Default patterns marking a platform-wide DNS/network block
    pub const DEFAULT_NETWORK_BLOCK_PATTERNS: &[&str] = &["no address associated with hostname"];

    /// Default patterns marking a credential that needs to be rotated
    pub const DEFAULT_AUTH_PATTERNS: &[&str] = &["login is required", "login required"];

    /// Read from NETWORK_BLOCK_PATTERNS environment variable
    pub static NETWORK_BLOCK_PATTERNS: Lazy<Option<Vec<String>>> =
        Lazy::new(|| super::non_empty_var("NETWORK_BLOCK_PATTERNS").map(|raw| super::split_patterns(&raw)));

    /// Read from AUTH_ERROR_PATTERNS environment variable
    pub static AUTH_PATTERNS: Lazy<Option<Vec<String>>> =
        Lazy::new(|| super::non_empty_var("AUTH_ERROR_PATTERNS").map(|raw| super::split_patterns(&raw)));
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Telegram caption limit (UTF-16 code units)
    pub const CAPTION_MAX_LEN: usize = 1024;

    /// Telegram text message limit (UTF-16 code units)
    pub const MESSAGE_MAX_LEN: usize = 4096;

    /// yt-dlp format selector: best video + best audio, or best single file
    pub const FORMAT_SELECTOR: &str = "bv*+ba/b";

    /// Base name of the file yt-dlp writes into the workspace
    pub const MEDIA_BASE_NAME: &str = "media";

    /// Timeout for yt-dlp commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240; // 4 minutes, metadata fetches can be slow

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Transcode configuration (fixed quality/compatibility parameters)
pub mod transcode {
    use super::Duration;

    pub const VIDEO_CODEC: &str = "libx264";
    pub const PRESET: &str = "medium";
    pub const CRF: &str = "23";
    pub const AUDIO_CODEC: &str = "aac";
    pub const AUDIO_BITRATE: &str = "192k";

    /// Timeout for ffmpeg re-encoding (in seconds)
    pub const FFMPEG_TIMEOUT_SECS: u64 = 600; // 10 minutes

    /// ffmpeg command timeout duration
    pub fn ffmpeg_timeout() -> Duration {
        Duration::from_secs(FFMPEG_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Large enough for uploading a 50 MB document
    pub const REQUEST_TIMEOUT_SECS: u64 = 300; // 5 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}
