//! yt-dlp and ffmpeg command lines, metadata parsing and artifact lookup
//!
//! Everything here is pure apart from [`locate_media`], which lists the
//! workspace. Commands are built as argument vectors, never through a shell.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config;
use crate::core::process::ToolCommand;
use crate::download::error::{DownloadError, ToolStep};
use crate::download::session::SessionId;

/// Leftovers yt-dlp writes while a download is in progress
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Binaries and timeouts for the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub ytdlp_timeout: Duration,
    pub ffmpeg_timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ytdlp_timeout: config::download::ytdlp_timeout(),
            ffmpeg_timeout: config::transcode::ffmpeg_timeout(),
        }
    }
}

impl ToolConfig {
    /// Binaries from `YTDL_BIN` / `FFMPEG_BIN`, default timeouts
    pub fn from_env() -> Self {
        Self {
            ytdlp_bin: config::YTDL_BIN.clone(),
            ffmpeg_bin: config::FFMPEG_BIN.clone(),
            ..Self::default()
        }
    }

    /// `yt-dlp [--cookies F] --dump-json URL`
    pub fn metadata_command(&self, url: &str, cookie_file: Option<&Path>) -> ToolCommand {
        self.ytdlp(cookie_file).arg("--dump-json").arg(url)
    }

    /// `yt-dlp [--cookies F] -f "bv*+ba/b" -o "<ws>/media.%(ext)s" URL`
    pub fn download_command(&self, url: &str, workspace: &Path, cookie_file: Option<&Path>) -> ToolCommand {
        let template = workspace.join(format!("{}.%(ext)s", config::download::MEDIA_BASE_NAME));
        self.ytdlp(cookie_file)
            .args(["-f", config::download::FORMAT_SELECTOR, "-o"])
            .path_arg(&template)
            .arg(url)
    }

    /// Re-encodes `input` into H.264/AAC MP4 with the moov atom up front
    pub fn transcode_command(&self, input: &Path, output: &Path) -> ToolCommand {
        use crate::core::config::transcode::*;

        ToolCommand::new(&self.ffmpeg_bin)
            .args(["-y", "-i"])
            .path_arg(input)
            .args([
                "-c:v",
                VIDEO_CODEC,
                "-preset",
                PRESET,
                "-crf",
                CRF,
                "-c:a",
                AUDIO_CODEC,
                "-b:a",
                AUDIO_BITRATE,
                "-movflags",
                "+faststart",
            ])
            .path_arg(output)
            .timeout(self.ffmpeg_timeout)
    }

    /// `<tool> --version` (ffmpeg spells it `-version`)
    pub fn version_commands(&self) -> [ToolCommand; 2] {
        [
            ToolCommand::new(&self.ytdlp_bin).arg("--version"),
            ToolCommand::new(&self.ffmpeg_bin).arg("-version"),
        ]
    }

    fn ytdlp(&self, cookie_file: Option<&Path>) -> ToolCommand {
        let cmd = ToolCommand::new(&self.ytdlp_bin).timeout(self.ytdlp_timeout);
        match cookie_file {
            Some(path) => cmd.arg("--cookies").path_arg(path),
            None => cmd,
        }
    }
}

/// Output file name for a session: `vid_<id>.mp4`
pub fn output_file_name(session_id: &SessionId) -> String {
    format!("vid_{}.mp4", session_id)
}

/// The subset of `yt-dlp --dump-json` output we use
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
}

impl VideoMetadata {
    /// Parses the single JSON object yt-dlp prints on stdout.
    pub fn parse(stdout: &str) -> Result<Self, DownloadError> {
        serde_json::from_str(stdout).map_err(|e| DownloadError::ToolFailure {
            step: ToolStep::Metadata,
            message: format!("unreadable metadata JSON: {}", e),
        })
    }

    /// Description cut to the Telegram caption limit, `None` when empty
    pub fn caption(&self) -> Option<String> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| truncate_utf16(d, config::download::CAPTION_MAX_LEN))
    }
}

/// Length as Telegram counts it
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Longest prefix of `text` that fits in `max_units` UTF-16 code units,
/// never splitting a code point
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    let mut units = 0;
    for (byte_idx, c) in text.char_indices() {
        units += c.len_utf16();
        if units > max_units {
            return text[..byte_idx].to_string();
        }
    }
    text.to_string()
}

/// Finds the file yt-dlp produced (`media.<ext>`), skipping partial downloads.
///
/// When several candidates exist the lexicographically first is used so the
/// choice does not depend on directory iteration order.
pub async fn locate_media(workspace: &Path) -> Result<Option<PathBuf>, DownloadError> {
    let prefix = format!("{}.", config::download::MEDIA_BASE_NAME);
    let mut candidates = Vec::new();

    let mut entries = fs_err::tokio::read_dir(workspace)
        .await
        .map_err(|e| DownloadError::Infrastructure(e.into()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::Infrastructure(e.into()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && !PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            candidates.push(entry.path());
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::ffi::OsString;

    fn args_of(cmd: &ToolCommand) -> Vec<String> {
        cmd.get_args().iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_metadata_command() {
        let tools = ToolConfig::default();
        let anon = tools.metadata_command("https://a.b/c", None);
        assert_eq!(anon.program(), "yt-dlp");
        assert_eq!(args_of(&anon), vec!["--dump-json", "https://a.b/c"]);
        assert_eq!(anon.get_timeout(), Some(Duration::from_secs(240)));

        let authed = tools.metadata_command("https://a.b/c", Some(Path::new("/ws/cookie.txt")));
        assert_eq!(
            args_of(&authed),
            vec!["--cookies", "/ws/cookie.txt", "--dump-json", "https://a.b/c"]
        );
    }

    #[test]
    fn test_download_command() {
        let tools = ToolConfig::default();
        let cmd = tools.download_command("https://a.b/c", Path::new("/ws"), None);
        assert_eq!(
            args_of(&cmd),
            vec!["-f", "bv*+ba/b", "-o", "/ws/media.%(ext)s", "https://a.b/c"]
        );
    }

    #[test]
    fn test_transcode_command() {
        let tools = ToolConfig {
            ffmpeg_bin: "/usr/bin/ffmpeg".into(),
            ..ToolConfig::default()
        };
        let cmd = tools.transcode_command(Path::new("/ws/media.webm"), Path::new("/ws/vid_abc.mp4"));
        assert_eq!(cmd.program(), "/usr/bin/ffmpeg");
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/ffmpeg -y -i /ws/media.webm -c:v libx264 -preset medium -crf 23 -c:a aac -b:a 192k -movflags +faststart /ws/vid_abc.mp4"
        );
        assert_eq!(cmd.get_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_paths_with_spaces_stay_single_args() {
        let tools = ToolConfig::default();
        let cmd = tools.transcode_command(Path::new("/my ws/media.mp4"), Path::new("/my ws/out.mp4"));
        assert!(cmd.get_args().contains(&OsString::from("/my ws/media.mp4")));
    }

    #[test]
    fn test_metadata_caption() {
        let json = r#"{"id":"ABC","title":"Reel","description":"hello 👋","extra":[1,2]}"#;
        let meta = VideoMetadata::parse(json).unwrap();
        assert_eq!(meta.caption().as_deref(), Some("hello 👋"));
        assert_eq!(meta.title.as_deref(), Some("Reel"));

        let empty = VideoMetadata::parse(r#"{"description":"  "}"#).unwrap();
        assert_eq!(empty.caption(), None);

        let missing = VideoMetadata::parse("{}").unwrap();
        assert_eq!(missing.caption(), None);
    }

    #[test]
    fn test_caption_truncated_on_char_boundary() {
        let long = "é".repeat(2000);
        let meta = VideoMetadata {
            description: Some(long),
            ..VideoMetadata::default()
        };
        let caption = meta.caption().unwrap();
        assert_eq!(caption.chars().count(), 1024);
    }

    #[test]
    fn test_caption_counts_utf16_units() {
        // Each emoji is two UTF-16 code units
        let meta = VideoMetadata {
            description: Some("🌅".repeat(1000)),
            ..VideoMetadata::default()
        };
        let caption = meta.caption().unwrap();
        assert_eq!(utf16_len(&caption), 1024);
        assert_eq!(caption.chars().count(), 512);

        assert_eq!(truncate_utf16("a🌅b", 2), "a");
        assert_eq!(truncate_utf16("a🌅b", 3), "a🌅");
        assert_eq!(truncate_utf16("short", 1024), "short");
    }

    #[test]
    fn test_metadata_parse_error() {
        let err = VideoMetadata::parse("not json").unwrap_err();
        assert!(matches!(
            err,
            DownloadError::ToolFailure {
                step: ToolStep::Metadata,
                ..
            }
        ));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(&SessionId::from("1a2b3c4d")), "vid_1a2b3c4d.mp4");
    }

    #[tokio::test]
    async fn test_locate_media() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(locate_media(dir.path()).await.unwrap(), None);

        std::fs::write(dir.path().join("cookie.txt"), b"c").unwrap();
        std::fs::write(dir.path().join("media.mp4.part"), b"p").unwrap();
        assert_eq!(locate_media(dir.path()).await.unwrap(), None);

        std::fs::write(dir.path().join("media.webm"), b"w").unwrap();
        std::fs::write(dir.path().join("media.mkv"), b"k").unwrap();
        assert_eq!(
            locate_media(dir.path()).await.unwrap(),
            Some(dir.path().join("media.mkv"))
        );
    }
}
