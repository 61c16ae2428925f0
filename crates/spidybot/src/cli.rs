use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spidybot")]
#[command(author, version, about = "Telegram bot that downloads Instagram reels and other videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Receive updates through the webhook at WEBHOOK_URL
        #[arg(long, conflicts_with = "polling")]
        webhook: bool,

        /// Use long polling even when WEBHOOK_URL is set
        #[arg(long)]
        polling: bool,
    },

    /// Run the download pipeline for one URL and copy the result to a directory
    Fetch {
        /// Video URL (or any text containing one)
        url: String,

        /// Directory the finished video is copied into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Check that yt-dlp and ffmpeg can be launched
    CheckTools,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_run_modes() {
        let cli = Cli::try_parse_from(["spidybot", "run", "--webhook"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                webhook: true,
                polling: false
            })
        );

        let cli = Cli::try_parse_from(["spidybot"]).unwrap();
        assert_eq!(cli.command, None);

        assert!(Cli::try_parse_from(["spidybot", "run", "--webhook", "--polling"]).is_err());
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "spidybot",
            "fetch",
            "https://instagram.com/reel/ABC/",
            "-o",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Fetch {
                url: "https://instagram.com/reel/ABC/".to_string(),
                output: PathBuf::from("/tmp/out"),
            })
        );

        let cli = Cli::try_parse_from(["spidybot", "fetch", "https://x.y/z"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Fetch { ref output, .. }) if output == &PathBuf::from(".")));
    }

    #[test]
    fn test_parse_check_tools() {
        let cli = Cli::try_parse_from(["spidybot", "check-tools"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckTools));
    }
}
