//! Terminal progress sink for the `fetch` subcommand
//!
//! Prints the same status texts the chat would show and copies the finished
//! video out of the session workspace before it is removed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use spidycore::download::progress::user_message;
use spidycore::{Artifact, DownloadError, DownloadStatus, ProgressSink};

pub struct ConsoleReporter {
    output_dir: PathBuf,
    saved: Option<PathBuf>,
}

impl ConsoleReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            saved: None,
        }
    }

    /// Where the delivered video was copied, once delivery succeeded
    pub fn saved(&self) -> Option<&Path> {
        self.saved.as_deref()
    }
}

#[async_trait]
impl ProgressSink for ConsoleReporter {
    async fn checkpoint(&mut self, status: DownloadStatus) {
        println!("{}", status.to_message());
    }

    async fn deliver(&mut self, artifact: &Artifact) -> Result<(), DownloadError> {
        fs_err::tokio::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DownloadError::DeliveryFailed(e.to_string()))?;

        let destination = self.output_dir.join(&artifact.file_name);
        fs_err::tokio::copy(&artifact.path, &destination)
            .await
            .map_err(|e| DownloadError::DeliveryFailed(e.to_string()))?;

        if let Some(caption) = &artifact.caption {
            println!("📝 {}", caption);
        }
        self.saved = Some(destination);
        Ok(())
    }

    async fn finish(&mut self, outcome: &Result<(), DownloadError>) {
        match (outcome, &self.saved) {
            (Ok(()), Some(path)) => println!("✅ Saved to {}", path.display()),
            (Ok(()), None) => println!("✅ Done"),
            (Err(e), _) => eprintln!("{}", user_message(e)),
        }
    }
}
