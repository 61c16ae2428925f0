//! Progress sink that records everything it is told

#![allow(dead_code)]

use async_trait::async_trait;

use spidycore::{Artifact, DownloadError, DownloadStatus, ProgressSink};

/// A document as it looked when it was handed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub file_name: String,
    pub caption: Option<String>,
    pub contents: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub checkpoints: Vec<DownloadStatus>,
    pub delivered: Vec<Delivered>,
    /// `Ok(())` or the error subcategory, one entry per `finish` call
    pub finishes: Vec<Result<(), &'static str>>,
    /// Make `deliver` fail, as if Telegram rejected the upload
    pub reject_delivery: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_delivery() -> Self {
        Self {
            reject_delivery: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn checkpoint(&mut self, status: DownloadStatus) {
        self.checkpoints.push(status);
    }

    async fn deliver(&mut self, artifact: &Artifact) -> Result<(), DownloadError> {
        if self.reject_delivery {
            return Err(DownloadError::DeliveryFailed("Request Entity Too Large".to_string()));
        }
        let contents = std::fs::read(&artifact.path).map_err(|e| DownloadError::DeliveryFailed(e.to_string()))?;
        self.delivered.push(Delivered {
            file_name: artifact.file_name.clone(),
            caption: artifact.caption.clone(),
            contents,
        });
        Ok(())
    }

    async fn finish(&mut self, outcome: &Result<(), DownloadError>) {
        self.finishes.push(outcome.as_ref().map(|_| ()).map_err(DownloadError::subcategory));
    }
}
