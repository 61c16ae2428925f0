//! Download orchestration
//!
//! One request runs through:
//!
//! ```text
//! parse target -> plan credentials -> open session
//!   loop per credential:  write cookie -> fetch metadata -> download -> remove cookie
//!     auth failure  -> next credential
//!     anything else -> stop
//!   transcode -> upload -> finish -> close session
//! ```
//!
//! Each attempt ends in an explicit [`AttemptOutcome`]; the loop never has to
//! guess from an error message whether to retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::core::error::AppError;
use crate::core::metrics;
use crate::core::process::{CommandOutput, CommandRunner, ToolCommand};
use crate::download::classifier::{ErrorClassifier, StderrClass};
use crate::download::credentials::{Attempt, AttemptPlan, CredentialFile, CredentialSet};
use crate::download::error::{DownloadError, ToolStep};
use crate::download::progress::{Artifact, DownloadStatus, ProgressSink};
use crate::download::session::{Session, SessionManager};
use crate::download::target::Target;
use crate::download::tools::{self, locate_media, ToolConfig, VideoMetadata};

/// What yt-dlp left in the workspace after a successful attempt
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub media: PathBuf,
    pub caption: Option<String>,
}

/// Result of one fetch/download cycle
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(Downloaded),
    /// The credential was rejected; carries yt-dlp's stderr
    RetryableAuthFailure(String),
    Fatal(DownloadError),
}

/// Internal failure type so `?` works inside an attempt
enum AttemptFailure {
    Auth(String),
    Fatal(DownloadError),
}

impl From<DownloadError> for AttemptFailure {
    fn from(err: DownloadError) -> Self {
        AttemptFailure::Fatal(err)
    }
}

fn into_outcome(result: Result<Downloaded, AttemptFailure>) -> AttemptOutcome {
    match result {
        Ok(downloaded) => AttemptOutcome::Success(downloaded),
        Err(AttemptFailure::Auth(stderr)) => AttemptOutcome::RetryableAuthFailure(stderr),
        Err(AttemptFailure::Fatal(err)) => AttemptOutcome::Fatal(err),
    }
}

/// Drives requests from chat text to delivered document.
///
/// Shared between all concurrent requests; holds no per-request state.
pub struct Orchestrator {
    runner: Arc<dyn CommandRunner>,
    sessions: SessionManager,
    credentials: Arc<CredentialSet>,
    tools: ToolConfig,
    classifier: ErrorClassifier,
}

impl Orchestrator {
    pub fn new(runner: Arc<dyn CommandRunner>, sessions: SessionManager, credentials: Arc<CredentialSet>) -> Self {
        Self {
            runner,
            sessions,
            credentials,
            tools: ToolConfig::default(),
            classifier: ErrorClassifier::default(),
        }
    }

    pub fn with_tools(mut self, tools: ToolConfig) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn tools(&self) -> &ToolConfig {
        &self.tools
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Handles one chat message end to end.
    ///
    /// `sink.finish` is called exactly once with the returned outcome, and the
    /// session workspace (if one was opened) is gone when this returns.
    pub async fn handle_request(
        &self,
        text: &str,
        chat_id: i64,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let target = match Target::parse(text) {
            Ok(target) => target,
            Err(e) => return self.conclude(None, chat_id, Err(e), sink).await,
        };

        let planned = AttemptPlan::new(&self.credentials, target.requires_auth(), &mut rand::rng());
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return self.conclude(None, chat_id, Err(e), sink).await,
        };

        let session = match self.sessions.open_session(chat_id).await {
            Ok(session) => session,
            Err(e) => return self.conclude(None, chat_id, Err(e.into()), sink).await,
        };

        log::info!(
            "[{}] Received {} URL: {} from chat {}",
            session.id(),
            target.platform(),
            target,
            session.chat_id()
        );
        let outcome = self.run(&session, &target, plan, sink).await;
        self.conclude(Some(session), chat_id, outcome, sink).await
    }

    /// Logs and counts the outcome, reports it, then tears the session down.
    async fn conclude(
        &self,
        session: Option<Session>,
        chat_id: i64,
        outcome: Result<(), DownloadError>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        match (&outcome, &session) {
            (Ok(()), Some(s)) => log::info!("[{}] Request completed", s.id()),
            (Ok(()), None) => {}
            (Err(e), Some(s)) => log::error!("[{}] Final error ({}): {}", s.id(), e.subcategory(), e),
            (Err(e), None) => log::warn!("Rejected request from chat {} ({}): {}", chat_id, e.subcategory(), e),
        }
        metrics::record_request(match &outcome {
            Ok(()) => "success",
            Err(e) => e.subcategory(),
        });

        sink.finish(&outcome).await;

        if let Some(session) = session {
            session.close().await;
        }
        outcome
    }

    async fn run(
        &self,
        session: &Session,
        target: &Target,
        mut plan: AttemptPlan<'_>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let total = plan.total();
        let mut last_error = String::new();

        while let Some(attempt) = plan.next_attempt() {
            match attempt.credential {
                Some(c) => log::info!(
                    "[{}] Attempt {}/{} with credential #{}",
                    session.id(),
                    attempt.number,
                    total,
                    c.index()
                ),
                None => log::info!("[{}] Attempt {}/{} without credential", session.id(), attempt.number, total),
            }

            match self.attempt(session, target, &attempt, sink).await {
                AttemptOutcome::Success(downloaded) => {
                    metrics::record_attempt("success");
                    return self.transcode_and_deliver(session, downloaded, attempt.number, sink).await;
                }
                AttemptOutcome::RetryableAuthFailure(stderr) => {
                    metrics::record_attempt("auth_retry");
                    log::warn!(
                        "[{}] Attempt {}/{} rejected, {} credential(s) left",
                        session.id(),
                        attempt.number,
                        total,
                        plan.remaining()
                    );
                    last_error = stderr;
                }
                AttemptOutcome::Fatal(err) => {
                    metrics::record_attempt("fatal");
                    return Err(err);
                }
            }
        }

        Err(DownloadError::AuthExhausted {
            attempts: total,
            last_error,
        })
    }

    /// One fetch/download cycle. The credential file never outlives the attempt.
    async fn attempt(
        &self,
        session: &Session,
        target: &Target,
        attempt: &Attempt<'_>,
        sink: &mut dyn ProgressSink,
    ) -> AttemptOutcome {
        let cookie = match attempt.credential {
            Some(credential) => match CredentialFile::write(session.workspace(), credential).await {
                Ok(file) => Some(file),
                Err(e) => return AttemptOutcome::Fatal(e.into()),
            },
            None => None,
        };

        let result = self
            .fetch_and_download(session, target, attempt, cookie.as_ref().map(CredentialFile::path), sink)
            .await;

        if let Some(file) = cookie {
            file.remove().await;
        }
        into_outcome(result)
    }

    async fn fetch_and_download(
        &self,
        session: &Session,
        target: &Target,
        attempt: &Attempt<'_>,
        cookie_file: Option<&Path>,
        sink: &mut dyn ProgressSink,
    ) -> Result<Downloaded, AttemptFailure> {
        sink.checkpoint(DownloadStatus::FetchingMetadata {
            attempt: attempt.number,
            total: attempt.total,
        })
        .await;
        let cmd = self.tools.metadata_command(target.url(), cookie_file);
        let output = self.run_tool(ToolStep::Metadata, &cmd).await?;
        if !output.success() {
            return Err(self.classify_failure(session, target, ToolStep::Metadata, attempt, output.stderr));
        }
        let metadata = VideoMetadata::parse(&output.stdout)?;
        log::info!(
            "[{}] Metadata: \"{}\" via {}",
            session.id(),
            metadata.title.as_deref().unwrap_or("untitled"),
            metadata.extractor.as_deref().unwrap_or("unknown extractor")
        );

        sink.checkpoint(DownloadStatus::Downloading {
            attempt: attempt.number,
            total: attempt.total,
        })
        .await;
        let cmd = self.tools.download_command(target.url(), session.workspace(), cookie_file);
        let output = self.run_tool(ToolStep::Download, &cmd).await?;
        if !output.success() {
            return Err(self.classify_failure(session, target, ToolStep::Download, attempt, output.stderr));
        }

        let media = locate_media(session.workspace())
            .await?
            .ok_or_else(|| DownloadError::ArtifactNotFound {
                step: ToolStep::Download,
                message: "downloaded media file not found after yt-dlp".to_string(),
            })?;
        log::debug!("[{}] Downloaded {}", session.id(), media.display());

        Ok(Downloaded {
            media,
            caption: metadata.caption(),
        })
    }

    async fn transcode_and_deliver(
        &self,
        session: &Session,
        downloaded: Downloaded,
        attempt_number: usize,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        sink.checkpoint(DownloadStatus::Transcoding {
            attempt: attempt_number,
        })
        .await;

        let file_name = tools::output_file_name(session.id());
        let output_path = session.workspace().join(&file_name);
        let cmd = self.tools.transcode_command(&downloaded.media, &output_path);
        let output = self.run_tool(ToolStep::Transcode, &cmd).await?;
        if !output.success() {
            return Err(DownloadError::TranscodeFailed(output.stderr));
        }
        if !tokio::fs::try_exists(&output_path).await.map_err(AppError::from)? {
            return Err(DownloadError::ArtifactNotFound {
                step: ToolStep::Transcode,
                message: "FFmpeg output file not found".to_string(),
            });
        }
        log::info!("[{}] Video processed successfully: {}", session.id(), output_path.display());

        sink.checkpoint(DownloadStatus::Uploading).await;
        let artifact = Artifact {
            path: output_path,
            caption: downloaded.caption,
            file_name,
        };
        sink.deliver(&artifact).await
    }

    /// Runs one external command and records its duration.
    ///
    /// A timeout counts as a failure of that tool step; a launch failure is
    /// infrastructure.
    async fn run_tool(&self, step: ToolStep, cmd: &ToolCommand) -> Result<CommandOutput, DownloadError> {
        log::debug!("Running: {}", cmd);
        let started = Instant::now();
        let result = self.runner.run(cmd).await;
        let operation: &'static str = step.into();
        metrics::observe_tool(operation, started.elapsed().as_secs_f64());

        match result {
            Ok(output) => Ok(output),
            Err(e @ AppError::Timeout { .. }) => Err(match step {
                ToolStep::Transcode => DownloadError::TranscodeFailed(e.to_string()),
                _ => DownloadError::ToolFailure {
                    step,
                    message: e.to_string(),
                },
            }),
            Err(e) => Err(DownloadError::Infrastructure(e)),
        }
    }

    fn classify_failure(
        &self,
        session: &Session,
        target: &Target,
        step: ToolStep,
        attempt: &Attempt<'_>,
        stderr: String,
    ) -> AttemptFailure {
        log::warn!(
            "[{}] yt-dlp {} failed (Attempt {}/{}): {}",
            session.id(),
            step,
            attempt.number,
            attempt.total,
            stderr
        );

        match self.classifier.classify(&stderr, target.requires_auth()) {
            StderrClass::NetworkBlock => AttemptFailure::Fatal(DownloadError::NetworkBlock(stderr)),
            StderrClass::AuthRequired => AttemptFailure::Auth(stderr),
            StderrClass::Other => AttemptFailure::Fatal(DownloadError::ToolFailure { step, message: stderr }),
        }
    }
}
