//! Scripted stand-in for yt-dlp and ffmpeg
//!
//! Each tool step has a queue of replies. When a queue runs dry the step
//! succeeds. Successful downloads and transcodes create the files the real
//! tools would have written, so artifact lookup works as in production.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use spidycore::core::process::{CommandOutput, CommandRunner, ToolCommand};
use spidycore::AppError;

/// Which tool step a command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Metadata,
    Download,
    Transcode,
}

/// Scripted result of one invocation
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit 0 with default output (and files, for download/transcode)
    Ok,
    /// Exit 0 with this stdout
    Stdout(String),
    /// Exit 0 but no file is written
    OkWithoutFile,
    /// Exit 1 with this stderr
    Fail(String),
    /// The command ran past its timeout
    Timeout,
    /// The binary could not be launched
    LaunchError,
    /// Signals the notifier once started, then never finishes
    Hang(Arc<Notify>),
}

impl Reply {
    pub fn fail(stderr: &str) -> Self {
        Reply::Fail(stderr.to_string())
    }
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub step: Step,
    pub command: ToolCommand,
    /// Contents of the `--cookies` file at the time of the call
    pub cookie: Option<String>,
    /// Workspace the command operates in, when it can be derived
    pub workspace: Option<PathBuf>,
    /// File names present in that workspace at the time of the call
    pub workspace_files: Vec<String>,
}

pub const DEFAULT_METADATA: &str =
    r#"{"id":"ABC123","title":"A reel","description":"Sunset over the bay 🌅","extractor":"Instagram"}"#;

#[derive(Default)]
pub struct ScriptedRunner {
    metadata: Mutex<VecDeque<Reply>>,
    download: Mutex<VecDeque<Reply>>,
    transcode: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, step: Step, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.queue(step).lock().unwrap().extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.step == step).count()
    }

    /// Cookie contents used by each metadata fetch, in order
    pub fn metadata_cookies(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.step == Step::Metadata)
            .map(|c| c.cookie.clone())
            .collect()
    }

    fn queue(&self, step: Step) -> &Mutex<VecDeque<Reply>> {
        match step {
            Step::Metadata => &self.metadata,
            Step::Download => &self.download,
            Step::Transcode => &self.transcode,
        }
    }

    fn step_of(cmd: &ToolCommand) -> Step {
        if cmd.program().contains("ffmpeg") {
            Step::Transcode
        } else if cmd.has_arg("--dump-json") {
            Step::Metadata
        } else {
            Step::Download
        }
    }

    fn workspace_of(step: Step, cmd: &ToolCommand) -> Option<PathBuf> {
        let from_flag = |flag: &str| cmd.value_of(flag).and_then(|v| Path::new(&v).parent().map(Path::to_path_buf));
        match step {
            Step::Metadata => from_flag("--cookies"),
            Step::Download => from_flag("-o"),
            Step::Transcode => from_flag("-i"),
        }
    }

    fn write_default_file(step: Step, cmd: &ToolCommand) {
        match step {
            Step::Metadata => {}
            Step::Download => {
                if let Some(template) = cmd.value_of("-o") {
                    std::fs::write(template.replace("%(ext)s", "mp4"), b"raw media").unwrap();
                }
            }
            Step::Transcode => {
                if let Some(output) = cmd.get_args().last() {
                    std::fs::write(output, b"encoded media").unwrap();
                }
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput, AppError> {
        let step = Self::step_of(cmd);
        let workspace = Self::workspace_of(step, cmd);
        let workspace_files = workspace
            .as_ref()
            .and_then(|ws| std::fs::read_dir(ws).ok())
            .map(|entries| {
                let mut names: Vec<String> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            })
            .unwrap_or_default();
        let cookie = cmd
            .value_of("--cookies")
            .map(|path| std::fs::read_to_string(path).unwrap());

        self.calls.lock().unwrap().push(Call {
            step,
            command: cmd.clone(),
            cookie,
            workspace,
            workspace_files,
        });

        let reply = self.queue(step).lock().unwrap().pop_front().unwrap_or(Reply::Ok);
        match reply {
            Reply::Ok => {
                Self::write_default_file(step, cmd);
                let stdout = if step == Step::Metadata {
                    DEFAULT_METADATA.to_string()
                } else {
                    String::new()
                };
                Ok(CommandOutput {
                    status: 0,
                    stdout,
                    stderr: String::new(),
                })
            }
            Reply::Stdout(stdout) => Ok(CommandOutput {
                status: 0,
                stdout,
                stderr: String::new(),
            }),
            Reply::OkWithoutFile => Ok(CommandOutput::default()),
            Reply::Fail(stderr) => Ok(CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr,
            }),
            Reply::Timeout => Err(AppError::Timeout {
                program: cmd.program().to_string(),
                timeout: cmd.get_timeout().unwrap_or(Duration::from_secs(1)),
            }),
            Reply::LaunchError => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: not found", cmd.program()),
            ))),
            Reply::Hang(started) => {
                started.notify_one();
                std::future::pending().await
            }
        }
    }
}
