//! Download pipeline: targets, credentials, sessions, external tools and
//! the orchestrator driving them

pub mod classifier;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod target;
pub mod tools;

pub use credentials::{Credential, CredentialSet};
pub use error::DownloadError;
pub use orchestrator::Orchestrator;
pub use progress::{user_message, Artifact, DownloadStatus, ProgressSink};
pub use session::{Session, SessionId, SessionManager};
pub use target::Target;
pub use tools::ToolConfig;
