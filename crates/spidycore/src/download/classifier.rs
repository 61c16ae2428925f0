//! yt-dlp stderr classification
//!
//! Decides whether a failed fetch or download rotates to the next credential,
//! aborts the request, or is reported as a plain tool failure. The matched
//! wording is not a stable yt-dlp contract, so patterns are configurable
//! through the environment.

use crate::core::config;

/// Class of a failed yt-dlp invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrClass {
    /// The platform's hostname does not resolve: the server is blocked
    NetworkBlock,
    /// The credential was rejected; another one may work
    AuthRequired,
    /// Anything else
    Other,
}

/// Case-insensitive substring classifier
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    network_block_patterns: Vec<String>,
    auth_patterns: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(
            config::classifier::DEFAULT_NETWORK_BLOCK_PATTERNS.iter().map(|s| s.to_string()),
            config::classifier::DEFAULT_AUTH_PATTERNS.iter().map(|s| s.to_string()),
        )
    }
}

impl ErrorClassifier {
    pub fn new<N, A>(network_block_patterns: N, auth_patterns: A) -> Self
    where
        N: IntoIterator<Item = String>,
        A: IntoIterator<Item = String>,
    {
        Self {
            network_block_patterns: network_block_patterns.into_iter().map(|p| p.to_lowercase()).collect(),
            auth_patterns: auth_patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Defaults, with `NETWORK_BLOCK_PATTERNS` / `AUTH_ERROR_PATTERNS` overrides
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            network_block_patterns: config::classifier::NETWORK_BLOCK_PATTERNS
                .clone()
                .unwrap_or(defaults.network_block_patterns),
            auth_patterns: config::classifier::AUTH_PATTERNS
                .clone()
                .unwrap_or(defaults.auth_patterns),
        }
    }

    /// Classifies stderr of a failed yt-dlp run.
    ///
    /// Only targets on the authenticated platform are classified; for
    /// everything else a failure is always [`StderrClass::Other`].
    pub fn classify(&self, stderr: &str, authenticated: bool) -> StderrClass {
        if !authenticated {
            return StderrClass::Other;
        }

        let stderr_lower = stderr.to_lowercase();

        // Network block wins: no credential can fix DNS
        if self.network_block_patterns.iter().any(|p| stderr_lower.contains(p)) {
            return StderrClass::NetworkBlock;
        }

        if self.auth_patterns.iter().any(|p| stderr_lower.contains(p)) {
            return StderrClass::AuthRequired;
        }

        StderrClass::Other
    }
}
