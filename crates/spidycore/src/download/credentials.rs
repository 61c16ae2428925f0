//! Authentication credentials and per-request rotation
//!
//! Credentials are Netscape cookie-file contents loaded once at startup from
//! numbered environment variables (`INSTAGRAM_COOKIES1`, `INSTAGRAM_COOKIES2`,
//! ...). They are read-only for the life of the process. Each request that
//! needs authentication tries them in a fresh uniformly random order, each at
//! most once.

use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::config;
use crate::core::error::AppError;
use crate::download::error::DownloadError;
use crate::download::session::restrict_to_owner;

/// One opaque authentication token. Never printed.
#[derive(Clone)]
pub struct Credential {
    /// Position in the configured list (1-based, matches the env var suffix)
    index: usize,
    secret: SecretString,
}

impl Credential {
    pub fn new(index: usize, secret: impl Into<String>) -> Self {
        Self {
            index,
            secret: SecretString::from(secret.into()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(#{})", self.index)
    }
}

/// All configured credentials, in configuration order
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    credentials: Vec<Credential>,
}

impl CredentialSet {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Loads `<PREFIX>1`, `<PREFIX>2`, ... from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(config::credentials::ENV_PREFIX.as_str(), |key| std::env::var(key).ok())
    }

    /// Reads numbered keys through `lookup` until the first missing or blank one.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = (1..)
            .map(|i| (i, lookup(&format!("{prefix}{i}"))))
            .take_while(|(_, value)| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
            .filter_map(|(i, value)| value.map(|v| Credential::new(i, v)))
            .collect();
        Self { credentials }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }
}

/// One planned attempt: which credential (if any) it uses
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    /// 1-based attempt number
    pub number: usize,
    pub total: usize,
    pub credential: Option<&'a Credential>,
}

/// Ordered credential slots for a single request plus a cursor
#[derive(Debug)]
pub struct AttemptPlan<'a> {
    slots: Vec<Option<&'a Credential>>,
    cursor: usize,
}

impl<'a> AttemptPlan<'a> {
    /// Builds the plan for one request.
    ///
    /// - no authentication needed: a single attempt without credential
    /// - authentication needed, nothing configured: `DownloadError::Configuration`
    /// - otherwise: every credential once, uniformly shuffled
    pub fn new<R: Rng + ?Sized>(
        set: &'a CredentialSet,
        requires_auth: bool,
        rng: &mut R,
    ) -> Result<Self, DownloadError> {
        let slots = if !requires_auth {
            vec![None]
        } else if set.is_empty() {
            return Err(DownloadError::Configuration);
        } else {
            let mut order: Vec<&Credential> = set.iter().collect();
            order.shuffle(rng);
            order.into_iter().map(Some).collect()
        };

        Ok(Self { slots, cursor: 0 })
    }

    /// Attempt budget, always at least one
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn remaining(&self) -> usize {
        self.slots.len() - self.cursor
    }

    /// Consumes the next slot; `None` once the budget is used up.
    pub fn next_attempt(&mut self) -> Option<Attempt<'a>> {
        let credential = *self.slots.get(self.cursor)?;
        self.cursor += 1;
        Some(Attempt {
            number: self.cursor,
            total: self.slots.len(),
            credential,
        })
    }
}

/// A credential written to a private file inside the session workspace
#[derive(Debug)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    /// Writes the credential to `<workspace>/cookie.txt` readable by the owner only.
    pub async fn write(workspace: &Path, credential: &Credential) -> Result<Self, AppError> {
        let path = workspace.join(config::credentials::FILE_NAME);
        fs_err::tokio::write(&path, credential.expose().as_bytes()).await?;
        restrict_to_owner(&path, 0o600).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(self) {
        if let Err(e) = fs_err::tokio::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove credential file {}: {}", self.path.display(), e);
            }
        }
    }
}
