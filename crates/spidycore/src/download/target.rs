//! Request target parsing
//!
//! Pulls the first URL out of a chat message and decides which platform it
//! belongs to. Instagram links must point at a concrete reel, post or tv
//! item; any other URL is handed to yt-dlp unchecked.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use strum::Display;
use url::Url;

use crate::download::error::{DownloadError, InvalidInput};

/// Cached regex for matching URLs in free text
static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("Failed to compile URL regex"));

/// Strict Instagram content path: /reel/<code>, /p/<code> or /tv/<code>
static INSTAGRAM_CONTENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/(?:reel|p|tv)/[A-Za-z0-9_-]+/?")
        .expect("Failed to compile Instagram regex")
});

/// Where the URL points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    /// Needs a credential; failures are classified and may rotate credentials
    Instagram,
    /// Anything yt-dlp may understand, fetched anonymously
    Generic,
}

/// A validated download target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: String,
    platform: Platform,
}

impl Target {
    /// Parses the first URL in `text`.
    ///
    /// # Errors
    /// - `InvalidInput::NoUrl` when the text contains no `http(s)://` URL
    /// - `InvalidInput::BadFormat` for an Instagram URL that is not a reel/post/tv link
    pub fn parse(text: &str) -> Result<Self, DownloadError> {
        let url = extract_first_url(text).ok_or(DownloadError::InvalidInput(InvalidInput::NoUrl))?;

        if !is_instagram_host(url) {
            return Ok(Self {
                url: url.to_string(),
                platform: Platform::Generic,
            });
        }

        if !INSTAGRAM_CONTENT_REGEX.is_match(url) {
            return Err(DownloadError::InvalidInput(InvalidInput::BadFormat));
        }

        Ok(Self {
            url: url.to_string(),
            platform: Platform::Instagram,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether fetching this target needs a credential
    pub fn requires_auth(&self) -> bool {
        self.platform == Platform::Instagram
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// First `http(s)://` run of non-whitespace in `text`
pub fn extract_first_url(text: &str) -> Option<&str> {
    URL_REGEX.find(text).map(|m| m.as_str())
}

fn is_instagram_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "instagram.com" || host.ends_with(".instagram.com"))
}
