use std::time::Duration;
use thiserror::Error;

/// Infrastructure errors for the application
///
/// Covers failures that are not a tool *reporting* a problem: the process could
/// not be launched, it hung past its timeout, the filesystem refused a write.
/// Tool-reported failures are classified into [`crate::DownloadError`] instead.
///
/// # Example
///
/// ```no_run
/// use spidycore::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors (including failure to spawn a process)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// External command exceeded its time budget
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = AppError::Timeout {
            program: "yt-dlp".to_string(),
            timeout: Duration::from_secs(240),
        };
        assert_eq!(err.to_string(), "yt-dlp timed out after 240s");
    }

    #[test]
    fn test_io_from() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
