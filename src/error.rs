//! Crate-wide error types.
//!
//! Subsystems use their own `thiserror` types ([`FinderError`],
//! [`LastFmError`], [`ConfigError`]); [`Error`] is what the plugin surface
//! returns, and the CLI wraps everything in `anyhow`.
//!
//! [`FinderError`]: crate::cover::FinderError
//! [`LastFmError`]: crate::lastfm::LastFmError
//! [`ConfigError`]: crate::config::ConfigError

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading/saving error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Remote metadata service error
    #[error("Last.fm error: {0}")]
    LastFm(#[from] crate::lastfm::LastFmError),

    /// Unknown cover rule name
    #[error("Unknown cover rule: {0}")]
    UnknownRule(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_errors_convert() {
        let err: Error = crate::lastfm::LastFmError::MissingApiKey.into();
        assert!(matches!(err, Error::LastFm(_)));

        let err: Error = crate::config::ConfigError::NoConfigDir.into();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::UnknownRule("Spotify".to_string()).context("while parsing rules");
        let msg = err.to_string();
        assert!(msg.contains("while parsing rules"));
        assert!(msg.contains("Spotify"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.with_context("reading cover").unwrap_err();
        assert!(matches!(err, Error::WithContext { .. }));
        assert!(err.to_string().contains("reading cover"));
    }
}
