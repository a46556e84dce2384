//! Error types for ManualPress.
//!
//! Library crates use [`ManualPressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ManualPress operations.
#[derive(Debug, thiserror::Error)]
pub enum ManualPressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Browser/driver failure (launch, CDP evaluate, navigation).
    #[error("automation error: {0}")]
    Automation(String),

    /// The content frame never reached a loaded state after a click.
    #[error("content timeout: frame {selector} never settled for entry {index} ({title})")]
    ContentTimeout {
        selector: String,
        index: usize,
        title: String,
    },

    /// The expected embedded sub-document structure is missing.
    #[error("frame not found: {selector}")]
    FrameNotFound { selector: String },

    /// A single image payload was malformed or could not be re-encoded.
    #[error("image decode failed for carrier {index}: {message}")]
    ImageDecode { index: usize, message: String },

    /// Filesystem I/O error (includes image storage write failures).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document renderer failed; the assembled document is unusable.
    #[error("render error: {0}")]
    Render(String),

    /// Data validation error (empty navigation tree, bad selector, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ManualPressError>;

impl ManualPressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an automation error from any displayable message.
    pub fn automation(msg: impl Into<String>) -> Self {
        Self::Automation(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this failure is local to a single navigation entry.
    ///
    /// Entry-local failures (timeout, missing frame, bad image) are logged and
    /// the run continues with the next entry. Everything else is run-fatal.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            Self::ContentTimeout { .. } | Self::FrameNotFound { .. } | Self::ImageDecode { .. }
        )
    }
}
