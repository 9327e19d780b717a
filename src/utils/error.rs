//! Error types for the image minifier.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::worker::WorkerError;

/// Main error type for the minifier.
///
/// Encode-side variants (`UnrecognizedFormat`, `Encode`) never escape the encode
/// worker; they are folded into an error-variant `EncodeResult` there. The
/// orchestrator raises `Fatal` when such a result meets `silentErrors = false`.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// Neither content nor extension yields a known format
    #[error("invalid image format: {0}")]
    UnrecognizedFormat(String),

    /// The codec rejected the input or options
    #[error("Encode error: {0}")]
    Encode(String),

    /// Source unreadable or destination unwritable
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool could not run the job
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// An encode error escalated by the `silentErrors = false` policy
    #[error("[image-lint-staged] - {identifier}: {message}")]
    Fatal { identifier: String, message: String },
}

/// Convenience result type for minifier operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

// Helper methods for error creation
impl OptimizerError {
    pub fn unrecognized<T: Into<String>>(msg: T) -> Self {
        Self::UnrecognizedFormat(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn fatal(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

// Codec errors surface as encode failures
impl From<image::ImageError> for OptimizerError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err.to_string())
    }
}
