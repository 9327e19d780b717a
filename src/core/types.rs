//! Core types for minification inputs and outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::utils::Savings;

/// Something to minify: an in-memory image or a file to rewrite in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Buffer(Vec<u8>),
    Path(PathBuf),
}

impl ImageInput {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Buffer(_) => None,
        }
    }

    /// Name used in reports and errors: the path, or `buffer`.
    pub fn identifier(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Buffer(_) => "buffer".to_string(),
        }
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageInput {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl fmt::Display for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// Outcome of one encode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeResult {
    /// Re-encoded payload
    Success { bytes: Vec<u8> },
    /// Input already carries the minified marker
    Skip,
    /// Encoding failed
    Error { message: String },
}

impl EncodeResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// What the minifier decided for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MinifyOutcome {
    /// Accepted. Paths were rewritten; buffer inputs get the bytes back here.
    Minified {
        savings: Savings,
        #[serde(skip)]
        buffer: Option<Vec<u8>>,
    },
    /// Marker found; nothing done
    AlreadyOptimized { size: u64 },
    /// Output was larger than the input; discarded
    Larger { savings: Savings },
    /// Reduction smaller than `skipDelta`; discarded
    BelowThreshold { savings: Savings },
    /// Encode error under `silentErrors`
    Failed { message: String },
}

impl MinifyOutcome {
    pub fn savings(&self) -> Option<&Savings> {
        match self {
            Self::Minified { savings, .. }
            | Self::Larger { savings }
            | Self::BelowThreshold { savings } => Some(savings),
            Self::AlreadyOptimized { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn into_savings(self) -> Option<Savings> {
        match self {
            Self::Minified { savings, .. }
            | Self::Larger { savings }
            | Self::BelowThreshold { savings } => Some(savings),
            Self::AlreadyOptimized { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Minified { .. })
    }
}
